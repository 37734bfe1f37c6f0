use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("parameter component `{0}` is missing")]
  MissingParameter(String),

  #[error("parameter {0} lies outside of the parameter space")]
  ParameterOutOfRange(String),

  #[error("dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  #[error("point ({x}, {y}) lies outside of the grid")]
  PointOutsideGrid { x: f64, y: f64 },

  #[error("grids are not nested: {0}")]
  NotNested(String),

  #[error("factorization failed: {0}")]
  Factorization(String),

  #[error("basis extension failed: {0}")]
  Extension(String),

  #[error("malformed data file: {0}")]
  Parse(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
