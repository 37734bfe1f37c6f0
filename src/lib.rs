extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod ci;
pub mod config;
pub mod error;
pub mod estimate;
pub mod experiment;
pub mod fe;
pub mod flux;
pub mod function;
pub mod geometry;
pub mod greedy;
pub mod linalg;
pub mod lse;
pub mod mesh;
pub mod model;
pub mod operator;
pub mod parameter;
pub mod problems;
pub mod quadrature;
pub mod reductor;
pub mod space;
pub mod sparse;

pub use error::{Error, Result};
