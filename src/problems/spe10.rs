//! The SPE10 channel problem: a high-conductivity channel whose contrast is switched
//! off by the parameter, driven by one injection and two production wells.

use super::AffineDiffusionProblem;
use crate::{
  error::Result,
  function::{Box2, DiffusionTensor, Expression, IndicatorFunction},
  parameter::{Parameter, ParameterFunctional, ParameterSpace},
};

pub const PARAMETER: &str = "switch";
pub const PARAMETER_RANGE: (f64, f64) = (0.1, 1.0);

pub const LOWER_LEFT: [f64; 2] = [0.0, 0.0];
pub const UPPER_RIGHT: [f64; 2] = [5.0, 1.0];
pub const NUM_ELEMENTS: [usize; 2] = [100, 20];

/// `(xrange, yrange, value)` of the channel cells.
#[rustfmt::skip]
const CHANNEL: [([f64; 2], [f64; 2], f64); 105] = [
  ([1.70, 1.75], [0.50, 0.55], -1.077632394950),
  ([1.75, 1.80], [0.50, 0.55], -1.076995127720),
  ([1.80, 1.85], [0.50, 0.55], -1.073561564390),
  ([1.85, 1.90], [0.50, 0.55], -1.066022817360),
  ([1.90, 1.95], [0.50, 0.55], -1.065036837430),
  ([1.95, 2.00], [0.50, 0.55], -1.079748704260),
  ([2.00, 2.05], [0.50, 0.55], -1.056658959230),
  ([2.05, 2.10], [0.50, 0.55], -1.083103348370),
  ([2.10, 2.15], [0.50, 0.55], -1.058654849730),
  ([2.15, 2.20], [0.50, 0.55], -1.058710395350),
  ([2.20, 2.25], [0.50, 0.55], -1.081366959010),
  ([2.25, 2.30], [0.50, 0.55], -1.084901727210),
  ([2.30, 2.35], [0.50, 0.55], -1.066411207580),
  ([2.35, 2.40], [0.50, 0.55], -1.068127732980),
  ([2.40, 2.45], [0.50, 0.55], -1.076956520490),
  ([2.45, 2.50], [0.50, 0.55], -1.086300792050),
  ([2.50, 2.55], [0.50, 0.55], -1.082737221120),
  ([2.55, 2.60], [0.50, 0.55], -1.075004021550),
  ([2.60, 2.65], [0.50, 0.55], -1.086071425620),
  ([2.65, 2.70], [0.50, 0.55], -1.072687617990),
  ([2.70, 2.75], [0.50, 0.55], -1.085370373620),
  ([2.75, 2.80], [0.50, 0.55], -1.084669272730),
  ([2.80, 2.85], [0.50, 0.55], -1.084446618150),
  ([2.85, 2.90], [0.50, 0.55], -1.089570379670),
  ([2.90, 2.95], [0.50, 0.55], -1.080473940520),
  ([2.95, 3.00], [0.50, 0.55], -1.082212290830),
  ([3.00, 3.05], [0.50, 0.55], -1.085685998630),
  ([3.05, 3.10], [0.50, 0.55], -1.084283478720),
  ([3.10, 3.15], [0.50, 0.55], -1.091040987340),
  ([3.15, 3.20], [0.50, 0.55], -1.094927006730),
  ([3.20, 3.25], [0.50, 0.55], -1.097604405370),
  ([3.25, 3.30], [0.50, 0.55], -1.096449894530),
  ([3.30, 3.35], [0.50, 0.55], -1.094416810250),
  ([3.35, 3.40], [0.50, 0.55], -1.095332906540),
  ([3.40, 3.45], [0.50, 0.55], -1.100143080800),
  ([3.45, 3.50], [0.50, 0.55], -1.100656276210),
  ([3.50, 3.55], [0.50, 0.55], -1.101258771860),
  ([3.55, 3.60], [0.50, 0.55], -1.100574858930),
  ([3.60, 3.65], [0.50, 0.55], -1.100022619060),
  ([3.65, 3.70], [0.50, 0.55], -1.102191542090),
  ([3.70, 3.75], [0.50, 0.55], -1.099944638010),
  ([3.75, 3.80], [0.50, 0.55], -1.102656305330),
  ([3.80, 3.85], [0.50, 0.55], -1.104485665260),
  ([3.85, 3.90], [0.50, 0.55], -1.107358201210),
  ([3.90, 3.95], [0.50, 0.55], -1.107002236700),
  ([3.95, 4.00], [0.50, 0.55], -1.107776503870),
  ([4.00, 4.05], [0.50, 0.55], -1.108927855620),
  ([2.60, 2.65], [0.45, 0.50], -1.103725892110),
  ([2.65, 2.70], [0.45, 0.50], -1.102088998800),
  ([2.70, 2.75], [0.45, 0.50], -1.098069550690),
  ([2.75, 2.80], [0.45, 0.50], -1.100009024210),
  ([2.80, 2.85], [0.45, 0.50], -1.087974687240),
  ([2.85, 2.90], [0.45, 0.50], -1.088274721760),
  ([2.90, 2.95], [0.45, 0.50], -1.086922371090),
  ([2.95, 3.00], [0.45, 0.50], -1.078931900930),
  ([3.00, 3.05], [0.45, 0.50], -1.087483738530),
  ([3.05, 3.10], [0.45, 0.50], -1.074451973240),
  ([3.10, 3.15], [0.45, 0.50], -1.082466131630),
  ([3.15, 3.20], [0.45, 0.50], -1.067267905040),
  ([3.20, 3.25], [0.45, 0.50], -1.078912178470),
  ([3.25, 3.30], [0.45, 0.50], -1.072608271260),
  ([3.30, 3.35], [0.45, 0.50], -1.070940627480),
  ([3.35, 3.40], [0.45, 0.50], -1.069239942900),
  ([3.40, 3.45], [0.45, 0.50], -1.000998857010),
  ([3.45, 3.50], [0.45, 0.50], -1.001095440020),
  ([3.50, 3.55], [0.45, 0.50], -0.966491003242),
  ([3.55, 3.60], [0.45, 0.50], -0.802284684014),
  ([3.60, 3.65], [0.45, 0.50], -0.980790923021),
  ([3.65, 3.70], [0.45, 0.50], -0.614478271687),
  ([3.70, 3.75], [0.45, 0.50], -0.288129858959),
  ([3.75, 3.80], [0.45, 0.50], -0.929509396842),
  ([3.80, 3.85], [0.45, 0.50], -0.992376505995),
  ([3.85, 3.90], [0.45, 0.50], -0.968162494855),
  ([3.90, 3.95], [0.45, 0.50], -0.397316938901),
  ([3.95, 4.00], [0.45, 0.50], -0.970934956609),
  ([4.00, 4.05], [0.45, 0.50], -0.784344730096),
  ([4.05, 4.10], [0.45, 0.50], -0.539725422323),
  ([4.10, 4.15], [0.45, 0.50], -0.915632282372),
  ([4.15, 4.20], [0.45, 0.50], -0.275089177273),
  ([4.20, 4.25], [0.45, 0.50], -0.949684959286),
  ([4.25, 4.30], [0.45, 0.50], -0.936132529794),
  ([1.95, 2.00], [0.40, 0.45], -1.109236427950),
  ([2.00, 2.05], [0.40, 0.45], -1.106856186230),
  ([2.05, 2.10], [0.40, 0.45], -1.105780037600),
  ([2.10, 2.15], [0.40, 0.45], -1.101877236290),
  ([2.15, 2.20], [0.40, 0.45], -1.103517104640),
  ([2.20, 2.25], [0.40, 0.45], -1.100375511370),
  ([2.25, 2.30], [0.40, 0.45], -1.097244070760),
  ([2.30, 2.35], [0.40, 0.45], -1.096046002080),
  ([2.35, 2.40], [0.40, 0.45], -1.093544696560),
  ([2.40, 2.45], [0.40, 0.45], -1.089344553540),
  ([2.45, 2.50], [0.40, 0.45], -1.081554765860),
  ([2.50, 2.55], [0.40, 0.45], -1.078153978990),
  ([2.55, 2.60], [0.40, 0.45], -1.091740620230),
  ([2.60, 2.65], [0.40, 0.45], -1.074336160680),
  ([2.65, 2.70], [0.40, 0.45], -1.080305877010),
  ([2.25, 2.30], [0.35, 0.40], -1.000328694070),
  ([2.30, 2.35], [0.35, 0.40], -1.011759089050),
  ([2.35, 2.40], [0.35, 0.40], -1.049543957930),
  ([2.40, 2.45], [0.35, 0.40], -1.017967697000),
  ([2.45, 2.50], [0.35, 0.40], -1.046471840910),
  ([2.50, 2.55], [0.35, 0.40], -1.019118948310),
  ([2.55, 2.60], [0.35, 0.40], -1.006993401580),
  ([2.60, 2.65], [0.35, 0.40], -0.995492960025),
  ([2.65, 2.70], [0.35, 0.40], -1.037305900700),
];

pub fn channel() -> IndicatorFunction {
  let boxes = CHANNEL
    .iter()
    .map(|&(xrange, yrange, value)| (Box2::new(xrange, yrange), value))
    .collect();
  IndicatorFunction::new(boxes, "channel")
}

pub fn force() -> IndicatorFunction {
  IndicatorFunction::new(
    vec![
      (Box2::new([0.95, 1.10], [0.30, 0.45]), 2e3),
      (Box2::new([3.00, 3.15], [0.75, 0.90]), -1e3),
      (Box2::new([4.25, 4.40], [0.25, 0.40]), -1e3),
    ],
    "force",
  )
}

/// $kappa_mu = 1 + (1 - mu) chi = (1 + chi) + mu (-chi)$
pub fn diffusion_factor() -> (Vec<Expression>, Vec<ParameterFunctional>) {
  let chi = Expression::from(channel());
  let functions = vec![
    Expression::constant(1.0) + chi.clone(),
    Expression::constant(-1.0) * chi,
  ];
  let coefficients = vec![
    ParameterFunctional::Constant(1.0),
    ParameterFunctional::projection(PARAMETER),
  ];
  (functions, coefficients)
}

pub fn make_diffusion_factor(mu: &Parameter) -> Result<Expression> {
  let switch = mu.get(PARAMETER)?;
  Ok(Expression::constant(1.0) + Expression::constant(1.0 - switch) * Expression::from(channel()))
}

pub fn parameter(switch: f64) -> Parameter {
  Parameter::scalar(PARAMETER, switch)
}

pub fn problem(tensor: DiffusionTensor) -> Result<AffineDiffusionProblem> {
  let (factor_functions, factor_coefficients) = diffusion_factor();
  Ok(AffineDiffusionProblem {
    lower_left: LOWER_LEFT,
    upper_right: UPPER_RIGHT,
    num_elements: NUM_ELEMENTS,
    factor_functions,
    factor_coefficients,
    tensor,
    force: force().into(),
    parameter_space: ParameterSpace::cubic([PARAMETER], PARAMETER_RANGE.0, PARAMETER_RANGE.1)?,
  })
}

#[cfg(test)]
mod test {
  use super::{channel, make_diffusion_factor, parameter, problem, PARAMETER_RANGE};
  use crate::{
    function::{DiffusionTensor, Function},
    geometry::Point,
  };
  use approx::assert_relative_eq;

  #[test]
  fn affine_decomposition_matches_direct_factor() {
    let problem = problem(DiffusionTensor::default()).unwrap();
    let points = [
      Point::new(1.725, 0.525),
      Point::new(3.725, 0.475),
      Point::new(2.675, 0.375),
      Point::new(0.5, 0.5),
    ];
    for switch in [0.1, 0.55, 1.0] {
      let mu = parameter(switch);
      let affine = problem.diffusion_factor(&mu).unwrap();
      let direct = make_diffusion_factor(&mu).unwrap();
      for x in &points {
        assert_relative_eq!(affine.evaluate(x), direct.evaluate(x), epsilon = 1e-14);
      }
    }
  }

  #[test]
  fn diffusion_factor_is_positive_on_parameter_space() {
    let chi = channel();
    let mu = parameter(PARAMETER_RANGE.0);
    let factor = make_diffusion_factor(&mu).unwrap();
    for (b, _) in chi.boxes() {
      let center = Point::new(0.5 * (b.min[0] + b.max[0]), 0.5 * (b.min[1] + b.max[1]));
      assert!(factor.evaluate(&center) > 0.0);
    }
    // switched off channel
    let factor = make_diffusion_factor(&parameter(1.0)).unwrap();
    assert_relative_eq!(factor.evaluate(&Point::new(2.0, 0.525)), 1.0);
  }

  #[test]
  fn affine_constants() {
    let problem = problem(DiffusionTensor::default()).unwrap();
    let mu_bar = parameter(0.1);
    assert_relative_eq!(problem.alpha(&parameter(0.5), &mu_bar).unwrap(), 1.0);
    assert_relative_eq!(problem.gamma(&parameter(0.5), &mu_bar).unwrap(), 5.0, epsilon = 1e-14);
  }
}
