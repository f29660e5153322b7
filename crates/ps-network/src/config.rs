//! Power-flow solve settings.

use ps_solver::NewtonConfig;

#[derive(Clone, Debug, Default)]
pub struct PowerFlowConfig {
    pub newton: NewtonConfig,
    /// Assemble Jacobian rows on the rayon pool.
    pub parallel_jacobian: bool,
}
