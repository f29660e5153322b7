//! TransientModel trait for systems advanced by an [`Integrator`].
//!
//! [`Integrator`]: crate::integrator::Integrator

use crate::error::SimResult;

/// A system of first-order ODEs `x' = f(t, x)`.
///
/// The integrators only need the right-hand side plus vector-space
/// arithmetic on the state, so the state type is left to the model.
pub trait TransientModel {
    type State: Clone;

    /// State at the start of the run.
    fn initial_state(&self) -> Self::State;

    /// Time derivative at `(t, x)`.
    ///
    /// Takes `&mut self` so a model can solve (and warm-start) algebraic
    /// constraints as part of the evaluation.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// `a + b`, element-wise.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// `scale * a`.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
