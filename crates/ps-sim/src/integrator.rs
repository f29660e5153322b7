//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance `x` from `t` to `t + dt`.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical Runge-Kutta, 4th order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        Ok(combine(model, x, [&k1, &k2, &k3, &k4], dt))
    }
}

/// Runge-Kutta variant whose last stage is evaluated at `x + dt·k2`.
///
/// Kept for reproducing older runs. The modified stage drops the method to
/// third order: local error is O(dt⁴) instead of O(dt⁵).
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyRk4;

impl Integrator for LegacyRk4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k2, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        Ok(combine(model, x, [&k1, &k2, &k3, &k4], dt))
    }
}

/// `x + dt/6 (k1 + 2 k2 + 2 k3 + k4)`
fn combine<M: TransientModel>(model: &M, x: &M::State, k: [&M::State; 4], dt: f64) -> M::State {
    let [k1, k2, k3, k4] = k;
    let k_sum = model.add(
        &model.add(k1, &model.scale(k2, 2.0)),
        &model.add(&model.scale(k3, 2.0), k4),
    );
    model.add(x, &model.scale(&k_sum, dt / 6.0))
}

/// Forward Euler (explicit, 1st order).
/// Calls rhs() once per step instead of 4 times.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}
