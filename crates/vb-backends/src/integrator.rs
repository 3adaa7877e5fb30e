//! Fixed-step time integrators for mass-action systems.

use vb_sim::BackendError;

/// A dynamic system `dx/dt = f(t, x)`.
pub trait TransientModel {
    type State: Clone;

    /// Compute `dx/dt` at `(t, x)`.
    fn rhs(&self, t: f64, x: &Self::State) -> Result<Self::State, BackendError>;

    /// Element-wise `a + b`.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// `scale * a`.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

pub trait Integrator {
    /// Advance `x` from `t` by `dt`.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> Result<M::State, BackendError>;
}

/// Classical fourth-order Runge-Kutta.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> Result<M::State, BackendError> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Explicit Euler; one rhs evaluation per step.
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> Result<M::State, BackendError> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

/// Integrate from `t0` to `t1` in steps no longer than `max_step`.
pub fn advance<I: Integrator, M: TransientModel>(
    integrator: &I,
    model: &M,
    t0: f64,
    t1: f64,
    x: &M::State,
    max_step: f64,
) -> Result<M::State, BackendError> {
    let span = t1 - t0;
    if span <= 0.0 {
        return Ok(x.clone());
    }
    let n = (span / max_step).ceil().max(1.0) as usize;
    let dt = span / n as f64;
    let mut state = x.clone();
    for i in 0..n {
        state = integrator.step(model, t0 + i as f64 * dt, &state, dt)?;
    }
    Ok(state)
}
