//! Settings for the integration engine

use bon::Builder;

use crate::Float;

/// Settings for the simplified Newton stage solver.
#[derive(Builder, Clone, Debug)]
pub struct NewtonSettings {
    /// Max number of iterations per stage solve.
    #[builder(default = 25)]
    pub maxit: usize,
    /// Number of inner iterations between Jacobian evaluations and
    /// refactorizations of the iteration matrix.
    #[builder(default = 10)]
    pub refresh_jac: usize,
    /// Residual tolerance: converged when ||R|| drops below this.
    #[builder(default = 1e-9)]
    pub tol: Float,
    /// Increment tolerance: converged when ||dY|| drops below this.
    #[builder(default = 1e-10)]
    pub dx_delta: Float,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Settings for the adaptive step-size loop.
#[derive(Builder, Clone, Debug)]
pub struct Settings {
    /// Relative tolerance for the local error estimate.
    #[builder(default = 1e-5)]
    pub rtol: Float,
    /// Absolute tolerance for the local error estimate.
    #[builder(default = 1e-4)]
    pub atol: Float,
    /// Maximal step size.
    #[builder(default = 1e10)]
    pub max_dt: Float,
    /// Maximum number of step attempts (accepted and rejected alike).
    #[builder(default = 100_000)]
    pub nmax: usize,
    /// If false, keep the step size constant; Newton failure is then fatal.
    #[builder(default = true)]
    pub adaptive: bool,
    /// Weight step-size growth by the Newton iteration count of the step
    /// just taken, penalizing expensive convergence.
    #[builder(default = true)]
    pub newton_weighted_steps: bool,
    /// Refine the local error estimate with one extra derivative evaluation
    /// at the perturbed state.
    #[builder(default = true)]
    pub refined_error: bool,
    /// Minimum spacing between recorded samples of the trajectory.
    #[builder(default = 0.1)]
    pub sample_interval: Float,
    /// Emit a diagnostics summary every this many accepted steps (0 = only
    /// the final summary).
    #[builder(default = 0)]
    pub out_interval: usize,
    /// Initial step size. Defaults to 1e-6 when unset.
    pub h0: Option<Float>,
    /// Newton solver settings.
    #[builder(default)]
    pub newton: NewtonSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let s = Settings::default();
        assert!(s.adaptive);
        assert_eq!(s.nmax, 100_000);
        assert_eq!(s.newton.maxit, 25);
        assert!(s.h0.is_none());
    }

    #[test]
    fn builder_overrides() {
        let s = Settings::builder()
            .rtol(1e-6)
            .atol(1e-6)
            .adaptive(false)
            .h0(0.05)
            .newton(NewtonSettings::builder().maxit(12).build())
            .build();
        assert_eq!(s.rtol, 1e-6);
        assert!(!s.adaptive);
        assert_eq!(s.h0, Some(0.05));
        assert_eq!(s.newton.maxit, 12);
    }
}
