//! Errors for the integration engine

use crate::Float;

/// Validation and fatal numerical errors.
///
/// Validation variants are returned by the entry points before any stepping
/// occurs. The fatal numerical variants travel through the normal result path
/// in [`crate::RkOutput::error`] so the partial trajectory stays available.
#[derive(Debug, Clone)]
pub enum Error {
    /// The tableau failed its structural consistency check (dimension or
    /// row-sum mismatch).
    InvalidTableau(&'static str),
    /// Adaptive stepping was requested for a method without embedded weights.
    AdaptiveRequiresEmbedded(&'static str),
    /// The coefficient matrix A is singular, so the stage-to-update weight
    /// transform does not exist for this method.
    SingularMethodMatrix(&'static str),
    NMaxMustBePositive(usize),
    NewtonMaxIterMustBePositive(usize),
    RefreshJacMustBePositive(usize),
    ToleranceMustBePositive(Float),
    InvalidStepSize(Float),
    InvalidInterval(Float, Float),
    /// The iteration matrix could not be factorized at (t, dt).
    SingularIterationMatrix { t: Float, dt: Float },
    /// The step-size scale factor blew up, which means the error inputs
    /// themselves are corrupted (NaN/Inf or impossibly small).
    StepFactorDiverged {
        factor: Float,
        err: Float,
        old_err: Float,
    },
    /// Newton failed to converge under constant step size, where no retry
    /// with a smaller step is possible.
    NewtonFailedFixedStep { t: Float, dt: Float },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTableau(name) => {
                write!(f, "tableau for method {} is inconsistent", name)
            }
            Error::AdaptiveRequiresEmbedded(name) => write!(
                f,
                "method {} has no embedded weights; adaptive stepping is impossible",
                name
            ),
            Error::SingularMethodMatrix(name) => write!(
                f,
                "coefficient matrix of method {} is singular; no update weights exist",
                name
            ),
            Error::NMaxMustBePositive(v) => write!(f, "nmax must be positive (got {})", v),
            Error::NewtonMaxIterMustBePositive(v) => {
                write!(f, "newton maxit must be positive (got {})", v)
            }
            Error::RefreshJacMustBePositive(v) => {
                write!(f, "refresh_jac must be positive (got {})", v)
            }
            Error::ToleranceMustBePositive(v) => {
                write!(f, "tolerances must be positive (got {})", v)
            }
            Error::InvalidStepSize(v) => write!(f, "step size must be positive (got {})", v),
            Error::InvalidInterval(t0, t1) => {
                write!(f, "integration interval [{}, {}] is empty", t0, t1)
            }
            Error::SingularIterationMatrix { t, dt } => write!(
                f,
                "iteration matrix is singular at t = {} with dt = {}",
                t, dt
            ),
            Error::StepFactorDiverged {
                factor,
                err,
                old_err,
            } => write!(
                f,
                "step-size factor {} diverged (err = {}, old_err = {})",
                factor, err, old_err
            ),
            Error::NewtonFailedFixedStep { t, dt } => write!(
                f,
                "newton iteration failed at t = {} for constant step size {}",
                t, dt
            ),
        }
    }
}
