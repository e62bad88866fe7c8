//! PI step-size control and step/error history.

use crate::{Float, error::Error, settings::Settings};

/// Ring of the last three step sizes and scaled errors, newest first.
///
/// Pushed exactly once per completed step attempt; the controller reads the
/// previous error from it.
#[derive(Debug, Clone)]
pub(crate) struct StepHistory {
    dts: [Float; 3],
    errs: [Float; 3],
}

impl StepHistory {
    pub fn new(dt0: Float) -> Self {
        Self {
            dts: [dt0; 3],
            // Seed below one so the very first step is allowed to grow.
            errs: [0.9; 3],
        }
    }

    pub fn push(&mut self, dt: Float, err: Float) {
        self.dts[2] = self.dts[1];
        self.dts[1] = self.dts[0];
        self.dts[0] = dt;
        self.errs[2] = self.errs[1];
        self.errs[1] = self.errs[0];
        self.errs[0] = err;
    }

    /// Error of the attempt before the most recent push.
    pub fn prev_err(&self) -> Float {
        self.errs[1]
    }

    #[cfg(test)]
    pub fn dts(&self) -> &[Float; 3] {
        &self.dts
    }
}

/// Largest allowed step growth per accepted step.
const MAX_GROWTH: Float = 8.0;

/// Compute the next trial step size from a PI control law.
///
/// With `alpha = 1/min_order` and a small fixed damping exponent `beta`, the
/// growth factor is `(1/err)^alpha * old_err^beta`, optionally divided by
/// `sqrt(newton_iters)` to penalize costly convergence, and capped at
/// [`MAX_GROWTH`]. After a rejection the factor is clamped to one and
/// additionally damped by `1/sqrt(1 + rejected)`, so the next trial step is
/// strictly smaller than the rejected one. The result is capped at
/// `settings.max_dt`.
///
/// A non-finite or absurdly large factor means the error inputs themselves
/// are corrupted (NaN/Inf tolerances or state); this is reported as a fatal
/// [`Error::StepFactorDiverged`] instead of producing a nonsensical step.
pub(crate) fn next_step_size(
    dt: Float,
    err: Float,
    old_err: Float,
    min_order: usize,
    newton_iters: usize,
    rejected: usize,
    settings: &Settings,
) -> Result<Float, Error> {
    if err.is_nan() || old_err.is_nan() {
        return Err(Error::StepFactorDiverged {
            factor: Float::NAN,
            err,
            old_err,
        });
    }
    let err = err.max(Float::EPSILON);
    let old_err = old_err.max(Float::EPSILON);

    let alpha = 1.0 / min_order as Float;
    let beta = 0.08;

    let mut factor = (1.0 / err).powf(alpha) * old_err.powf(beta);
    if settings.newton_weighted_steps {
        factor /= (newton_iters as Float).sqrt();
    }

    if !factor.is_finite() || factor >= 1e10 {
        return Err(Error::StepFactorDiverged {
            factor,
            err,
            old_err,
        });
    }

    // Never grow by more than 8x in one step.
    factor = factor.min(MAX_GROWTH);
    if rejected > 0 {
        factor = factor.min(1.0);
    }
    let damping = 1.0 / (1.0 + rejected as Float).sqrt();

    Ok((dt * factor * damping).min(settings.max_dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::builder().newton_weighted_steps(false).build()
    }

    #[test]
    fn history_rotates() {
        let mut h = StepHistory::new(0.1);
        h.push(0.2, 1.5);
        h.push(0.3, 0.5);
        assert_eq!(h.dts(), &[0.3, 0.2, 0.1]);
        assert_eq!(h.prev_err(), 1.5);
    }

    #[test]
    fn grows_on_small_error() {
        let dt = next_step_size(0.1, 0.01, 0.01, 2, 1, 0, &settings()).unwrap();
        assert!(dt > 0.1);
    }

    #[test]
    fn shrinks_strictly_after_rejection() {
        // Even a barely-too-large error with a large previous error must
        // shrink the step once a rejection happened.
        let dt = next_step_size(0.1, 1.01, 100.0, 2, 1, 1, &settings()).unwrap();
        assert!(dt < 0.1);
        let dt = next_step_size(0.1, 5.0, 0.5, 3, 1, 2, &settings()).unwrap();
        assert!(dt < 0.1);
    }

    #[test]
    fn growth_is_capped() {
        // A vanishing error would ask for a huge factor; growth stays at 8x.
        let dt = next_step_size(0.01, 1e-12, 0.9, 4, 1, 0, &settings()).unwrap();
        assert!((dt - 0.08).abs() < 1e-12);
    }

    #[test]
    fn caps_at_max_dt() {
        let s = Settings::builder()
            .max_dt(0.5)
            .newton_weighted_steps(false)
            .build();
        let dt = next_step_size(0.4, 1e-8, 1e-8, 1, 1, 0, &s).unwrap();
        assert_eq!(dt, 0.5);
    }

    #[test]
    fn newton_iterations_penalize_growth() {
        let s = Settings::builder().newton_weighted_steps(true).build();
        let cheap = next_step_size(0.1, 0.1, 0.1, 2, 1, 0, &s).unwrap();
        let costly = next_step_size(0.1, 0.1, 0.1, 2, 16, 0, &s).unwrap();
        assert!((cheap / costly - 4.0).abs() < 1e-9);
    }

    #[test]
    fn corrupted_error_is_fatal() {
        let err = next_step_size(0.1, Float::NAN, 1.0, 2, 1, 0, &settings()).unwrap_err();
        assert!(matches!(err, Error::StepFactorDiverged { .. }));
        // min_order 1 with an error at the floor explodes the factor
        let err = next_step_size(0.1, 0.0, 1.0, 1, 1, 0, &settings()).unwrap_err();
        assert!(matches!(err, Error::StepFactorDiverged { .. }));
    }
}
