//! Run output: sampled trajectory plus diagnostic counters.

use std::time::Duration;

use crate::{Float, error::Error, status::Status};

/// Evaluation and rejection counters accumulated over a run.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    /// Step attempts, accepted and rejected alike.
    pub attempts: usize,
    /// Accepted steps.
    pub accepted: usize,
    /// Stage solves that converged.
    pub newton_success: usize,
    /// Attempts rejected because the stage solve failed (either cause).
    pub newton_rejects: usize,
    /// Stage solves aborted because the increments started growing.
    pub newton_diverge: usize,
    /// Stage solves that hit the iteration limit.
    pub newton_maxit: usize,
    /// Attempts rejected because the local error estimate was too large.
    pub error_rejects: usize,
    /// Right-hand-side evaluations.
    pub fun_evals: usize,
    /// Jacobian evaluations.
    pub jac_evals: usize,
}

impl Counters {
    fn add(&mut self, other: &Counters) {
        self.attempts += other.attempts;
        self.accepted += other.accepted;
        self.newton_success += other.newton_success;
        self.newton_rejects += other.newton_rejects;
        self.newton_diverge += other.newton_diverge;
        self.newton_maxit += other.newton_maxit;
        self.error_rejects += other.error_rejects;
        self.fun_evals += other.fun_evals;
        self.jac_evals += other.jac_evals;
    }
}

/// The output of an integration run.
///
/// Samples are recorded at the configured cadence, not at every accepted
/// step; `t` and `y` always hold the final committed state. Fatal runtime
/// errors land in `error` with `status != Success` while the trajectory
/// collected so far stays intact.
#[derive(Debug, Clone)]
pub struct RkOutput {
    /// Sampled abscissae.
    pub t_vals: Vec<Float>,
    /// Sampled states.
    pub y_vals: Vec<Vec<Float>>,
    /// Stacked stage vector at each sample.
    pub stages: Vec<Vec<Float>>,
    /// Componentwise local error estimate at each sample.
    pub err_est: Vec<Vec<Float>>,
    /// Scaled scalar error at each sample.
    pub err: Vec<Float>,
    /// Final abscissa reached.
    pub t: Float,
    /// Final committed state.
    pub y: Vec<Float>,
    pub count: Counters,
    pub status: Status,
    /// The fatal error behind a non-success status, if any.
    pub error: Option<Error>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Fraction of attempts that were accepted.
    pub accept_frac: Float,
}

impl RkOutput {
    /// Merge a follow-up run into this one: trajectories are concatenated,
    /// counters summed, and the final state, status, and error taken from
    /// the later run.
    pub fn merge(mut self, other: RkOutput) -> RkOutput {
        self.t_vals.extend(other.t_vals);
        self.y_vals.extend(other.y_vals);
        self.stages.extend(other.stages);
        self.err_est.extend(other.err_est);
        self.err.extend(other.err);
        self.count.add(&other.count);
        self.t = other.t;
        self.y = other.y;
        self.status = other.status;
        self.error = other.error;
        self.elapsed += other.elapsed;
        self.accept_frac = if self.count.attempts > 0 {
            self.count.accepted as Float / self.count.attempts as Float
        } else {
            0.0
        };
        self
    }
}

/// Accumulates samples at a fixed cadence during a run.
pub(crate) struct Recorder {
    t_vals: Vec<Float>,
    y_vals: Vec<Vec<Float>>,
    stages: Vec<Vec<Float>>,
    err_est: Vec<Vec<Float>>,
    err: Vec<Float>,
    interval: Float,
    last: Option<Float>,
}

impl Recorder {
    pub fn new(interval: Float) -> Self {
        Self {
            t_vals: Vec::new(),
            y_vals: Vec::new(),
            stages: Vec::new(),
            err_est: Vec::new(),
            err: Vec::new(),
            interval,
            last: None,
        }
    }

    /// Record a sample unless the previous one is closer than the interval.
    pub fn sample(&mut self, t: Float, y: &[Float], stages: &[Float], err_est: &[Float], err: Float) {
        if let Some(t0) = self.last {
            if t - t0 < self.interval {
                return;
            }
        }
        self.last = Some(t);
        self.t_vals.push(t);
        self.y_vals.push(y.to_vec());
        self.stages.push(stages.to_vec());
        self.err_est.push(err_est.to_vec());
        self.err.push(err);
    }

    pub fn finish(
        self,
        t: Float,
        y: Vec<Float>,
        count: Counters,
        status: Status,
        error: Option<Error>,
        elapsed: Duration,
    ) -> RkOutput {
        let accept_frac = if count.attempts > 0 {
            count.accepted as Float / count.attempts as Float
        } else {
            0.0
        };
        RkOutput {
            t_vals: self.t_vals,
            y_vals: self.y_vals,
            stages: self.stages,
            err_est: self.err_est,
            err: self.err,
            t,
            y,
            count,
            status,
            error,
            elapsed,
            accept_frac,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(t0: Float, samples: usize, attempts: usize, accepted: usize) -> RkOutput {
        let mut rec = Recorder::new(0.1);
        for i in 0..samples {
            let t = t0 + i as Float;
            rec.sample(t, &[t], &[t], &[0.0], 0.0);
        }
        let count = Counters {
            attempts,
            accepted,
            ..Counters::default()
        };
        rec.finish(
            t0 + samples as Float,
            vec![0.0],
            count,
            Status::Success,
            None,
            Duration::from_millis(5),
        )
    }

    #[test]
    fn sampling_respects_cadence() {
        let mut rec = Recorder::new(0.5);
        rec.sample(0.0, &[1.0], &[], &[], 0.0);
        rec.sample(0.2, &[2.0], &[], &[], 0.0); // within the interval, dropped
        rec.sample(0.6, &[3.0], &[], &[], 0.0);
        let out = rec.finish(
            0.6,
            vec![3.0],
            Counters::default(),
            Status::Success,
            None,
            Duration::ZERO,
        );
        assert_eq!(out.t_vals, vec![0.0, 0.6]);
    }

    #[test]
    fn merge_concatenates_and_sums() {
        let a = run(0.0, 2, 4, 2);
        let b = run(2.0, 3, 6, 3);
        let merged = a.merge(b);
        assert_eq!(merged.t_vals.len(), 5);
        assert_eq!(merged.count.attempts, 10);
        assert_eq!(merged.count.accepted, 5);
        assert!((merged.accept_frac - 0.5).abs() < 1e-12);
        assert_eq!(merged.t, 5.0);
    }
}
