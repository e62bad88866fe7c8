//! Injectable observer for structured integration events.
//!
//! The engine reports what happened through [`Diagnostics::event`] and never
//! formats text itself; sinks decide how (and whether) to render events.

use std::time::Duration;

use crate::Float;

/// Why a step attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCause {
    /// Newton increments started growing.
    NewtonDiverged,
    /// Newton hit its iteration limit without converging.
    NewtonMaxit,
    /// The scaled local error estimate exceeded one.
    ErrorTooLarge,
}

/// Structured events emitted during a run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A step attempt was accepted and the state committed.
    StepAccepted {
        /// Accepted-step ordinal (starts at 1).
        step: usize,
        t: Float,
        dt: Float,
        err: Float,
        newton_iters: usize,
    },
    /// A step attempt was rejected; time and state are unchanged.
    StepRejected {
        t: Float,
        dt: Float,
        cause: RejectCause,
    },
    /// Periodic and end-of-run throughput summary.
    Summary {
        attempts: usize,
        accepted: usize,
        accept_frac: Float,
        elapsed: Duration,
    },
}

/// Observer receiving [`Event`]s as the integration progresses.
pub trait Diagnostics {
    fn event(&mut self, event: &Event);
}

/// Sink that discards all events.
pub struct NopDiagnostics;

impl Diagnostics for NopDiagnostics {
    fn event(&mut self, _event: &Event) {}
}

/// Sink that forwards events to the [`log`] crate: per-step events at debug
/// level, summaries at info level.
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn event(&mut self, event: &Event) {
        match event {
            Event::StepAccepted {
                step,
                t,
                dt,
                err,
                newton_iters,
            } => log::debug!(
                "step {}: t = {:e}, dt = {:e}, err = {:e}, newton iters = {}",
                step,
                t,
                dt,
                err,
                newton_iters
            ),
            Event::StepRejected { t, dt, cause } => {
                log::debug!("rejected at t = {:e} (dt = {:e}): {:?}", t, dt, cause)
            }
            Event::Summary {
                attempts,
                accepted,
                accept_frac,
                elapsed,
            } => log::info!(
                "{} of {} attempts accepted ({:.1}%) in {:?}",
                accepted,
                attempts,
                accept_frac * 100.0,
                elapsed
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSink {
        accepted: usize,
        rejected: usize,
    }

    impl Diagnostics for CountingSink {
        fn event(&mut self, event: &Event) {
            match event {
                Event::StepAccepted { .. } => self.accepted += 1,
                Event::StepRejected { .. } => self.rejected += 1,
                Event::Summary { .. } => {}
            }
        }
    }

    #[test]
    fn sinks_observe_events() {
        let mut sink = CountingSink {
            accepted: 0,
            rejected: 0,
        };
        sink.event(&Event::StepAccepted {
            step: 1,
            t: 0.1,
            dt: 0.1,
            err: 0.5,
            newton_iters: 3,
        });
        sink.event(&Event::StepRejected {
            t: 0.1,
            dt: 0.2,
            cause: RejectCause::ErrorTooLarge,
        });
        assert_eq!(sink.accepted, 1);
        assert_eq!(sink.rejected, 1);
    }
}
