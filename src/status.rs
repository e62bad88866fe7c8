//! Status codes for integration runs

/// Overall outcome of an integration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The target time was reached.
    Success,
    /// The attempt budget was exhausted before reaching the target time.
    MaxStepsExceeded,
    /// A fatal error stopped the run; see [`crate::RkOutput::error`].
    GeneralError,
}
