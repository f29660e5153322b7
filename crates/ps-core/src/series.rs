//! Append-only time series with a pending (in-progress) step.
//!
//! Committed entries are never rewritten except through [`TimeSeries::amend`],
//! which replaces the most recent entry. Iterative solvers write their
//! intermediate iterates into the pending slot and the owner decides
//! afterwards whether the result starts a new step or replaces the last one.

/// What happens to pending iterates once a solve has converged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommitMode {
    /// Start a new step.
    Append,
    /// Overwrite the most recent step.
    #[default]
    Replace,
    /// Leave the iterate pending (intermediate integrator stages).
    Pending,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries<T> {
    history: Vec<T>,
    pending: Option<T>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            pending: None,
        }
    }
}

impl<T: Clone> TimeSeries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series with one committed initial value.
    pub fn with_initial(value: T) -> Self {
        Self {
            history: vec![value],
            pending: None,
        }
    }

    /// Most recent value: the pending iterate if any, else the last committed entry.
    pub fn current(&self) -> Option<&T> {
        self.pending.as_ref().or_else(|| self.history.last())
    }

    pub fn last_committed(&self) -> Option<&T> {
        self.history.last()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Overwrite the pending iterate.
    pub fn stage(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Append the pending iterate as a new step. Returns false if nothing was pending.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(v) => {
                self.history.push(v);
                true
            }
            None => false,
        }
    }

    /// Replace the last committed entry with the pending iterate
    /// (appends when the series is still empty).
    pub fn amend(&mut self) -> bool {
        match self.pending.take() {
            Some(v) => {
                match self.history.last_mut() {
                    Some(last) => *last = v,
                    None => self.history.push(v),
                }
                true
            }
            None => false,
        }
    }

    /// Resolve the pending iterate according to `mode`.
    pub fn settle(&mut self, mode: CommitMode) -> bool {
        match mode {
            CommitMode::Append => self.commit(),
            CommitMode::Replace => self.amend(),
            CommitMode::Pending => false,
        }
    }

    /// Append a value directly, dropping any pending iterate.
    pub fn push(&mut self, value: T) {
        self.pending = None;
        self.history.push(value);
    }

    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    pub fn history(&self) -> &[T] {
        &self.history
    }

    /// Number of committed steps.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
