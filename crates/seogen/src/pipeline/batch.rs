use serde::Serialize;

/// The index range the driver synthesizes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub number: u64,
    pub start: u64,
    pub len: u64,
}

impl BatchPlan {
    /// Plans the batch after `cursor`, sized against the records still
    /// missing rather than the indices left. Duplicates consume indices
    /// without adding records, so the cursor can run past `target`.
    pub fn next(number: u64, cursor: u64, count: u64, target: u64, batch_size: u64) -> Option<Self> {
        let remaining = target.saturating_sub(count);
        if remaining == 0 {
            return None;
        }
        Some(Self {
            number,
            start: cursor,
            len: batch_size.min(remaining),
        })
    }

    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// What one committed batch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub number: u64,
    pub start: u64,
    pub attempted: u64,
    pub inserted: u64,
    pub duplicates: u64,
}
