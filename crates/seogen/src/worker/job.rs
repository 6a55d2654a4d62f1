use crate::synth::ContentRecord;

/// A contiguous index range handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisJob {
    /// Position of this chunk within the batch.
    pub chunk: usize,
    pub start: u64,
    pub len: u64,
}

impl SynthesisJob {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

#[derive(Debug)]
pub struct SynthesisResult {
    pub chunk: usize,
    pub worker_id: usize,
    /// `None` when the worker panicked mid-chunk.
    pub records: Option<Vec<ContentRecord>>,
}

/// Splits `[start, start + len)` into at most `parts` contiguous chunks of
/// near-equal size, in index order.
pub fn split_range(start: u64, len: u64, parts: usize) -> Vec<SynthesisJob> {
    if len == 0 || parts == 0 {
        return Vec::new();
    }

    let parts = (parts as u64).min(len);
    let base = len / parts;
    let extra = len % parts;

    let mut jobs = Vec::with_capacity(parts as usize);
    let mut next = start;
    for chunk in 0..parts {
        let size = base + u64::from(chunk < extra);
        jobs.push(SynthesisJob {
            chunk: chunk as usize,
            start: next,
            len: size,
        });
        next += size;
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_covers_range_in_order() {
        let jobs = split_range(100, 10, 3);
        let sizes: Vec<u64> = jobs.iter().map(|j| j.len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(jobs[0].start, 100);
        assert_eq!(jobs[1].start, 104);
        assert_eq!(jobs[2].end(), 110);
    }

    #[test]
    fn test_split_never_makes_empty_chunks() {
        let jobs = split_range(0, 2, 8);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.len == 1));
        assert!(split_range(0, 0, 4).is_empty());
    }
}
