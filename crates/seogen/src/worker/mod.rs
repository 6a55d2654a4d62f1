pub mod job;
pub mod pool;

pub use job::{split_range, SynthesisJob, SynthesisResult};
pub use pool::SynthesisPool;
