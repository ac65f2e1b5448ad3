//! Record batching on the leader's append path.
//!
//! The accumulator collects client records into drainable batches and gives
//! epoch-start control records a dedicated append path that always ships in
//! a batch of its own.
mod batch_accumulator;

pub use batch_accumulator::*;
