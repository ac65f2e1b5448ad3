//! Per-epoch role state. Only the leader role lives in this crate; the
//! enclosing state machine owns the transitions between roles and drives
//! the operations exposed here from its I/O thread.
mod leader_state;
mod replica_state;
mod role_state;

pub use leader_state::*;
pub use replica_state::*;
pub use role_state::*;

#[cfg(test)]
mod leader_state_test;
