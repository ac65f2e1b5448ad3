//! # metalog-raft
//!
//! Leader-side quorum state for a Raft-style replicated-log consensus
//! protocol in which cluster membership is itself stored in the log.
//!
//! The crate owns the per-epoch bookkeeping of an elected leader: who its
//! voters and observers are, how far each has replicated, when the high
//! watermark may advance, and when the leader has been out of touch with a
//! majority for long enough that it must step down.
//!
//! ## What this crate provides
//!
//! - **Replica registry** - per-replica progress for voters and observers
//! - **Quorum tracking** - majority-replicated offset and high-watermark
//!   advancement under the leader-epoch commitment rule
//! - **Liveness timers** - check-quorum (leader isolation) and
//!   begin-quorum (leadership re-announcement) pacing
//! - **Membership reconciliation** - voter/observer promotion and demotion
//!   as log-applied voter sets change
//! - **Leader-change bootstrap** - epoch-start control-record emission
//! - **Describe-quorum** - replication snapshot for monitoring
//!
//! Storage, networking, elections, and the enclosing role state machine are
//! **your responsibility**; this crate is driven from your Raft I/O thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────┐
//! │   Your role state machine         │
//! ├───────────────────────────────────┤
//! │   metalog-raft (LeaderState)      │  ← You are here
//! ├───────────────────────────────────┤
//! │   Your log store │ Your transport │  ← You implement
//! └───────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use metalog_raft::{BatchAccumulator, LeaderState, QuorumConfig, VoterSet};
//!
//! let config = QuorumConfig::new()?.validate()?;
//! let mut leader: LeaderState<Vec<u8>> = LeaderState::new(
//!     now_ms,
//!     local_key,
//!     epoch,
//!     epoch_start_offset,
//!     voter_set,
//!     offset_of_voters,
//!     kraft_version,
//!     granting_voters,
//!     accumulator,
//!     endpoints,
//!     &config,
//! );
//! leader.append_leader_change_message_and_bootstrap_records(now_ms)?;
//! ```

mod config;
mod describe;
mod election;
mod errors;
mod offset;
mod raft_role;
mod records;
mod replica_key;
mod replication;
mod timer;
mod version;
mod voters;

pub use config::*;
pub use describe::*;
pub use election::*;
pub use errors::*;
pub use offset::*;
pub use raft_role::*;
pub use records::*;
pub use replica_key::*;
pub use replication::*;
pub use timer::*;
pub use version::*;
pub use voters::*;
