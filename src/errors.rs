//! Error hierarchy for leader-side quorum bookkeeping.
//!
//! Programmer-error conditions (a fetch from the leader's own id, a
//! non-monotonic local end offset) surface as errors; regressions that can
//! result from benign races (reconnects, reconfiguration) are logged and
//! tolerated instead.

use config::ConfigError;

use crate::ReplicaKey;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Consensus protocol violations
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    /// Quorum tracking and liveness accounting failures
    #[error(transparent)]
    Quorum(#[from] QuorumError),

    /// Voter-set and replica-identity failures
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Batch accumulator contract violations
    #[error(transparent)]
    Batch(#[from] BatchError),
}

#[derive(Debug, thiserror::Error)]
pub enum QuorumError {
    /// The leader received a fetch carrying its own replica id
    #[error("Received a FETCH/FETCH_SNAPSHOT request from the leader itself ({0})")]
    FetchFromLocalReplica(i32),

    /// A remote replica update named the local leader
    #[error("Remote replica {0} matches the local leader")]
    LocalReplicaIdCollision(ReplicaKey),

    /// The local log end offset may never move backwards
    #[error("Detected non-monotonic update of local end offset: {current} -> {proposed}")]
    NonMonotonicLocalEndOffset { current: u64, proposed: u64 },

    /// BeginQuorumEpoch acknowledgements are only valid from current voters
    #[error("Unexpected acknowledgement from non-voter {0}")]
    AcknowledgementFromNonVoter(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// A replica key refinement must keep the replica id
    #[error("Attempting to update the replica key {current} with a different replica id {proposed}")]
    ReplicaIdMismatch {
        current: ReplicaKey,
        proposed: ReplicaKey,
    },

    /// A known directory id may not be silently replaced
    #[error("Attempting to update an already set directory id {current} with a different directory id {proposed}")]
    DirectoryIdMismatch {
        current: ReplicaKey,
        proposed: ReplicaKey,
    },

    /// Bootstrap voter-set re-broadcast requires reconfiguration support
    #[error("The bootstrap checkpoint contains a voter set at offset {offset} but feature level {feature_level} does not support reconfiguration")]
    BootstrapRewriteUnsupported { offset: i64, feature_level: i16 },
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Appends after close are rejected
    #[error("Batch accumulator is closed")]
    AccumulatorClosed,
}

// ============== Conversion Implementations ============== //
impl From<QuorumError> for Error {
    fn from(e: QuorumError) -> Self {
        Error::Consensus(ConsensusError::Quorum(e))
    }
}

impl From<MembershipError> for Error {
    fn from(e: MembershipError) -> Self {
        Error::Consensus(ConsensusError::Membership(e))
    }
}

impl From<BatchError> for Error {
    fn from(e: BatchError) -> Self {
        Error::Consensus(ConsensusError::Batch(e))
    }
}
