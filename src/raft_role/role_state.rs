use crate::ElectionState;
use crate::Endpoints;
use crate::LogOffsetMetadata;
use crate::ReplicaKey;

/// What every per-epoch role state exposes to the enclosing state machine.
///
/// The driver holds the current role behind this trait: it reads the epoch
/// identity, consults the vote-granting policy when a candidate shows up,
/// and closes the state on any role transition.
pub trait EpochState {
    fn election(&self) -> ElectionState;

    fn epoch(&self) -> u64;

    fn leader_endpoints(&self) -> &Endpoints;

    fn high_watermark(&self) -> Option<&LogOffsetMetadata>;

    /// Whether this role would grant its vote to `candidate_key` in the
    /// current epoch.
    fn can_grant_vote(
        &self,
        candidate_key: &ReplicaKey,
        is_log_up_to_date: bool,
    ) -> bool;

    fn name(&self) -> &'static str;

    /// Release resources owned for the epoch. Called exactly once on role
    /// transition.
    fn close(&mut self);
}
