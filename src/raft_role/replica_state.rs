use std::cmp::Ordering;
use std::fmt;

use crate::LogOffsetMetadata;
use crate::MembershipError;
use crate::ReplicaKey;
use crate::Result;

/// Replication progress the leader tracks for one replica, voter or
/// observer.
pub struct ReplicaState {
    pub(super) replica_key: ReplicaKey,
    pub(super) end_offset: Option<LogOffsetMetadata>,
    pub(super) last_fetch_timestamp: i64,
    pub(super) last_fetch_leader_log_end_offset: i64,
    pub(super) last_caught_up_timestamp: i64,
    pub(super) has_acknowledged_leader: bool,
}

impl ReplicaState {
    pub(super) fn new(
        replica_key: ReplicaKey,
        has_acknowledged_leader: bool,
    ) -> Self {
        Self {
            replica_key,
            end_offset: None,
            last_fetch_timestamp: -1,
            last_fetch_leader_log_end_offset: -1,
            last_caught_up_timestamp: -1,
            has_acknowledged_leader,
        }
    }

    pub fn replica_key(&self) -> &ReplicaKey {
        &self.replica_key
    }

    pub fn end_offset(&self) -> Option<&LogOffsetMetadata> {
        self.end_offset.as_ref()
    }

    pub fn last_fetch_timestamp(&self) -> i64 {
        self.last_fetch_timestamp
    }

    pub fn last_caught_up_timestamp(&self) -> i64 {
        self.last_caught_up_timestamp
    }

    pub fn has_acknowledged_leader(&self) -> bool {
        self.has_acknowledged_leader
    }

    /// Refine the stored key with a newly learned directory id.
    ///
    /// The id is immutable, and a directory id that is already known may
    /// only be confirmed, never replaced.
    pub(super) fn set_replica_key(
        &mut self,
        replica_key: ReplicaKey,
    ) -> Result<()> {
        if self.replica_key.id() != replica_key.id() {
            return Err(MembershipError::ReplicaIdMismatch {
                current: self.replica_key.clone(),
                proposed: replica_key,
            }
            .into());
        }
        if self.replica_key.directory_id().is_some() && self.replica_key != replica_key {
            return Err(MembershipError::DirectoryIdMismatch {
                current: self.replica_key.clone(),
                proposed: replica_key,
            }
            .into());
        }
        self.replica_key = replica_key;
        Ok(())
    }

    pub(super) fn matches_key(
        &self,
        replica_key: &ReplicaKey,
    ) -> bool {
        self.replica_key.matches(replica_key)
    }

    /// For the leader only the end offset is tracked; fetch and caught-up
    /// times are determined implicitly.
    pub(super) fn update_leader_end_offset(
        &mut self,
        end_offset_metadata: LogOffsetMetadata,
    ) {
        self.end_offset = Some(end_offset_metadata);
    }

    /// Fold one fetch from this replica into its progress record.
    ///
    /// `last_caught_up_timestamp` is settled before `last_fetch_timestamp`
    /// moves: if this fetch reached the offset the leader held at the
    /// replica's previous fetch, the replica was caught up as of that
    /// previous fetch time. The `max` clamps tolerate clock skew and
    /// out-of-order arrivals.
    pub(super) fn update_follower_state(
        &mut self,
        current_time_ms: i64,
        fetch_offset_metadata: LogOffsetMetadata,
        leader_end_offset: Option<&LogOffsetMetadata>,
    ) {
        if let Some(leader_end_offset) = leader_end_offset {
            if fetch_offset_metadata.offset() >= leader_end_offset.offset() {
                self.last_caught_up_timestamp = self.last_caught_up_timestamp.max(current_time_ms);
            } else if self.last_fetch_leader_log_end_offset > 0
                && fetch_offset_metadata.offset() as i64 >= self.last_fetch_leader_log_end_offset
            {
                self.last_caught_up_timestamp =
                    self.last_caught_up_timestamp.max(self.last_fetch_timestamp);
            }
            self.last_fetch_leader_log_end_offset = leader_end_offset.offset() as i64;
        }

        self.last_fetch_timestamp = self.last_fetch_timestamp.max(current_time_ms);
        self.end_offset = Some(fetch_offset_metadata);
        self.has_acknowledged_leader = true;
    }
}

/// Order by end offset descending; a replica with no reported offset sorts
/// last. Ties break by replica key ascending so sorted listings are
/// deterministic.
pub(super) fn compare_by_descending_fetch_offset(
    left: &ReplicaState,
    right: &ReplicaState,
) -> Ordering {
    match (&left.end_offset, &right.end_offset) {
        (Some(l), Some(r)) if l == r => left.replica_key.cmp(&right.replica_key),
        (Some(l), Some(r)) => r.offset().cmp(&l.offset()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.replica_key.cmp(&right.replica_key),
    }
}

impl fmt::Debug for ReplicaState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "ReplicaState(replica_key={}, end_offset={:?}, last_fetch_timestamp={}, last_caught_up_timestamp={}, has_acknowledged_leader={})",
            self.replica_key,
            self.end_offset,
            self.last_fetch_timestamp,
            self.last_caught_up_timestamp,
            self.has_acknowledged_leader
        )
    }
}
