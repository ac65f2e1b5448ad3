use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::replica_state::compare_by_descending_fetch_offset;
use super::replica_state::ReplicaState;
use super::role_state::EpochState;
use crate::records::KRAFT_VERSION_CURRENT_VERSION;
use crate::records::KRAFT_VOTERS_CURRENT_VERSION;
use crate::records::LEADER_CHANGE_CURRENT_VERSION;
use crate::BatchAccumulator;
use crate::ControlRecord;
use crate::ElectionState;
use crate::Endpoints;
use crate::KRaftVersion;
use crate::KRaftVersionRecord;
use crate::LeaderChangeMessage;
use crate::LogOffsetMetadata;
use crate::MembershipError;
use crate::NodeInfo;
use crate::QuorumConfig;
use crate::QuorumError;
use crate::QuorumInfo;
use crate::QuorumTimer;
use crate::ReplicaInfo;
use crate::ReplicaKey;
use crate::Result;
use crate::Voter;
use crate::VoterSet;

/// Observers that have not fetched for this long are dropped from the
/// describe-quorum read-out.
pub const OBSERVER_SESSION_TIMEOUT_MS: i64 = 300_000;
/// The check-quorum timeout is the fetch timeout stretched by this factor to
/// tolerate network transit and IO time.
pub const CHECK_QUORUM_TIMEOUT_FACTOR: f64 = 1.5;

/// Per-epoch state of an elected leader.
///
/// Tracks how far each voter and observer has replicated, advances the high
/// watermark once a majority of voters carry an offset past the epoch start,
/// and watches its own liveness: a leader that stops hearing fetches from a
/// majority of voters within the check-quorum timeout is expected to resign.
///
/// An acknowledged voter is one that has acknowledged the current leader by
/// responding to a BeginQuorumEpoch request or by starting to fetch; the
/// unacknowledged remainder are the targets for BeginQuorumEpoch
/// retransmissions.
///
/// Created on election, discarded on step-down. All operations run on the
/// driver thread except `request_resign`/`is_resign_requested`, which may
/// cross threads.
///
/// # Type Parameters
/// - `T`: log record type carried by the batch accumulator
pub struct LeaderState<T> {
    local_replica_key: ReplicaKey,
    epoch: u64,
    epoch_start_offset: u64,
    granting_voters: HashSet<i32>,
    endpoints: Endpoints,
    voter_set_at_epoch_start: VoterSet,
    // Non-empty when the epoch-start voter set came from a log segment or a
    // checkpoint; Some(-1) means the bootstrap checkpoint.
    offset_of_voters_at_epoch_start: Option<i64>,
    kraft_version_at_epoch_start: KRaftVersion,

    high_watermark: Option<LogOffsetMetadata>,
    voter_states: HashMap<i32, ReplicaState>,
    observer_states: HashMap<ReplicaKey, ReplicaState>,
    accumulator: BatchAccumulator<T>,

    // Voters seen fetching within the current check-quorum window. Never
    // contains the local id.
    fetched_voters: HashSet<i32>,
    check_quorum_timer: QuorumTimer,
    check_quorum_timeout_ms: u64,
    begin_quorum_epoch_timer: QuorumTimer,
    begin_quorum_epoch_timeout_ms: u64,

    // Resignation can be requested from an external thread.
    resign_requested: AtomicBool,
}

impl<T> LeaderState<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        now_ms: i64,
        local_replica_key: ReplicaKey,
        epoch: u64,
        epoch_start_offset: u64,
        voter_set_at_epoch_start: VoterSet,
        offset_of_voters_at_epoch_start: Option<i64>,
        kraft_version_at_epoch_start: KRaftVersion,
        granting_voters: HashSet<i32>,
        accumulator: BatchAccumulator<T>,
        endpoints: Endpoints,
        config: &QuorumConfig,
    ) -> Self {
        let mut voter_states = HashMap::with_capacity(voter_set_at_epoch_start.len());
        for voter_node in voter_set_at_epoch_start.voter_nodes() {
            // The leader has trivially acknowledged itself.
            let has_acknowledged_leader = voter_node.is_voter(&local_replica_key);
            voter_states.insert(
                voter_node.voter_key().id(),
                ReplicaState::new(voter_node.voter_key().clone(), has_acknowledged_leader),
            );
        }

        let check_quorum_timeout_ms =
            (config.fetch_timeout_ms as f64 * CHECK_QUORUM_TIMEOUT_FACTOR).ceil() as u64;
        let begin_quorum_epoch_timeout_ms = config.fetch_timeout_ms / 2;

        Self {
            local_replica_key,
            epoch,
            epoch_start_offset,
            granting_voters,
            endpoints,
            voter_set_at_epoch_start,
            offset_of_voters_at_epoch_start,
            kraft_version_at_epoch_start,
            high_watermark: None,
            voter_states,
            observer_states: HashMap::new(),
            accumulator,
            fetched_voters: HashSet::new(),
            check_quorum_timer: QuorumTimer::new(now_ms, check_quorum_timeout_ms),
            check_quorum_timeout_ms,
            // Expired from the start so the first BeginQuorumEpoch round
            // fires immediately.
            begin_quorum_epoch_timer: QuorumTimer::new(now_ms, 0),
            begin_quorum_epoch_timeout_ms,
            resign_requested: AtomicBool::new(false),
        }
    }

    pub fn time_until_begin_quorum_epoch_timer_expires(
        &mut self,
        current_time_ms: i64,
    ) -> u64 {
        self.begin_quorum_epoch_timer.update(current_time_ms);
        self.begin_quorum_epoch_timer.remaining_ms()
    }

    pub fn reset_begin_quorum_epoch_timer(
        &mut self,
        current_time_ms: i64,
    ) {
        self.begin_quorum_epoch_timer.update(current_time_ms);
        self.begin_quorum_epoch_timer.reset(self.begin_quorum_epoch_timeout_ms);
    }

    /// Remaining time until the leader must step down for lack of majority
    /// contact.
    ///
    /// The timer is fed by fetches from voters; a singleton voter set can
    /// never lose quorum, so it reports an infinite remainder.
    pub fn time_until_check_quorum_expires(
        &mut self,
        current_time_ms: i64,
    ) -> u64 {
        if self.voter_states.len() == 1 {
            return u64::MAX;
        }
        self.check_quorum_timer.update(current_time_ms);
        let remaining_ms = self.check_quorum_timer.remaining_ms();
        if remaining_ms == 0 {
            info!(
                "Did not receive fetch request from the majority of the voters within {}ms. \
                 Current fetched voters are {:?}, and voters are {:?}",
                self.check_quorum_timeout_ms,
                self.fetched_voters,
                self.voter_states.values().map(|voter| voter.replica_key()).collect::<Vec<_>>()
            );
        }
        remaining_ms
    }

    /// Record a fetch from `replica_key` for check-quorum accounting, and
    /// reset the timer once a majority of voters has been seen this window.
    pub fn update_check_quorum_for_following_voter(
        &mut self,
        replica_key: &ReplicaKey,
        current_time_ms: i64,
    ) -> Result<()> {
        self.update_fetched_voters(replica_key)?;
        // The majority count of the voters. Ex: 2 for 3 voters, 3 for 4
        // voters... etc.
        let mut majority = self.voter_states.len() / 2 + 1;
        // If the leader is in the voter set it counts implicitly toward the
        // majority, but it will never appear in fetched_voters. If it is not
        // in the voter set, the majority must consist of fetched voters
        // alone.
        if self.voter_states.contains_key(&self.local_replica_key.id()) {
            majority -= 1;
        }

        if self.fetched_voters.len() >= majority {
            self.fetched_voters.clear();
            self.check_quorum_timer.update(current_time_ms);
            self.check_quorum_timer.reset(self.check_quorum_timeout_ms);
        }
        Ok(())
    }

    fn update_fetched_voters(
        &mut self,
        replica_key: &ReplicaKey,
    ) -> Result<()> {
        if replica_key.id() == self.local_replica_key.id() {
            return Err(QuorumError::FetchFromLocalReplica(replica_key.id()).into());
        }

        if self
            .voter_states
            .get(&replica_key.id())
            .is_some_and(|state| state.matches_key(replica_key))
        {
            self.fetched_voters.insert(replica_key.id());
        }
        Ok(())
    }

    pub fn accumulator(&self) -> &BatchAccumulator<T> {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut BatchAccumulator<T> {
        &mut self.accumulator
    }

    fn convert_to_voters(voter_ids: impl IntoIterator<Item = i32>) -> Vec<Voter> {
        let mut ids: Vec<i32> = voter_ids.into_iter().collect();
        ids.sort_unstable();
        ids.into_iter().map(|voter_id| Voter { voter_id }).collect()
    }

    /// Append the leader-change control record for this epoch, plus the
    /// bootstrap voter-set records when membership came from the bootstrap
    /// checkpoint rather than the log, and force the batch out on its own.
    pub fn append_leader_change_message_and_bootstrap_records(
        &mut self,
        current_time_ms: i64,
    ) -> Result<()> {
        let voters = Self::convert_to_voters(self.voter_states.keys().copied());
        let granting_voters = Self::convert_to_voters(self.granting_voters.iter().copied());

        let leader_change_message = LeaderChangeMessage {
            version: LEADER_CHANGE_CURRENT_VERSION,
            leader_id: self.local_replica_key.id(),
            voters,
            granting_voters,
        };

        let bootstrap_records = match self.offset_of_voters_at_epoch_start {
            // The voter set came from the bootstrap checkpoint: rewrite it
            // to the log so that it is replicated to the followers.
            Some(offset) if offset == -1 => {
                if !self.kraft_version_at_epoch_start.is_reconfig_supported() {
                    return Err(MembershipError::BootstrapRewriteUnsupported {
                        offset,
                        feature_level: self.kraft_version_at_epoch_start.feature_level(),
                    }
                    .into());
                }
                Some((
                    KRaftVersionRecord {
                        version: KRAFT_VERSION_CURRENT_VERSION,
                        kraft_version: self.kraft_version_at_epoch_start.feature_level(),
                    },
                    self.voter_set_at_epoch_start.to_voters_record(KRAFT_VOTERS_CURRENT_VERSION),
                ))
            }
            _ => None,
        };

        self.accumulator.append_control_batch(current_time_ms, |builder| {
            builder.append(ControlRecord::LeaderChange(leader_change_message));
            if let Some((version_record, voters_record)) = bootstrap_records {
                builder.append(ControlRecord::KRaftVersion(version_record));
                builder.append(ControlRecord::Voters(voters_record));
            }
            Ok(())
        })?;
        self.accumulator.force_drain();
        Ok(())
    }

    pub fn is_resign_requested(&self) -> bool {
        self.resign_requested.load(Ordering::Acquire)
    }

    /// Ask the driver to relinquish leadership. Safe to call from any
    /// thread.
    pub fn request_resign(&self) {
        self.resign_requested.store(true, Ordering::Release);
    }

    pub fn high_watermark(&self) -> Option<&LogOffsetMetadata> {
        self.high_watermark.as_ref()
    }

    pub fn election(&self) -> ElectionState {
        ElectionState::with_elected_leader(
            self.epoch,
            self.local_replica_key.id(),
            self.voter_states.keys().copied(),
        )
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn epoch_start_offset(&self) -> u64 {
        self.epoch_start_offset
    }

    pub fn leader_endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn granting_voters(&self) -> &HashSet<i32> {
        &self.granting_voters
    }

    /// Voters that still need a BeginQuorumEpoch retransmission.
    pub fn non_acknowledging_voters(&self) -> HashSet<ReplicaKey> {
        self.voter_states
            .values()
            .filter(|state| !state.has_acknowledged_leader)
            .map(|state| state.replica_key().clone())
            .collect()
    }

    fn maybe_update_high_watermark(&mut self) -> bool {
        // Find the largest offset which is replicated to a majority of
        // voters (the leader counts, when it is a voter).
        let index_of_hw = self.voter_states.len() / 2;
        let followers_by_descending_fetch_offset = self.followers_by_descending_fetch_offset();
        let candidate = followers_by_descending_fetch_offset
            .get(index_of_hw)
            .and_then(|state| state.end_offset().cloned());
        let replication_state = format!("{:?}", followers_by_descending_fetch_offset);
        drop(followers_by_descending_fetch_offset);

        let Some(candidate) = candidate else {
            return false;
        };

        // Commitment rule: the leader must commit one record from its own
        // epoch before it may expose records from any previous epoch. This
        // guarantees its log contains the largest record (in terms of
        // epoch/offset) in any log, so any future leader will have
        // replicated this record as well as everything the current leader
        // has committed.
        if candidate.offset() <= self.epoch_start_offset {
            return false;
        }

        match &self.high_watermark {
            Some(current) => {
                if candidate.offset() > current.offset()
                    || (candidate.offset() == current.offset()
                        && candidate.metadata() != current.metadata())
                {
                    let old_high_watermark = self.high_watermark.replace(candidate);
                    debug!(
                        "High watermark set to {:?} from {:?} based on index_of_hw {} and voters {}",
                        self.high_watermark, old_high_watermark, index_of_hw, replication_state
                    );
                    true
                } else if candidate.offset() < current.offset() {
                    warn!(
                        "The latest computed high watermark {} is smaller than the current value {}, \
                         which should only happen when voter set membership changes. If the voter set \
                         has not changed this suggests that one of the voters has lost committed data. \
                         Full voter replication state: {}",
                        candidate.offset(),
                        current.offset(),
                        replication_state
                    );
                    false
                } else {
                    false
                }
            }
            None => {
                self.high_watermark = Some(candidate);
                info!(
                    "High watermark set to {:?} for the first time for epoch {} based on \
                     index_of_hw {} and voters {}",
                    self.high_watermark, self.epoch, index_of_hw, replication_state
                );
                true
            }
        }
    }

    /// Update the local replica state.
    ///
    /// `last_voter_set` is the most recently applied voter set; any
    /// difference against the tracked voters is reconciled here, promoting
    /// and demoting replicas between voter and observer standing.
    ///
    /// Returns true if the high watermark advanced as a result of this call.
    pub fn update_local_state(
        &mut self,
        end_offset_metadata: LogOffsetMetadata,
        last_voter_set: &VoterSet,
    ) -> Result<bool> {
        let local_key = self.local_replica_key.clone();
        let state = self.get_or_create_replica_state(local_key);
        if let Some(current) = state.end_offset() {
            if current.offset() > end_offset_metadata.offset() {
                return Err(QuorumError::NonMonotonicLocalEndOffset {
                    current: current.offset(),
                    proposed: end_offset_metadata.offset(),
                }
                .into());
            }
        }
        state.update_leader_end_offset(end_offset_metadata);
        self.update_voter_and_observer_states(last_voter_set)?;

        Ok(self.maybe_update_high_watermark())
    }

    /// Update a remote replica's state from one of its fetches.
    ///
    /// Fetches from a negative replica id come from non-replica readers and
    /// are ignored. Only fetches from current voters can advance the high
    /// watermark.
    ///
    /// Returns true if the high watermark advanced as a result of this call.
    pub fn update_replica_state(
        &mut self,
        replica_key: &ReplicaKey,
        current_time_ms: i64,
        fetch_offset_metadata: LogOffsetMetadata,
    ) -> Result<bool> {
        if replica_key.id() < 0 {
            debug!("Ignoring fetch from non-replica {}", replica_key);
            return Ok(false);
        } else if replica_key.id() == self.local_replica_key.id() {
            return Err(QuorumError::LocalReplicaIdCollision(replica_key.clone()).into());
        }

        let leader_end_offset = {
            let local_key = self.local_replica_key.clone();
            self.get_or_create_replica_state(local_key).end_offset().cloned()
        };

        let state = self.get_or_create_replica_state(replica_key.clone());
        if let Some(current) = state.end_offset() {
            if current.offset() > fetch_offset_metadata.offset() {
                warn!(
                    "Detected non-monotonic update of fetch offset from nodeId {}: {} -> {}",
                    state.replica_key(),
                    current.offset(),
                    fetch_offset_metadata.offset()
                );
            }
        }
        state.update_follower_state(
            current_time_ms,
            fetch_offset_metadata,
            leader_end_offset.as_ref(),
        );
        let state_key = state.replica_key().clone();
        self.update_check_quorum_for_following_voter(replica_key, current_time_ms)?;

        Ok(self.is_voter(&state_key) && self.maybe_update_high_watermark())
    }

    /// Voters other than the leader, best replicated first. Used to pick a
    /// preferred successor on resignation.
    pub fn non_leader_voters_by_descending_fetch_offset(&self) -> Vec<ReplicaKey> {
        self.followers_by_descending_fetch_offset()
            .into_iter()
            .filter(|state| !state.matches_key(&self.local_replica_key))
            .map(|state| state.replica_key().clone())
            .collect()
    }

    fn followers_by_descending_fetch_offset(&self) -> Vec<&ReplicaState> {
        let mut states: Vec<&ReplicaState> = self.voter_states.values().collect();
        states.sort_by(|left, right| compare_by_descending_fetch_offset(left, right));
        states
    }

    /// Mark a voter as having acknowledged the leader via a
    /// BeginQuorumEpoch response.
    pub fn add_acknowledgement_from(
        &mut self,
        remote_node_id: i32,
    ) -> Result<()> {
        let state = self
            .voter_states
            .get_mut(&remote_node_id)
            .ok_or(QuorumError::AcknowledgementFromNonVoter(remote_node_id))?;
        state.has_acknowledged_leader = true;
        Ok(())
    }

    fn get_or_create_replica_state(
        &mut self,
        replica_key: ReplicaKey,
    ) -> &mut ReplicaState {
        if let Some(state) = self.voter_states.get_mut(&replica_key.id()) {
            if state.matches_key(&replica_key) {
                return state;
            }
        }
        self.observer_states
            .entry(replica_key.clone())
            .or_insert_with(|| ReplicaState::new(replica_key, false))
    }

    /// Snapshot of the replication state for monitoring. Inactive observers
    /// are dropped first.
    pub fn describe_quorum(
        &mut self,
        current_time_ms: i64,
    ) -> QuorumInfo {
        self.clear_inactive_observers(current_time_ms);

        QuorumInfo {
            error_code: 0,
            leader_id: self.local_replica_key.id(),
            leader_epoch: self.epoch,
            high_watermark: self
                .high_watermark
                .as_ref()
                .map_or(-1, |high_watermark| high_watermark.offset() as i64),
            current_voters: self.describe_replica_states(self.voter_states.values(), current_time_ms),
            observers: self.describe_replica_states(self.observer_states.values(), current_time_ms),
        }
    }

    /// Node listing companion to `describe_quorum`.
    pub fn nodes(
        &mut self,
        current_time_ms: i64,
    ) -> Vec<NodeInfo> {
        self.clear_inactive_observers(current_time_ms);

        // TODO: include the voter listeners in the node listing
        Vec::new()
    }

    fn describe_replica_states<'a>(
        &self,
        states: impl Iterator<Item = &'a ReplicaState>,
        current_time_ms: i64,
    ) -> Vec<ReplicaInfo> {
        let mut described: Vec<ReplicaInfo> = states
            .map(|state| self.describe_replica_state(state, current_time_ms))
            .collect();
        described.sort_by_key(|info| info.replica_id);
        described
    }

    fn describe_replica_state(
        &self,
        state: &ReplicaState,
        current_time_ms: i64,
    ) -> ReplicaInfo {
        // The leader is trivially fetching from and caught up to itself.
        let (last_caught_up_timestamp, last_fetch_timestamp) =
            if state.matches_key(&self.local_replica_key) {
                (current_time_ms, current_time_ms)
            } else {
                (state.last_caught_up_timestamp(), state.last_fetch_timestamp())
            };

        ReplicaInfo {
            replica_id: state.replica_key().id(),
            log_end_offset: state
                .end_offset()
                .map_or(-1, |end_offset| end_offset.offset() as i64),
            last_caught_up_timestamp,
            last_fetch_timestamp,
        }
    }

    /// Drop observer states that have been silent for a while. The local
    /// replica's own observer entry is never evicted.
    fn clear_inactive_observers(
        &mut self,
        current_time_ms: i64,
    ) {
        let local_replica_key = self.local_replica_key.clone();
        self.observer_states.retain(|replica_key, state| {
            current_time_ms - state.last_fetch_timestamp() < OBSERVER_SESSION_TIMEOUT_MS
                || *replica_key == local_replica_key
        });
    }

    fn is_voter(
        &self,
        remote_replica_key: &ReplicaKey,
    ) -> bool {
        self.voter_states
            .get(&remote_replica_key.id())
            .is_some_and(|state| state.matches_key(remote_replica_key))
    }

    fn update_voter_and_observer_states(
        &mut self,
        last_voter_set: &VoterSet,
    ) -> Result<()> {
        let mut old_voter_states = std::mem::take(&mut self.voter_states);
        let mut new_voter_states = HashMap::with_capacity(last_voter_set.len());

        // Compute the new voter states map, reusing any state already
        // tracked for the voter whether it was a voter or an observer.
        for voter_node in last_voter_set.voter_nodes() {
            let voter_key = voter_node.voter_key();
            let prior_voter = old_voter_states.remove(&voter_key.id());
            let prior_observer = self.observer_states.remove(voter_key);
            let mut state = prior_voter
                .filter(|state| state.matches_key(voter_key))
                .or(prior_observer)
                .unwrap_or_else(|| ReplicaState::new(voter_key.clone(), false));

            // Make sure the replica key in the replica state matches the
            // voter's.
            state.set_replica_key(voter_key.clone())?;
            new_voter_states.insert(voter_key.id(), state);
        }
        self.voter_states = new_voter_states;

        // Demote the remaining old voters to observers, without overwriting
        // any observer entry already tracked for the same key.
        for (_, state) in old_voter_states {
            self.observer_states
                .entry(state.replica_key().clone())
                .or_insert(state);
        }

        // A demoted voter no longer counts toward check-quorum.
        self.fetched_voters.retain(|id| self.voter_states.contains_key(id));
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn voter_states(&self) -> &HashMap<i32, ReplicaState> {
        &self.voter_states
    }

    #[cfg(test)]
    pub(super) fn observer_states(&self) -> &HashMap<ReplicaKey, ReplicaState> {
        &self.observer_states
    }

    #[cfg(test)]
    pub(super) fn fetched_voters(&self) -> &HashSet<i32> {
        &self.fetched_voters
    }
}

impl<T> EpochState for LeaderState<T> {
    fn election(&self) -> ElectionState {
        LeaderState::election(self)
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn leader_endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn high_watermark(&self) -> Option<&LogOffsetMetadata> {
        self.high_watermark.as_ref()
    }

    fn can_grant_vote(
        &self,
        candidate_key: &ReplicaKey,
        _is_log_up_to_date: bool,
    ) -> bool {
        // Still the leader of this epoch; never grant.
        debug!(
            "Rejecting vote request from candidate ({}) since we are already leader in epoch {}",
            candidate_key, self.epoch
        );
        false
    }

    fn name(&self) -> &'static str {
        "Leader"
    }

    fn close(&mut self) {
        self.accumulator.close();
    }
}

impl<T> fmt::Debug for LeaderState<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "Leader(local_replica_key={}, epoch={}, epoch_start_offset={}, high_watermark={:?}, voter_states={:?})",
            self.local_replica_key,
            self.epoch,
            self.epoch_start_offset,
            self.high_watermark,
            self.voter_states
        )
    }
}
