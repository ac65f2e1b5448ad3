use std::collections::HashMap;
use std::collections::HashSet;

use bytes::Bytes;
use tracing_test::traced_test;
use uuid::Uuid;

use crate::raft_role::role_state::EpochState;
use crate::BatchAccumulator;
use crate::BatchError;
use crate::CompletedBatch;
use crate::ConsensusError;
use crate::ControlRecord;
use crate::Endpoints;
use crate::Error;
use crate::KRaftVersion;
use crate::LeaderState;
use crate::LogOffsetMetadata;
use crate::MembershipError;
use crate::QuorumConfig;
use crate::QuorumError;
use crate::ReplicaKey;
use crate::VoterNode;
use crate::VoterSet;

const FETCH_TIMEOUT_MS: u64 = 2_000;
const CHECK_QUORUM_TIMEOUT_MS: u64 = 3_000;
const EPOCH: u64 = 5;
const EPOCH_START_OFFSET: u64 = 10;

fn offset(value: u64) -> LogOffsetMetadata {
    LogOffsetMetadata::without_metadata(value)
}

fn offset_in_segment(
    value: u64,
    segment: &'static [u8],
) -> LogOffsetMetadata {
    LogOffsetMetadata::new(value, Some(Bytes::from_static(segment)))
}

fn voters(ids: &[i32]) -> VoterSet {
    VoterSet::from_ids(ids.iter().copied())
}

fn listener(address: &str) -> Endpoints {
    Endpoints::new(HashMap::from([(
        "controller".to_string(),
        address.to_string(),
    )]))
}

fn new_leader(
    local_id: i32,
    voter_ids: &[i32],
) -> LeaderState<String> {
    new_leader_with(local_id, voters(voter_ids), None, KRaftVersion::V1)
}

fn new_leader_with(
    local_id: i32,
    voter_set: VoterSet,
    offset_of_voters_at_epoch_start: Option<i64>,
    kraft_version: KRaftVersion,
) -> LeaderState<String> {
    let config = QuorumConfig {
        fetch_timeout_ms: FETCH_TIMEOUT_MS,
        ..QuorumConfig::default()
    };
    let granting_voters: HashSet<i32> = voter_set.voter_ids().collect();
    LeaderState::new(
        0,
        ReplicaKey::of(local_id),
        EPOCH,
        EPOCH_START_OFFSET,
        voter_set,
        offset_of_voters_at_epoch_start,
        kraft_version,
        granting_voters,
        BatchAccumulator::new(EPOCH, EPOCH_START_OFFSET, 16, 0),
        Endpoints::empty(),
        &config,
    )
}

/// Test: the leader's own voter entry starts acknowledged, the rest do not
#[test]
fn test_constructor_seeds_acknowledgement_for_local_voter() {
    let state = new_leader(1, &[1, 2, 3]);

    assert!(state.voter_states()[&1].has_acknowledged_leader());
    assert!(!state.voter_states()[&2].has_acknowledged_leader());
    assert!(!state.voter_states()[&3].has_acknowledged_leader());

    let non_acknowledging = state.non_acknowledging_voters();
    assert_eq!(
        non_acknowledging,
        HashSet::from([ReplicaKey::of(2), ReplicaKey::of(3)])
    );
}

/// Test: high watermark advancement with three voters past the epoch start
#[test]
fn test_high_watermark_advances_with_majority() {
    let mut state = new_leader(1, &[1, 2, 3]);

    // Only the leader has an end offset; no majority yet.
    assert!(!state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap());
    assert_eq!(state.high_watermark(), None);

    // Voter 2 at 12: two of three voters carry 12 which is past the epoch
    // start, so the high watermark is established there.
    assert!(state.update_replica_state(&ReplicaKey::of(2), 100, offset(12)).unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(12));

    // Voter 3 at 11 does not move the majority offset.
    assert!(!state.update_replica_state(&ReplicaKey::of(3), 200, offset(11)).unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(12));

    // Voter 2 catches up to the leader; majority now carries 15.
    assert!(state.update_replica_state(&ReplicaKey::of(2), 300, offset(15)).unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(15));
}

/// Test: no commitment until one offset of the current epoch is replicated
#[test]
fn test_high_watermark_blocked_by_epoch_start_offset() {
    let mut state = new_leader(1, &[1, 2, 3]);

    assert!(!state.update_local_state(offset(10), &voters(&[1, 2, 3])).unwrap());
    assert!(!state.update_replica_state(&ReplicaKey::of(2), 100, offset(10)).unwrap());
    assert!(!state.update_replica_state(&ReplicaKey::of(3), 200, offset(10)).unwrap());

    assert_eq!(state.high_watermark(), None);
}

/// Test: an equal offset with different position metadata is observable
#[test]
fn test_high_watermark_advances_on_metadata_change() {
    let mut state = new_leader(1, &[1]);

    assert!(state
        .update_local_state(offset_in_segment(15, b"segment-a"), &voters(&[1]))
        .unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(15));

    // Same logical offset, physically distinct position.
    assert!(state
        .update_local_state(offset_in_segment(15, b"segment-b"), &voters(&[1]))
        .unwrap());
    assert_eq!(
        state.high_watermark().and_then(|hw| hw.metadata().cloned()),
        Some(Bytes::from_static(b"segment-b"))
    );

    // Identical position is a no-op.
    assert!(!state
        .update_local_state(offset_in_segment(15, b"segment-b"), &voters(&[1]))
        .unwrap());
}

/// Test: a smaller computed high watermark is logged and discarded
#[traced_test]
#[test]
fn test_high_watermark_never_retreats() {
    let mut state = new_leader(1, &[1, 2, 3]);

    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    assert!(state.update_replica_state(&ReplicaKey::of(2), 100, offset(15)).unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(15));

    // Voter 2 is replaced by a fresh voter 4; the majority offset drops.
    state.update_local_state(offset(15), &voters(&[1, 3, 4])).unwrap();
    assert!(!state.update_replica_state(&ReplicaKey::of(3), 200, offset(11)).unwrap());

    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(15));
    assert!(logs_contain("smaller than the current value"));
}

/// Test: quorum arithmetic when the leader is not a voter itself
#[test]
fn test_high_watermark_with_leader_outside_voter_set() {
    let mut state = new_leader_with(1, voters(&[2, 3]), None, KRaftVersion::V1);

    state.update_local_state(offset(20), &voters(&[2, 3])).unwrap();
    assert!(!state.update_replica_state(&ReplicaKey::of(2), 100, offset(15)).unwrap());

    // Both voters must carry the offset; the leader's own log does not count.
    assert!(state.update_replica_state(&ReplicaKey::of(3), 200, offset(15)).unwrap());
    assert_eq!(state.high_watermark().map(|hw| hw.offset()), Some(15));
}

/// Test: non-monotonic local end offset update is a state error
#[test]
fn test_non_monotonic_local_update_rejected() {
    let mut state = new_leader(1, &[1, 2, 3]);

    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    let result = state.update_local_state(offset(14), &voters(&[1, 2, 3]));

    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Quorum(
            QuorumError::NonMonotonicLocalEndOffset {
                current: 15,
                proposed: 14,
            }
        )))
    ));
}

/// Test: a follower fetch offset regression is logged but tolerated
#[traced_test]
#[test]
fn test_follower_fetch_regression_logged_not_raised() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();

    state.update_replica_state(&ReplicaKey::of(2), 100, offset(12)).unwrap();
    state.update_replica_state(&ReplicaKey::of(2), 200, offset(8)).unwrap();

    assert!(logs_contain("non-monotonic update of fetch offset"));
    assert_eq!(
        state.voter_states()[&2].end_offset().map(|end| end.offset()),
        Some(8)
    );
}

/// Test: fetches from a negative replica id are ignored entirely
#[test]
fn test_fetch_from_non_replica_id_is_noop() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();

    assert!(!state.update_replica_state(&ReplicaKey::of(-1), 100, offset(12)).unwrap());
    assert!(state.observer_states().is_empty());
    assert!(state.fetched_voters().is_empty());
}

/// Test: a fetch carrying the leader's own id is a state error
#[test]
fn test_fetch_from_local_id_rejected() {
    let mut state = new_leader(1, &[1, 2, 3]);

    let result = state.update_replica_state(&ReplicaKey::of(1), 100, offset(12));
    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Quorum(
            QuorumError::LocalReplicaIdCollision(_)
        )))
    ));
}

/// Test: caught-up time is the previous fetch time once the follower reaches
/// the leader's end offset as of that previous fetch
#[test]
fn test_last_caught_up_time_uses_previous_fetch() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();

    // First fetch: behind, nothing caught up yet.
    state.update_replica_state(&ReplicaKey::of(2), 1_000, offset(10)).unwrap();
    assert_eq!(state.voter_states()[&2].last_caught_up_timestamp(), -1);

    state.update_local_state(offset(20), &voters(&[1, 2, 3])).unwrap();

    // Second fetch reaches 15, the leader's end offset at the first fetch:
    // the follower was caught up as of that first fetch.
    state.update_replica_state(&ReplicaKey::of(2), 2_000, offset(15)).unwrap();
    assert_eq!(state.voter_states()[&2].last_caught_up_timestamp(), 1_000);
    assert_eq!(state.voter_states()[&2].last_fetch_timestamp(), 2_000);

    // Catching up to the live end offset stamps the current time.
    state.update_replica_state(&ReplicaKey::of(2), 3_000, offset(20)).unwrap();
    assert_eq!(state.voter_states()[&2].last_caught_up_timestamp(), 3_000);
}

/// Test: singleton voter set never loses quorum
#[test]
fn test_check_quorum_single_voter_never_expires() {
    let mut state = new_leader(1, &[1]);

    assert_eq!(state.time_until_check_quorum_expires(0), u64::MAX);
    assert_eq!(state.time_until_check_quorum_expires(10_000_000), u64::MAX);
}

/// Test: majority accounting resets the check-quorum timer, counting the
/// leader implicitly
#[test]
fn test_check_quorum_majority_with_leader_in_voter_set() {
    let mut state = new_leader(1, &[1, 2, 3, 4, 5]);

    assert_eq!(state.time_until_check_quorum_expires(0), CHECK_QUORUM_TIMEOUT_MS);
    assert_eq!(state.time_until_check_quorum_expires(1_000), CHECK_QUORUM_TIMEOUT_MS - 1_000);

    // Majority is 3, minus the implicitly counted leader.
    state
        .update_check_quorum_for_following_voter(&ReplicaKey::of(2), 1_000)
        .unwrap();
    assert_eq!(state.fetched_voters(), &HashSet::from([2]));

    state
        .update_check_quorum_for_following_voter(&ReplicaKey::of(3), 1_000)
        .unwrap();
    assert!(state.fetched_voters().is_empty());
    assert_eq!(state.time_until_check_quorum_expires(1_000), CHECK_QUORUM_TIMEOUT_MS);
}

/// Test: without the leader in the voter set the majority is fetched voters
/// alone
#[test]
fn test_check_quorum_majority_with_leader_outside_voter_set() {
    let mut state = new_leader_with(1, voters(&[2, 3]), None, KRaftVersion::V1);

    state
        .update_check_quorum_for_following_voter(&ReplicaKey::of(2), 500)
        .unwrap();
    assert_eq!(state.fetched_voters(), &HashSet::from([2]));

    state
        .update_check_quorum_for_following_voter(&ReplicaKey::of(3), 500)
        .unwrap();
    assert!(state.fetched_voters().is_empty());
}

/// Test: check-quorum expiry is reported once the window elapses
#[traced_test]
#[test]
fn test_check_quorum_expires_without_fetches() {
    let mut state = new_leader(1, &[1, 2, 3]);

    assert_eq!(state.time_until_check_quorum_expires(CHECK_QUORUM_TIMEOUT_MS as i64), 0);
    assert!(logs_contain("Did not receive fetch request from the majority"));
}

/// Test: a fetch from the leader's own key fails check-quorum accounting
#[test]
fn test_check_quorum_rejects_local_fetch() {
    let mut state = new_leader(1, &[1, 2, 3]);

    let result = state.update_check_quorum_for_following_voter(&ReplicaKey::of(1), 100);
    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Quorum(
            QuorumError::FetchFromLocalReplica(1)
        )))
    ));
    assert!(state.fetched_voters().is_empty());
}

/// Test: observer fetches never count toward check-quorum
#[test]
fn test_check_quorum_ignores_observers() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();

    state.update_replica_state(&ReplicaKey::of(9), 100, offset(12)).unwrap();
    assert!(state.fetched_voters().is_empty());
}

/// Test: begin-quorum timer starts expired and paces at half the fetch
/// timeout after a reset
#[test]
fn test_begin_quorum_epoch_timer_pacing() {
    let mut state = new_leader(1, &[1, 2, 3]);

    assert_eq!(state.time_until_begin_quorum_epoch_timer_expires(0), 0);

    state.reset_begin_quorum_epoch_timer(0);
    assert_eq!(
        state.time_until_begin_quorum_epoch_timer_expires(0),
        FETCH_TIMEOUT_MS / 2
    );
    assert_eq!(
        state.time_until_begin_quorum_epoch_timer_expires(400),
        FETCH_TIMEOUT_MS / 2 - 400
    );
    assert_eq!(
        state.time_until_begin_quorum_epoch_timer_expires(FETCH_TIMEOUT_MS as i64),
        0
    );
}

/// Test: acknowledgement bookkeeping for BeginQuorumEpoch responses
#[test]
fn test_add_acknowledgement() {
    let mut state = new_leader(1, &[1, 2, 3]);

    state.add_acknowledgement_from(2).unwrap();
    assert_eq!(state.non_acknowledging_voters(), HashSet::from([ReplicaKey::of(3)]));

    // A fetch acknowledges implicitly.
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    state.update_replica_state(&ReplicaKey::of(3), 100, offset(12)).unwrap();
    assert!(state.non_acknowledging_voters().is_empty());

    let result = state.add_acknowledgement_from(9);
    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Quorum(
            QuorumError::AcknowledgementFromNonVoter(9)
        )))
    ));
}

/// Test: voter demotion to observer on reconfiguration
#[test]
fn test_voter_demoted_to_observer() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    state.update_replica_state(&ReplicaKey::of(3), 100, offset(12)).unwrap();

    state.update_local_state(offset(16), &voters(&[1, 2, 4])).unwrap();

    let voter_ids: HashSet<i32> = state.voter_states().keys().copied().collect();
    assert_eq!(voter_ids, HashSet::from([1, 2, 4]));

    // Voter 3's progress moved into the observer map under its full key.
    let demoted = &state.observer_states()[&ReplicaKey::of(3)];
    assert_eq!(demoted.end_offset().map(|end| end.offset()), Some(12));

    // Voter 4 starts fresh and unacknowledged.
    assert!(!state.voter_states()[&4].has_acknowledged_leader());
    assert_eq!(state.voter_states()[&4].end_offset(), None);
}

/// Test: a demoted voter stops counting toward check-quorum
#[test]
fn test_demotion_prunes_fetched_voters() {
    let mut state = new_leader(1, &[1, 2, 3, 4, 5]);
    state
        .update_check_quorum_for_following_voter(&ReplicaKey::of(3), 100)
        .unwrap();
    assert_eq!(state.fetched_voters(), &HashSet::from([3]));

    state.update_local_state(offset(15), &voters(&[1, 2, 4, 5])).unwrap();
    assert!(state.fetched_voters().is_empty());
}

/// Test: a demoted voter keeps its acknowledgement when promoted back
#[test]
fn test_repromoted_voter_keeps_acknowledgement() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    state.update_replica_state(&ReplicaKey::of(2), 100, offset(12)).unwrap();
    assert!(state.voter_states()[&2].has_acknowledged_leader());

    state.update_local_state(offset(16), &voters(&[1, 3])).unwrap();
    state.update_local_state(offset(17), &voters(&[1, 2, 3])).unwrap();

    let repromoted = &state.voter_states()[&2];
    assert!(repromoted.has_acknowledged_leader());
    assert_eq!(repromoted.end_offset().map(|end| end.offset()), Some(12));
}

/// Test: applying a voter set with directory ids refines the stored keys
#[test]
fn test_voter_set_refines_replica_keys() {
    let mut state = new_leader(1, &[1, 2]);

    let directory_id = Uuid::new_v4();
    let refined = VoterSet::new([
        VoterNode::new(ReplicaKey::of(1), Endpoints::empty()),
        VoterNode::new(ReplicaKey::new(2, Some(directory_id)), Endpoints::empty()),
    ]);
    state.update_local_state(offset(15), &refined).unwrap();

    assert_eq!(
        state.voter_states()[&2].replica_key(),
        &ReplicaKey::new(2, Some(directory_id))
    );

    // A fetch with a different directory id no longer matches the voter slot
    // and lands in the observer map.
    let other_directory = ReplicaKey::new(2, Some(Uuid::new_v4()));
    assert!(!state.update_replica_state(&other_directory, 100, offset(12)).unwrap());
    assert!(state.observer_states().contains_key(&other_directory));
    assert_eq!(state.voter_states()[&2].end_offset(), None);
}

/// Test: inactive observers are collected, the local entry never is
#[test]
fn test_describe_quorum_clears_inactive_observers() {
    let mut state = new_leader_with(1, voters(&[2, 3]), None, KRaftVersion::V1);

    // The fetch path creates the leader's own observer entry as a side
    // effect, plus one for the remote observer.
    state.update_replica_state(&ReplicaKey::of(9), 0, offset(12)).unwrap();
    assert!(state.observer_states().contains_key(&ReplicaKey::of(1)));
    assert!(state.observer_states().contains_key(&ReplicaKey::of(9)));

    let info = state.describe_quorum(300_001);

    let observer_ids: Vec<i32> = info.observers.iter().map(|o| o.replica_id).collect();
    assert_eq!(observer_ids, vec![1]);
    assert!(!state.observer_states().contains_key(&ReplicaKey::of(9)));
    assert!(state.observer_states().contains_key(&ReplicaKey::of(1)));
}

/// Test: describe-quorum substitutes the current time for the leader's own
/// timestamps
#[test]
fn test_describe_quorum_snapshot() {
    let mut state = new_leader(1, &[1, 2, 3]);
    state.update_local_state(offset(15), &voters(&[1, 2, 3])).unwrap();
    state.update_replica_state(&ReplicaKey::of(2), 100, offset(15)).unwrap();

    let info = state.describe_quorum(1_000);

    assert_eq!(info.error_code, 0);
    assert_eq!(info.leader_id, 1);
    assert_eq!(info.leader_epoch, EPOCH);
    assert_eq!(info.high_watermark, 15);

    assert_eq!(info.current_voters.len(), 3);
    let leader_entry = &info.current_voters[0];
    assert_eq!(leader_entry.replica_id, 1);
    assert_eq!(leader_entry.log_end_offset, 15);
    assert_eq!(leader_entry.last_fetch_timestamp, 1_000);
    assert_eq!(leader_entry.last_caught_up_timestamp, 1_000);

    let follower_entry = &info.current_voters[1];
    assert_eq!(follower_entry.replica_id, 2);
    assert_eq!(follower_entry.log_end_offset, 15);
    assert_eq!(follower_entry.last_fetch_timestamp, 100);

    // Voter 3 has never fetched.
    let silent_entry = &info.current_voters[2];
    assert_eq!(silent_entry.log_end_offset, -1);
    assert_eq!(silent_entry.last_fetch_timestamp, -1);
}

/// Test: high watermark reports -1 until established
#[test]
fn test_describe_quorum_before_commitment() {
    let mut state = new_leader(1, &[1, 2, 3]);

    let info = state.describe_quorum(1_000);
    assert_eq!(info.high_watermark, -1);
}

/// Test: non-leader voters ordered by descending fetch offset
#[test]
fn test_non_leader_voters_by_descending_fetch_offset() {
    let mut state = new_leader(1, &[1, 2, 3, 4]);
    state.update_local_state(offset(20), &voters(&[1, 2, 3, 4])).unwrap();
    state.update_replica_state(&ReplicaKey::of(3), 100, offset(15)).unwrap();
    state.update_replica_state(&ReplicaKey::of(2), 200, offset(11)).unwrap();

    // Voter 4 has no reported offset and sorts last.
    assert_eq!(
        state.non_leader_voters_by_descending_fetch_offset(),
        vec![ReplicaKey::of(3), ReplicaKey::of(2), ReplicaKey::of(4)]
    );
}

/// Test: leader-change record carries the voters and granting voters
#[test]
fn test_append_leader_change_message() {
    let mut state = new_leader(1, &[1, 2, 3]);

    state.append_leader_change_message_and_bootstrap_records(500).unwrap();

    let batches = state.accumulator_mut().drain(500);
    assert_eq!(batches.len(), 1);
    match &batches[0] {
        CompletedBatch::Control {
            base_offset,
            append_time_ms,
            records,
        } => {
            assert_eq!(*base_offset, EPOCH_START_OFFSET);
            assert_eq!(*append_time_ms, 500);
            assert_eq!(records.len(), 1);
            match &records[0] {
                ControlRecord::LeaderChange(message) => {
                    assert_eq!(message.leader_id, 1);
                    let voter_ids: Vec<i32> =
                        message.voters.iter().map(|voter| voter.voter_id).collect();
                    assert_eq!(voter_ids, vec![1, 2, 3]);
                    let granting_ids: Vec<i32> = message
                        .granting_voters
                        .iter()
                        .map(|voter| voter.voter_id)
                        .collect();
                    assert_eq!(granting_ids, vec![1, 2, 3]);
                }
                other => panic!("unexpected control record: {other:?}"),
            }
        }
        other => panic!("unexpected batch: {other:?}"),
    }
}

/// Test: a bootstrap-checkpoint voter set is rewritten into the log with
/// its endpoints
#[test]
fn test_append_bootstrap_records_for_checkpoint_voters() {
    let voter_set = VoterSet::new([
        VoterNode::new(ReplicaKey::of(1), listener("host-1:9093")),
        VoterNode::new(ReplicaKey::of(2), listener("host-2:9093")),
        VoterNode::new(ReplicaKey::of(3), listener("host-3:9093")),
    ]);
    let mut state = new_leader_with(1, voter_set, Some(-1), KRaftVersion::V1);

    state.append_leader_change_message_and_bootstrap_records(500).unwrap();

    let batches = state.accumulator_mut().drain(500);
    assert_eq!(batches.len(), 1);
    match &batches[0] {
        CompletedBatch::Control { records, .. } => {
            assert_eq!(records.len(), 3);
            assert!(matches!(records[0], ControlRecord::LeaderChange(_)));
            match &records[1] {
                ControlRecord::KRaftVersion(record) => {
                    assert_eq!(record.kraft_version, KRaftVersion::V1.feature_level());
                }
                other => panic!("unexpected control record: {other:?}"),
            }
            match &records[2] {
                ControlRecord::Voters(record) => {
                    let ids: Vec<i32> =
                        record.voters.iter().map(|voter| voter.voter_id).collect();
                    assert_eq!(ids, vec![1, 2, 3]);

                    // The voters record carries the advertised endpoints.
                    let addresses: Vec<&str> = record
                        .voters
                        .iter()
                        .flat_map(|voter| {
                            voter.endpoints.iter().map(|endpoint| endpoint.address.as_str())
                        })
                        .collect();
                    assert_eq!(addresses, vec!["host-1:9093", "host-2:9093", "host-3:9093"]);
                    assert!(record
                        .voters
                        .iter()
                        .all(|voter| voter.endpoints[0].name == "controller"));
                }
                other => panic!("unexpected control record: {other:?}"),
            }
        }
        other => panic!("unexpected batch: {other:?}"),
    }
}

/// Test: voters from the log are not re-broadcast
#[test]
fn test_no_bootstrap_records_for_log_voters() {
    let mut state = new_leader_with(1, voters(&[1, 2, 3]), Some(42), KRaftVersion::V1);

    state.append_leader_change_message_and_bootstrap_records(500).unwrap();

    let batches = state.accumulator_mut().drain(500);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].record_count(), 1);
}

/// Test: bootstrap rewrite without reconfiguration support is illegal
#[test]
fn test_bootstrap_records_require_reconfig_support() {
    let mut state = new_leader_with(1, voters(&[1, 2, 3]), Some(-1), KRaftVersion::V0);

    let result = state.append_leader_change_message_and_bootstrap_records(500);
    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Membership(
            MembershipError::BootstrapRewriteUnsupported { offset: -1, .. }
        )))
    ));

    // Nothing was appended.
    assert!(state.accumulator_mut().drain(500).is_empty());
}

/// Test: a leader never grants a vote within its own epoch
#[test]
fn test_can_grant_vote_always_false() {
    let state = new_leader(1, &[1, 2, 3]);

    assert!(!state.can_grant_vote(&ReplicaKey::of(2), true));
    assert!(!state.can_grant_vote(&ReplicaKey::of(2), false));
    assert!(!state.can_grant_vote(&ReplicaKey::of(9), true));
}

/// Test: election snapshot and epoch identity accessors
#[test]
fn test_election_snapshot() {
    let state = new_leader(1, &[1, 2, 3]);

    let election = state.election();
    assert_eq!(election.epoch(), EPOCH);
    assert_eq!(election.leader_id(), Some(1));
    assert_eq!(election.voters().iter().copied().collect::<Vec<i32>>(), vec![1, 2, 3]);

    assert_eq!(state.epoch(), EPOCH);
    assert_eq!(state.epoch_start_offset(), EPOCH_START_OFFSET);
    assert_eq!(state.granting_voters(), &HashSet::from([1, 2, 3]));
    assert_eq!(state.name(), "Leader");
}

/// Test: resignation flag crosses threads through the state
#[test]
fn test_request_resign() {
    let state = new_leader(1, &[1, 2, 3]);

    assert!(!state.is_resign_requested());
    state.request_resign();
    assert!(state.is_resign_requested());
}

/// Test: close shuts the accumulator down
#[test]
fn test_close_closes_accumulator() {
    let mut state = new_leader(1, &[1, 2, 3]);

    state.close();
    assert!(state.accumulator().is_closed());

    let result = state.accumulator_mut().append(0, vec!["record".to_string()]);
    assert!(matches!(
        result,
        Err(Error::Consensus(ConsensusError::Batch(BatchError::AccumulatorClosed)))
    ));
}
