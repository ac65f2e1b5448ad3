//! Externally visible snapshot of the leader's replication state, produced
//! for monitoring via the describe-quorum read-out.

use serde::Serialize;

/// Replication progress of a single voter or observer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplicaInfo {
    pub replica_id: i32,
    /// Last known log end offset, or -1 if the replica has never reported one.
    pub log_end_offset: i64,
    pub last_caught_up_timestamp: i64,
    pub last_fetch_timestamp: i64,
}

/// Point-in-time view of the quorum as seen by the leader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuorumInfo {
    /// 0 when the read-out succeeded; reserved for transport-level use.
    pub error_code: i16,
    pub leader_id: i32,
    pub leader_epoch: u64,
    /// Current high watermark, or -1 while unestablished.
    pub high_watermark: i64,
    pub current_voters: Vec<ReplicaInfo>,
    pub observers: Vec<ReplicaInfo>,
}

/// Node listing companion to [`QuorumInfo`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub node_id: i32,
    pub listeners: Vec<(String, String)>,
}
