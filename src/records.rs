//! Control-record payloads appended through the batch accumulator.
//!
//! Byte-level encoding is owned by the log layer; these are the structured
//! payloads at their current schema versions.

use serde::Serialize;
use uuid::Uuid;

/// Current schema version of the leader-change control record.
pub const LEADER_CHANGE_CURRENT_VERSION: i16 = 0;
/// Current schema version of the protocol-version control record.
pub const KRAFT_VERSION_CURRENT_VERSION: i16 = 0;
/// Current schema version of the voters control record.
pub const KRAFT_VOTERS_CURRENT_VERSION: i16 = 0;

/// A voter reference inside a leader-change record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Voter {
    pub voter_id: i32,
}

/// Control record announcing the new leader of an epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderChangeMessage {
    pub version: i16,
    pub leader_id: i32,
    pub voters: Vec<Voter>,
    pub granting_voters: Vec<Voter>,
}

/// Control record pinning the protocol feature level in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KRaftVersionRecord {
    pub version: i16,
    pub kraft_version: i16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoterEndpoint {
    pub name: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoterEntry {
    pub voter_id: i32,
    pub voter_directory_id: Option<Uuid>,
    pub endpoints: Vec<VoterEndpoint>,
}

/// Control record replicating the canonical voter set through the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VotersRecord {
    pub version: i16,
    pub voters: Vec<VoterEntry>,
}

/// The control records a leader may append at epoch start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ControlRecord {
    LeaderChange(LeaderChangeMessage),
    KRaftVersion(KRaftVersionRecord),
    Voters(VotersRecord),
}
