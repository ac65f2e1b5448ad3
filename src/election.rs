use std::collections::BTreeSet;

/// Snapshot of the election outcome the current epoch state stands on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionState {
    epoch: u64,
    leader_id: Option<i32>,
    voters: BTreeSet<i32>,
}

impl ElectionState {
    pub fn with_elected_leader(
        epoch: u64,
        leader_id: i32,
        voters: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            epoch,
            leader_id: Some(leader_id),
            voters: voters.into_iter().collect(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn leader_id(&self) -> Option<i32> {
        self.leader_id
    }

    pub fn voters(&self) -> &BTreeSet<i32> {
        &self.voters
    }
}
