use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use crate::records::VoterEndpoint;
use crate::records::VoterEntry;
use crate::records::VotersRecord;
use crate::ReplicaKey;

/// Advertised listener addresses of a node, keyed by listener name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    listeners: HashMap<String, String>,
}

impl Endpoints {
    pub fn new(listeners: HashMap<String, String>) -> Self {
        Self { listeners }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn address(
        &self,
        listener: &str,
    ) -> Option<&str> {
        self.listeners.get(listener).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.listeners.iter().map(|(name, address)| (name.as_str(), address.as_str()))
    }
}

impl fmt::Debug for Endpoints {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_map().entries(self.listeners.iter()).finish()
    }
}

/// One member of a voter set: its replica identity plus where to reach it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterNode {
    voter_key: ReplicaKey,
    endpoints: Endpoints,
}

impl VoterNode {
    pub fn new(
        voter_key: ReplicaKey,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            voter_key,
            endpoints,
        }
    }

    pub fn voter_key(&self) -> &ReplicaKey {
        &self.voter_key
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Whether `replica_key` identifies this voter.
    pub fn is_voter(
        &self,
        replica_key: &ReplicaKey,
    ) -> bool {
        self.voter_key.matches(replica_key)
    }
}

/// The set of replicas that participate in quorum decisions.
///
/// Within a voter set a replica is identified by id; the directory id on the
/// voter key is refinement metadata carried along for key matching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoterSet {
    voters: BTreeMap<i32, VoterNode>,
}

impl VoterSet {
    pub fn new(nodes: impl IntoIterator<Item = VoterNode>) -> Self {
        Self {
            voters: nodes
                .into_iter()
                .map(|node| (node.voter_key().id(), node))
                .collect(),
        }
    }

    /// Voter set with bare ids and no advertised endpoints.
    pub fn from_ids(ids: impl IntoIterator<Item = i32>) -> Self {
        Self::new(
            ids.into_iter()
                .map(|id| VoterNode::new(ReplicaKey::of(id), Endpoints::empty())),
        )
    }

    pub fn voter_nodes(&self) -> impl Iterator<Item = &VoterNode> {
        self.voters.values()
    }

    pub fn voter_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.voters.keys().copied()
    }

    pub fn contains_id(
        &self,
        id: i32,
    ) -> bool {
        self.voters.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Render this set as the control-record payload replicated through the
    /// log when membership must be re-broadcast.
    pub fn to_voters_record(
        &self,
        version: i16,
    ) -> VotersRecord {
        VotersRecord {
            version,
            voters: self
                .voter_nodes()
                .map(|node| {
                    let mut endpoints: Vec<VoterEndpoint> = node
                        .endpoints()
                        .iter()
                        .map(|(name, address)| VoterEndpoint {
                            name: name.to_string(),
                            address: address.to_string(),
                        })
                        .collect();
                    endpoints.sort_by(|a, b| a.name.cmp(&b.name));
                    VoterEntry {
                        voter_id: node.voter_key().id(),
                        voter_directory_id: node.voter_key().directory_id(),
                        endpoints,
                    }
                })
                .collect(),
        }
    }
}
