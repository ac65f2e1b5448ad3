use std::fmt;

use uuid::Uuid;

/// Identity of a replica: a node id plus an optional storage-directory id.
///
/// The directory id distinguishes storage instances behind the same node id
/// (a reformatted disk produces a fresh directory id). A negative node id
/// identifies a non-replica reader such as a consumer; those never carry
/// replication state.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaKey {
    id: i32,
    directory_id: Option<Uuid>,
}

impl ReplicaKey {
    pub fn new(
        id: i32,
        directory_id: Option<Uuid>,
    ) -> Self {
        Self { id, directory_id }
    }

    pub fn of(id: i32) -> Self {
        Self {
            id,
            directory_id: None,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn directory_id(&self) -> Option<Uuid> {
        self.directory_id
    }

    /// Whether `other` names the same replica as far as this key can tell.
    ///
    /// Ids must be equal. A holder without a directory id matches any
    /// directory id; once a directory id is known, both must be present and
    /// equal.
    pub fn matches(
        &self,
        other: &ReplicaKey,
    ) -> bool {
        if self.id != other.id {
            return false;
        }
        match self.directory_id {
            None => true,
            Some(directory_id) => other.directory_id == Some(directory_id),
        }
    }
}

impl fmt::Debug for ReplicaKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.directory_id {
            Some(directory_id) => write!(f, "{}:{}", self.id, directory_id),
            None => write!(f, "{}:<undefined>", self.id),
        }
    }
}

impl fmt::Display for ReplicaKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
