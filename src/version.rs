use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Feature level of the quorum protocol recorded at epoch start.
///
/// Version 0 clusters carry their voter set in an out-of-band bootstrap
/// checkpoint and cannot change membership at runtime. Version 1 stores the
/// voter set in the log itself and supports reconfiguration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KRaftVersion {
    V0,
    V1,
}

impl KRaftVersion {
    pub fn feature_level(self) -> i16 {
        match self {
            KRaftVersion::V0 => 0,
            KRaftVersion::V1 => 1,
        }
    }

    /// Whether the voter set is log-managed and may change within an epoch.
    pub fn is_reconfig_supported(self) -> bool {
        matches!(self, KRaftVersion::V1)
    }
}

impl fmt::Display for KRaftVersion {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "KRaftVersion({})", self.feature_level())
    }
}
