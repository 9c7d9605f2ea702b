//! Value types shared by the codec and the protocol engine.

use serde::{Deserialize, Serialize};

mod bridge_id;
pub use bridge_id::BridgeId;

mod port_id;
pub use port_id::PortId;

mod priority_vector;
pub use priority_vector::{PriorityVector, Times};

mod mst_config;
pub use mst_config::{
    MstConfigId, VlanTable, MST_CONFIG_DIGEST_KEY, MST_CONFIG_ID_LEN, MST_CONFIG_NAME_LEN,
    VLAN_TABLE_LEN,
};

/// Index of the CIST among a bridge's trees. MSTI `n` has index `n`.
pub const CIST: usize = 0;

/// The protocol a bridge runs, as set by ForceProtocolVersion.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// 802.1D legacy STP: Config and TCN BPDUs only.
    Stp = 0,
    /// Rapid spanning tree: RST BPDUs.
    Rstp = 2,
    /// Multiple spanning tree: MST BPDUs.
    Mstp = 3,
}

impl ProtocolVersion {
    /// Converts to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stp => "stp",
            Self::Rstp => "rstp",
            Self::Mstp => "mstp",
        }
    }
}

/// The role of a port for one tree.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PortRole {
    /// The port takes no part in the tree.
    #[default]
    Disabled,
    /// Best path towards the root.
    Root,
    /// Designated for the attached LAN.
    Designated,
    /// Backup path towards the root through another bridge.
    Alternate,
    /// Backup for a designated port of this bridge on the same LAN.
    Backup,
    /// MSTI role of a region boundary port that is the CIST root port.
    Master,
}

impl PortRole {
    /// Converts to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Root => "root",
            Self::Designated => "designated",
            Self::Alternate => "alternate",
            Self::Backup => "backup",
            Self::Master => "master",
        }
    }
}

/// The forwarding state of a port for one tree.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PortState {
    /// Frames are neither learned from nor forwarded.
    Discarding,
    /// Source addresses are learned, frames are not forwarded.
    Learning,
    /// Frames are learned and forwarded.
    Forwarding,
}

/// Origin of the port priority vector held for a port-tree.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum InfoIs {
    /// The port is disabled.
    #[default]
    Disabled,
    /// Received information timed out or has just been cleared.
    Aged,
    /// The information was computed by this bridge.
    Mine,
    /// The information came from the designated bridge on the LAN.
    Received,
}

/// Classification of a received message against the stored information.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum RcvdInfo {
    /// A designated message superior to what the port holds.
    SuperiorDesignated,
    /// A designated message repeating what the port holds.
    RepeatedDesignated,
    /// A designated message worse than what the port holds.
    InferiorDesignated,
    /// A root, alternate or backup message no better than what the port holds.
    InferiorRootAlternate,
    /// Anything else.
    #[default]
    Other,
}

/// Administrative point-to-point setting of a port.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum AdminP2p {
    /// The link is point-to-point.
    ForceTrue,
    /// The link is shared.
    ForceFalse,
    /// Use what the host detected.
    #[default]
    Auto,
}

/// Recommended external port path cost for a link speed (802.1Q Table 13-4).
///
/// A speed of zero yields the highest cost.
pub fn path_cost_for_speed(speed_mbps: u32) -> u32 {
    if speed_mbps == 0 {
        return MAX_PATH_COST;
    }
    (20_000_000 / speed_mbps).clamp(1, MAX_PATH_COST)
}

/// Largest legal port path cost.
pub const MAX_PATH_COST: u32 = 200_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_path_costs() {
        assert_eq!(path_cost_for_speed(10), 2_000_000);
        assert_eq!(path_cost_for_speed(100), 200_000);
        assert_eq!(path_cost_for_speed(1_000), 20_000);
        assert_eq!(path_cost_for_speed(10_000), 2_000);
        assert_eq!(path_cost_for_speed(100_000_000), 1);
        assert_eq!(path_cost_for_speed(0), MAX_PATH_COST);
    }

    #[test]
    fn names() {
        assert_eq!(PortRole::Alternate.as_str(), "alternate");
        assert_eq!(ProtocolVersion::Mstp.as_str(), "mstp");
        assert!(ProtocolVersion::Stp < ProtocolVersion::Rstp);
    }
}
