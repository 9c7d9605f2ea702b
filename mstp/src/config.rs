//! Bridge and port configuration.
//!
//! A [`BridgeConfig`] fixes the shape of a bridge (port and MSTI counts) and
//! seeds every administrative parameter. Defaults follow IEEE 802.1Q Table
//! 13-5. Configurations serialize with serde, so hosts can keep them in any
//! format they like:
//!
//! ```rust
//! use mstp::config::BridgeConfig;
//! use mstp::ether::EtherAddr;
//!
//! let mut config = BridgeConfig::new(EtherAddr([0x02, 0, 0, 0, 0, 1]), 4);
//! config.msti_count = 2;
//! config.vlan_assignments = vec![(10, 1), (20, 2)];
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ether::EtherAddr;
use crate::types::{AdminP2p, ProtocolVersion, MAX_PATH_COST, MST_CONFIG_NAME_LEN};

/// Largest number of ports a bridge may have; port numbers are 12 bits wide.
pub const MAX_PORT_COUNT: usize = 4095;

/// Largest number of MSTIs an MST BPDU can describe.
pub const MAX_MSTI_COUNT: usize = 64;

/// Administrative parameters of a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of ports, fixed for the lifetime of the bridge.
    pub port_count: usize,
    /// Number of MSTIs besides the CIST, fixed for the lifetime of the bridge.
    pub msti_count: usize,
    /// MAC address used in every bridge identifier.
    pub address: EtherAddr,
    /// ForceProtocolVersion.
    pub protocol_version: ProtocolVersion,
    /// Bridge priority of every tree.
    pub bridge_priority: u16,
    /// Bridge Hello Time, seconds.
    pub hello_time: u16,
    /// Bridge Max Age, seconds.
    pub max_age: u16,
    /// Bridge Forward Delay, seconds.
    pub forward_delay: u16,
    /// Migrate Time, seconds.
    pub migrate_time: u16,
    /// Transmit Hold Count.
    pub tx_hold_count: u8,
    /// MaxHops within a region.
    pub max_hops: u8,
    /// MST configuration name; the bridge address in hex when absent.
    pub mst_config_name: Option<String>,
    /// MST configuration revision level.
    pub mst_config_revision: u16,
    /// `(vid, tree)` pairs; unlisted VLANs map to the CIST.
    pub vlan_assignments: Vec<(u16, u16)>,
    /// Per-port overrides. Empty, or exactly one entry per port.
    pub ports: Vec<PortConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            port_count: 1,
            msti_count: 0,
            address: EtherAddr::default(),
            protocol_version: ProtocolVersion::Mstp,
            bridge_priority: 32768,
            hello_time: 2,
            max_age: 20,
            forward_delay: 15,
            migrate_time: 3,
            tx_hold_count: 6,
            max_hops: 20,
            mst_config_name: None,
            mst_config_revision: 0,
            vlan_assignments: Vec::new(),
            ports: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Default configuration for a bridge with `port_count` ports.
    pub fn new(address: EtherAddr, port_count: usize) -> Self {
        BridgeConfig {
            address,
            port_count,
            ..Default::default()
        }
    }

    /// The MST configuration name in effect.
    pub fn config_name(&self) -> String {
        match &self.mst_config_name {
            Some(name) => name.clone(),
            None => self
                .address
                .as_bytes()
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect(),
        }
    }

    /// The configuration of `port`, falling back to the defaults.
    pub fn port(&self, port: usize) -> PortConfig {
        self.ports.get(port).cloned().unwrap_or_default()
    }

    /// Check every parameter against its legal range.
    pub fn validate(&self) -> Result<()> {
        Error::check_range("port count", self.port_count as u32, 1, MAX_PORT_COUNT as u32)?;
        Error::check_range("msti count", self.msti_count as u32, 0, MAX_MSTI_COUNT as u32)?;
        check_bridge_priority(self.bridge_priority)?;
        check_bridge_times(self.max_age, self.hello_time, self.forward_delay)?;
        Error::check_range("migrate time", self.migrate_time as u32, 1, 10)?;
        Error::check_range("tx hold count", self.tx_hold_count as u32, 1, 10)?;
        Error::check_range("max hops", self.max_hops as u32, 6, 40)?;

        let name = self.config_name();
        if name.len() > MST_CONFIG_NAME_LEN {
            return Err(Error::InvalidConfigName { len: name.len() });
        }
        for &(vid, tree) in &self.vlan_assignments {
            Error::check_range("vlan id", vid as u32, 1, 4094)?;
            Error::check_range("tree index", tree as u32, 0, self.msti_count as u32)?;
        }

        if !self.ports.is_empty() && self.ports.len() != self.port_count {
            return Err(Error::PortConfigMismatch {
                given: self.ports.len(),
                port_count: self.port_count,
            });
        }
        self.ports.iter().try_for_each(PortConfig::validate)
    }
}

/// Administrative parameters of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// AdminEdge.
    pub admin_edge: bool,
    /// AutoEdge.
    pub auto_edge: bool,
    /// External port path cost; zero derives it from the link speed.
    pub admin_external_path_cost: u32,
    /// adminPointToPointMAC.
    pub admin_p2p: AdminP2p,
    /// Port priority on every tree.
    pub port_priority: u8,
    /// restrictedRole: the port is never selected as Root Port.
    pub restricted_role: bool,
    /// restrictedTcn: received topology changes are not propagated.
    pub restricted_tcn: bool,
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            admin_edge: false,
            auto_edge: true,
            admin_external_path_cost: 0,
            admin_p2p: AdminP2p::Auto,
            port_priority: 128,
            restricted_role: false,
            restricted_tcn: false,
        }
    }
}

impl PortConfig {
    /// Check every parameter against its legal range.
    pub fn validate(&self) -> Result<()> {
        check_port_priority(self.port_priority)?;
        check_path_cost(self.admin_external_path_cost)
    }
}

pub(crate) fn check_bridge_priority(priority: u16) -> Result<()> {
    if priority % 4096 != 0 || priority > 61440 {
        return Err(Error::InvalidPriority {
            value: priority as u32,
            step: 4096,
            max: 61440,
        });
    }
    Ok(())
}

pub(crate) fn check_port_priority(priority: u8) -> Result<()> {
    if priority % 16 != 0 || priority > 240 {
        return Err(Error::InvalidPriority {
            value: priority as u32,
            step: 16,
            max: 240,
        });
    }
    Ok(())
}

/// Zero is accepted and means "derive from link speed".
pub(crate) fn check_path_cost(cost: u32) -> Result<()> {
    if cost == 0 {
        return Ok(());
    }
    Error::check_range("path cost", cost, 1, MAX_PATH_COST)
}

pub(crate) fn check_bridge_times(max_age: u16, hello_time: u16, forward_delay: u16) -> Result<()> {
    Error::check_range("hello time", hello_time as u32, 1, 10)?;
    Error::check_range("max age", max_age as u32, 6, 40)?;
    Error::check_range("forward delay", forward_delay as u32, 4, 30)?;
    if 2 * (forward_delay - 1) < max_age || max_age < 2 * (hello_time + 1) {
        return Err(Error::InconsistentTimes {
            max_age,
            hello_time,
            forward_delay,
        });
    }
    Ok(())
}
