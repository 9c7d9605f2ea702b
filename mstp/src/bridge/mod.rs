//! The bridge: the public face of the protocol engine.
//!
//! A [`Bridge`] owns every protocol variable of one MSTP bridge together with
//! the [`Host`] it acts through. The host feeds it events (received BPDUs,
//! link changes, a one second tick) and administrative changes; every such
//! call runs the state machines to a fixed point before it returns, calling
//! back into the host for each effect along the way.
//!
//! ```rust
//! use mstp::{Bridge, BridgeConfig, FlushType, Host, PortRole};
//! use mstp::ether::EtherAddr;
//!
//! #[derive(Default)]
//! struct Switch {
//!     buf: Vec<u8>,
//!     sent: usize,
//! }
//!
//! impl Host for Switch {
//!     fn enable_bpdu_trapping(&mut self, _enable: bool, _ts: u32) {}
//!     fn enable_learning(&mut self, _port: usize, _tree: usize, _enable: bool, _ts: u32) {}
//!     fn enable_forwarding(&mut self, _port: usize, _tree: usize, _enable: bool, _ts: u32) {}
//!     fn transmit_get_buffer(&mut self, _port: usize, size: usize, _ts: u32) -> Option<&mut [u8]> {
//!         self.buf = vec![0; size];
//!         Some(&mut self.buf[..])
//!     }
//!     fn transmit_release_buffer(&mut self, _port: usize, _ts: u32) {
//!         self.sent += 1;
//!     }
//!     fn flush_fdb(&mut self, _port: usize, _tree: usize, _flush_type: FlushType, _ts: u32) {}
//! }
//!
//! let config = BridgeConfig::new(EtherAddr([0x02, 0, 0, 0, 0, 1]), 2);
//! let mut bridge = Bridge::new(&config, Switch::default()).unwrap();
//! bridge.start(0);
//! bridge.on_port_enabled(0, 1000, true, 0);
//! assert_eq!(bridge.port_role(0, 0).unwrap(), PortRole::Designated);
//! assert!(bridge.host().sent > 0);
//! ```

use tracing::{debug, debug_span, info, warn};

use crate::bpdu::{Bpdu, MAX_MSTI_MESSAGES};
use crate::config::{
    check_bridge_priority, check_bridge_times, check_path_cost, check_port_priority, BridgeConfig,
};
use crate::error::{Error, Result};
use crate::ether::EtherAddr;
use crate::host::Host;
use crate::types::{
    AdminP2p, BridgeId, MstConfigId, PortRole, PortState, PriorityVector, ProtocolVersion, CIST,
};

mod engine;
pub(crate) use engine::Engine;

mod port;
pub use port::PortStats;

mod status;
pub use status::PortTreeStatus;

mod tree;
pub use tree::TopologyChangeInfo;

/// One MSTP bridge and the host it runs on.
///
/// Ports and trees are addressed by zero-based index: tree 0 is the CIST and
/// tree `n` is MSTI `n`. An index out of range is a programming error and
/// panics.
///
/// A new bridge is stopped. While stopped it asks nothing of the host and
/// the host is expected to forward on every port.
#[derive(Debug)]
pub struct Bridge<H: Host> {
    host: H,
    engine: Engine,
}

impl<H: Host> Bridge<H> {
    /// Build a bridge from `config`, acting through `host`.
    pub fn new(config: &BridgeConfig, host: H) -> Result<Self> {
        let engine = Engine::new(config)?;
        Ok(Bridge { host, engine })
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably. Must not be used to feed events back into the bridge
    /// from inside a callback.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the bridge and give back its host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// MAC address shared by every bridge identifier.
    pub fn address(&self) -> EtherAddr {
        self.engine.address
    }

    /// Number of ports.
    pub fn port_count(&self) -> usize {
        self.engine.ports.len()
    }

    /// Number of trees, the CIST included.
    pub fn tree_count(&self) -> usize {
        self.engine.tree_count()
    }

    /// Whether spanning tree is running.
    pub fn is_started(&self) -> bool {
        self.engine.started
    }

    /// Start spanning tree: trap BPDUs and bring every machine to its initial
    /// state. Does nothing on a running bridge.
    pub fn start(&mut self, timestamp: u32) {
        let _span = self.span().entered();
        if self.engine.started {
            return;
        }
        self.engine.now = timestamp;
        info!(protocol = self.engine.force_protocol_version.as_str(), "starting");
        self.host.enable_bpdu_trapping(true, timestamp);
        self.engine.started = true;
        self.engine.reset(&mut self.host);
    }

    /// Stop spanning tree: stop trapping BPDUs and let every port learn and
    /// forward on every tree. Does nothing on a stopped bridge.
    pub fn stop(&mut self, timestamp: u32) {
        let _span = self.span().entered();
        if !self.engine.started {
            return;
        }
        self.engine.now = timestamp;
        info!("stopping");
        self.engine.started = false;
        self.host.enable_bpdu_trapping(false, timestamp);
        for port in 0..self.port_count() {
            for tree in 0..self.tree_count() {
                self.host.enable_learning(port, tree, true, timestamp);
                self.host.enable_forwarding(port, tree, true, timestamp);
            }
        }
    }

    /// Hand the bridge a BPDU received on `port`, without its 802.3 and LLC
    /// headers (see [`crate::ether::strip_bpdu_frame`]).
    ///
    /// Anything that does not decode as a BPDU, or arrives on a port that is
    /// down, is counted in [`PortStats::rx_dropped`] and otherwise ignored.
    /// Frames reaching a stopped bridge are ignored.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn on_bpdu_received(&mut self, port: usize, bpdu: &[u8], timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        if !self.engine.started {
            return;
        }
        self.engine.now = timestamp;

        let decoded = Bpdu::decode(bpdu, self.engine.force_protocol_version, MAX_MSTI_MESSAGES);
        let p = &mut self.engine.ports[port];
        let decoded = match decoded {
            Some(decoded) if p.port_enabled => decoded,
            Some(_) => {
                p.stats.rx_dropped += 1;
                warn!(port, "BPDU received on a disabled port");
                return;
            }
            None => {
                p.stats.rx_dropped += 1;
                warn!(port, len = bpdu.len(), "dropping unknown BPDU");
                return;
            }
        };
        debug!(port, kind = ?decoded.kind(), "BPDU received");
        p.stats.count_rx(decoded.kind());
        p.rcvd = Some(decoded);
        p.rcvd_bpdu = true;
        self.engine.run(&mut self.host);
    }

    /// The link of `port` came up at `speed_mbps`. `detected_p2p` tells
    /// whether the link is full duplex, which decides operPointToPointMAC
    /// when the port's point-to-point setting is [`AdminP2p::Auto`].
    ///
    /// Also used to report a speed or duplex change on a port that is up.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn on_port_enabled(&mut self, port: usize, speed_mbps: u32, detected_p2p: bool, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.now = timestamp;
        let p = &mut self.engine.ports[port];
        let speed_changed = p.speed_mbps != speed_mbps;
        p.port_enabled = true;
        p.speed_mbps = speed_mbps;
        p.detected_p2p = detected_p2p;
        debug!(port, speed_mbps, detected_p2p, "port enabled");
        if speed_changed {
            self.reselect_port(port);
        }
        self.engine.run(&mut self.host);
    }

    /// The link of `port` went down.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn on_port_disabled(&mut self, port: usize, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.now = timestamp;
        self.engine.ports[port].port_enabled = false;
        debug!(port, "port disabled");
        self.engine.run(&mut self.host);
    }

    /// Advance every protocol timer by one second. Call once a second while
    /// the bridge runs.
    pub fn on_one_second_tick(&mut self, timestamp: u32) {
        let _span = self.span().entered();
        if !self.engine.started {
            return;
        }
        self.engine.now = timestamp;
        self.engine.tick();
        self.engine.run(&mut self.host);
    }

    /// Set mcheck on `port`: test the link again for RSTP and MSTP neighbours
    /// after it fell back to STP.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn force_protocol_migration(&mut self, port: usize, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.now = timestamp;
        if self.engine.rstp_version() {
            self.engine.ports[port].mcheck = true;
        }
        self.engine.run(&mut self.host);
    }

    // ---- bridge parameters ----

    /// Bridge identifier on `tree`.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn bridge_id(&self, tree: usize) -> BridgeId {
        self.check_tree(tree);
        self.engine.trees[tree].bridge_id
    }

    /// Bridge priority on `tree`.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn bridge_priority(&self, tree: usize) -> u16 {
        self.bridge_id(tree).priority()
    }

    /// Set the bridge priority on `tree`: a multiple of 4096 up to 61440.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn set_bridge_priority(&mut self, tree: usize, priority: u16, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        self.check_tree(tree);
        check_bridge_priority(priority)?;
        let mut id = self.engine.trees[tree].bridge_id;
        id.set_priority(priority);
        self.engine.trees[tree].set_bridge_id(id, tree == CIST);
        debug!(tree, bridge_id = %id, "bridge priority changed");
        for port in 0..self.port_count() {
            self.engine.reselect(port, tree);
        }
        self.settle(timestamp);
        Ok(())
    }

    /// Bridge Hello Time, seconds.
    pub fn hello_time(&self) -> u16 {
        self.engine.hello_time
    }

    /// Set the Bridge Hello Time.
    pub fn set_hello_time(&mut self, hello_time: u16, timestamp: u32) -> Result<()> {
        let (max_age, forward_delay) = (self.engine.max_age, self.engine.forward_delay);
        self.set_bridge_times(max_age, hello_time, forward_delay, timestamp)
    }

    /// Bridge Max Age, seconds.
    pub fn max_age(&self) -> u16 {
        self.engine.max_age
    }

    /// Set the Bridge Max Age.
    pub fn set_max_age(&mut self, max_age: u16, timestamp: u32) -> Result<()> {
        let (hello_time, forward_delay) = (self.engine.hello_time, self.engine.forward_delay);
        self.set_bridge_times(max_age, hello_time, forward_delay, timestamp)
    }

    /// Bridge Forward Delay, seconds.
    pub fn forward_delay(&self) -> u16 {
        self.engine.forward_delay
    }

    /// Set the Bridge Forward Delay.
    pub fn set_forward_delay(&mut self, forward_delay: u16, timestamp: u32) -> Result<()> {
        let (max_age, hello_time) = (self.engine.max_age, self.engine.hello_time);
        self.set_bridge_times(max_age, hello_time, forward_delay, timestamp)
    }

    /// Set Max Age, Hello Time and Forward Delay together, which allows moves
    /// whose intermediate steps would be inconsistent.
    pub fn set_bridge_times(
        &mut self,
        max_age: u16,
        hello_time: u16,
        forward_delay: u16,
        timestamp: u32,
    ) -> Result<()> {
        let _span = self.span().entered();
        check_bridge_times(max_age, hello_time, forward_delay)?;
        let e = &mut self.engine;
        e.max_age = max_age;
        e.hello_time = hello_time;
        e.forward_delay = forward_delay;
        e.refresh_bridge_times();
        e.reselect_all();
        debug!(max_age, hello_time, forward_delay, "bridge times changed");
        self.settle(timestamp);
        Ok(())
    }

    /// Migrate Time, seconds.
    pub fn migrate_time(&self) -> u16 {
        self.engine.migrate_time
    }

    /// Set the Migrate Time, 1 to 10 seconds.
    pub fn set_migrate_time(&mut self, migrate_time: u16, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        Error::check_range("migrate time", migrate_time as u32, 1, 10)?;
        self.engine.migrate_time = migrate_time;
        self.settle(timestamp);
        Ok(())
    }

    /// Transmit Hold Count.
    pub fn tx_hold_count(&self) -> u8 {
        self.engine.tx_hold_count
    }

    /// Set the Transmit Hold Count, 1 to 10 BPDUs per second.
    pub fn set_tx_hold_count(&mut self, tx_hold_count: u8, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        Error::check_range("tx hold count", tx_hold_count as u32, 1, 10)?;
        self.engine.tx_hold_count = tx_hold_count;
        self.settle(timestamp);
        Ok(())
    }

    /// MaxHops.
    pub fn max_hops(&self) -> u8 {
        self.engine.max_hops
    }

    /// Set MaxHops, 6 to 40.
    pub fn set_max_hops(&mut self, max_hops: u8, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        Error::check_range("max hops", max_hops as u32, 6, 40)?;
        self.engine.max_hops = max_hops;
        self.engine.refresh_bridge_times();
        self.engine.reselect_all();
        self.settle(timestamp);
        Ok(())
    }

    /// ForceProtocolVersion.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.engine.force_protocol_version
    }

    /// Set ForceProtocolVersion. A running bridge restarts its machines.
    pub fn set_protocol_version(&mut self, version: ProtocolVersion, timestamp: u32) {
        let _span = self.span().entered();
        if self.engine.force_protocol_version == version {
            return;
        }
        self.engine.force_protocol_version = version;
        info!(protocol = version.as_str(), "protocol version changed");
        self.restart(timestamp);
    }

    /// The MST configuration identifier this bridge advertises.
    pub fn mst_config_id(&self) -> MstConfigId {
        self.engine.mst_config_id
    }

    /// Set the MST configuration name, at most 32 bytes. A running bridge
    /// restarts its machines.
    pub fn set_mst_config_name(&mut self, name: &str, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        self.engine.mst_config_id.set_name(name)?;
        self.region_changed(timestamp);
        Ok(())
    }

    /// Set the MST configuration revision level. A running bridge restarts its
    /// machines.
    pub fn set_mst_config_revision(&mut self, revision: u16, timestamp: u32) {
        let _span = self.span().entered();
        self.engine.mst_config_id.revision = revision;
        self.region_changed(timestamp);
    }

    /// The tree serving `vid`.
    pub fn vlan_tree(&self, vid: u16) -> Result<usize> {
        Error::check_range("vlan id", vid as u32, 1, 4094)?;
        Ok(self.engine.vlan_table.tree(vid) as usize)
    }

    /// Assign VLAN `vid` to `tree`. A running bridge restarts its machines.
    pub fn set_vlan_tree(&mut self, vid: u16, tree: usize, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        Error::check_range("tree index", tree as u32, 0, self.tree_count() as u32 - 1)?;
        self.engine.vlan_table.set_tree(vid, tree as u16)?;
        self.engine.mst_config_id.digest = self.engine.vlan_table.digest();
        self.region_changed(timestamp);
        Ok(())
    }

    // ---- port parameters ----

    /// Port priority of `port` on `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn port_priority(&self, port: usize, tree: usize) -> u8 {
        self.check_port(port);
        self.check_tree(tree);
        self.engine.ports[port].trees[tree].port_id.priority()
    }

    /// Set the port priority of `port` on `tree`: a multiple of 16 up to 240.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn set_port_priority(&mut self, port: usize, tree: usize, priority: u8, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        self.check_port(port);
        self.check_tree(tree);
        check_port_priority(priority)?;
        self.engine.ports[port].trees[tree].port_id.set_priority(priority);
        self.engine.reselect(port, tree);
        self.settle(timestamp);
        Ok(())
    }

    /// External port path cost in use on `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn external_path_cost(&self, port: usize) -> u32 {
        self.check_port(port);
        self.engine.ports[port].external_path_cost()
    }

    /// Administrative external port path cost of `port`; zero means derived
    /// from the link speed.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn admin_external_path_cost(&self, port: usize) -> u32 {
        self.check_port(port);
        self.engine.ports[port].admin_external_path_cost
    }

    /// Set the administrative external port path cost of `port`, zero to
    /// derive it from the link speed.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_admin_external_path_cost(&mut self, port: usize, cost: u32, timestamp: u32) -> Result<()> {
        let _span = self.span().entered();
        self.check_port(port);
        check_path_cost(cost)?;
        self.engine.ports[port].admin_external_path_cost = cost;
        self.engine.reselect(port, CIST);
        self.settle(timestamp);
        Ok(())
    }

    /// Internal port path cost in use on `port` for `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn internal_path_cost(&self, port: usize, tree: usize) -> u32 {
        self.check_port(port);
        self.check_tree(tree);
        let p = &self.engine.ports[port];
        p.trees[tree].internal_path_cost(p.speed_mbps)
    }

    /// Set the administrative internal port path cost of `port` for `tree`,
    /// zero to derive it from the link speed.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn set_admin_internal_path_cost(
        &mut self,
        port: usize,
        tree: usize,
        cost: u32,
        timestamp: u32,
    ) -> Result<()> {
        let _span = self.span().entered();
        self.check_port(port);
        self.check_tree(tree);
        check_path_cost(cost)?;
        self.engine.ports[port].trees[tree].admin_internal_path_cost = cost;
        self.engine.reselect(port, tree);
        self.settle(timestamp);
        Ok(())
    }

    /// AdminEdge of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn admin_edge(&self, port: usize) -> bool {
        self.check_port(port);
        self.engine.ports[port].admin_edge
    }

    /// Set AdminEdge. It takes effect the next time the port comes up.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_admin_edge(&mut self, port: usize, admin_edge: bool, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.ports[port].admin_edge = admin_edge;
        self.settle(timestamp);
    }

    /// AutoEdge of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn auto_edge(&self, port: usize) -> bool {
        self.check_port(port);
        self.engine.ports[port].auto_edge
    }

    /// Set AutoEdge.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_auto_edge(&mut self, port: usize, auto_edge: bool, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.ports[port].auto_edge = auto_edge;
        self.settle(timestamp);
    }

    /// adminPointToPointMAC of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn admin_p2p(&self, port: usize) -> AdminP2p {
        self.check_port(port);
        self.engine.ports[port].admin_p2p
    }

    /// Set adminPointToPointMAC.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_admin_p2p(&mut self, port: usize, admin_p2p: AdminP2p, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.ports[port].admin_p2p = admin_p2p;
        self.settle(timestamp);
    }

    /// operPointToPointMAC of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn oper_p2p(&self, port: usize) -> bool {
        self.check_port(port);
        self.engine.ports[port].oper_p2p()
    }

    /// restrictedRole of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn restricted_role(&self, port: usize) -> bool {
        self.check_port(port);
        self.engine.ports[port].restricted_role
    }

    /// Set restrictedRole: the port is never selected as Root Port.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_restricted_role(&mut self, port: usize, restricted: bool, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.ports[port].restricted_role = restricted;
        self.reselect_port(port);
        self.settle(timestamp);
    }

    /// restrictedTcn of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn restricted_tcn(&self, port: usize) -> bool {
        self.check_port(port);
        self.engine.ports[port].restricted_tcn
    }

    /// Set restrictedTcn: topology changes received on the port are not
    /// propagated.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn set_restricted_tcn(&mut self, port: usize, restricted: bool, timestamp: u32) {
        let _span = self.span().entered();
        self.check_port(port);
        self.engine.ports[port].restricted_tcn = restricted;
        self.settle(timestamp);
    }

    /// Frame counters of `port`.
    ///
    /// # Panics
    ///
    /// `port` is out of range.
    pub fn port_stats(&self, port: usize) -> PortStats {
        self.check_port(port);
        self.engine.ports[port].stats
    }

    // ---- protocol state, available while running ----

    /// Root priority vector of `tree`.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn root_priority(&self, tree: usize) -> Result<PriorityVector> {
        self.check_started()?;
        self.check_tree(tree);
        Ok(self.engine.trees[tree].root_priority)
    }

    /// The root bridge of `tree`: the CIST root, or the MSTI regional root.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn root_id(&self, tree: usize) -> Result<BridgeId> {
        let root = self.root_priority(tree)?;
        Ok(if tree == CIST {
            root.root_id
        } else {
            root.regional_root_id
        })
    }

    /// The CIST regional root.
    pub fn regional_root_id(&self) -> Result<BridgeId> {
        Ok(self.root_priority(CIST)?.regional_root_id)
    }

    /// Cost to the root of `tree`: the external root path cost on the CIST,
    /// the internal one on an MSTI.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn root_path_cost(&self, tree: usize) -> Result<u32> {
        let root = self.root_priority(tree)?;
        Ok(if tree == CIST {
            root.external_root_path_cost
        } else {
            root.internal_root_path_cost
        })
    }

    /// The CIST internal root path cost.
    pub fn internal_root_path_cost(&self) -> Result<u32> {
        Ok(self.root_priority(CIST)?.internal_root_path_cost)
    }

    /// Index of the root port of `tree`, `None` when this bridge is the root.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn root_port(&self, tree: usize) -> Result<Option<usize>> {
        self.check_started()?;
        self.check_tree(tree);
        let t = &self.engine.trees[tree];
        if t.is_root_bridge() {
            return Ok(None);
        }
        Ok(self
            .engine
            .ports
            .iter()
            .position(|p| p.trees[tree].port_id == t.root_port_id))
    }

    /// Designated bridge of the LAN attached to `port`, on `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn designated_bridge_id(&self, port: usize, tree: usize) -> Result<BridgeId> {
        self.check_started()?;
        self.check_port(port);
        self.check_tree(tree);
        Ok(self.engine.ports[port].trees[tree]
            .port_priority
            .designated_bridge_id)
    }

    /// Role of `port` on `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn port_role(&self, port: usize, tree: usize) -> Result<PortRole> {
        self.check_started()?;
        self.check_port(port);
        self.check_tree(tree);
        Ok(self.engine.ports[port].trees[tree].role)
    }

    /// Forwarding state of `port` on `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn port_state(&self, port: usize, tree: usize) -> Result<PortState> {
        self.check_started()?;
        self.check_port(port);
        self.check_tree(tree);
        Ok(status::port_state(&self.engine.ports[port].trees[tree]))
    }

    /// Everything the bridge holds for `port` on `tree`.
    ///
    /// # Panics
    ///
    /// `port` or `tree` is out of range.
    pub fn port_tree_status(&self, port: usize, tree: usize) -> Result<PortTreeStatus> {
        self.check_started()?;
        self.check_port(port);
        self.check_tree(tree);
        Ok(PortTreeStatus::new(&self.engine.ports[port], tree))
    }

    /// Topology change history of `tree`.
    ///
    /// # Panics
    ///
    /// `tree` is out of range.
    pub fn topology_change_info(&self, tree: usize) -> Result<TopologyChangeInfo> {
        self.check_started()?;
        self.check_tree(tree);
        let t = &self.engine.trees[tree];
        Ok(TopologyChangeInfo {
            count: t.tc_count,
            last_change: t.tc_last_change,
            active: self.engine.ports.iter().any(|p| p.trees[tree].tc_while > 0),
        })
    }

    fn span(&self) -> tracing::Span {
        debug_span!("bridge", address = %self.engine.address)
    }

    fn check_started(&self) -> Result<()> {
        if self.engine.started {
            Ok(())
        } else {
            Err(Error::Disabled)
        }
    }

    fn check_port(&self, port: usize) {
        assert!(
            port < self.port_count(),
            "port {} out of range, bridge has {} ports",
            port,
            self.port_count()
        );
    }

    fn check_tree(&self, tree: usize) {
        assert!(
            tree < self.tree_count(),
            "tree {} out of range, bridge has {} trees",
            tree,
            self.tree_count()
        );
    }

    fn reselect_port(&mut self, port: usize) {
        for tree in 0..self.tree_count() {
            self.engine.reselect(port, tree);
        }
    }

    /// Run the machines after an administrative change.
    fn settle(&mut self, timestamp: u32) {
        self.engine.now = timestamp;
        self.engine.run(&mut self.host);
    }

    fn region_changed(&mut self, timestamp: u32) {
        debug!(config_id = %self.engine.mst_config_id, "MST configuration changed");
        self.restart(timestamp);
    }

    fn restart(&mut self, timestamp: u32) {
        self.engine.now = timestamp;
        if self.engine.started {
            self.engine.reset(&mut self.host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::{CistBpdu, FlagRole, Flags};
    use crate::sm::testing::LogHost;
    use crate::types::PortId;

    fn bridge(ports: usize, mstis: usize) -> Bridge<LogHost> {
        let mut config = BridgeConfig::new(EtherAddr([0x02, 0, 0, 0, 0, 0x10]), ports);
        config.msti_count = mstis;
        Bridge::new(&config, LogHost::default()).unwrap()
    }

    fn superior_rst() -> Vec<u8> {
        let root = BridgeId::new(0, 0, EtherAddr([0x02, 0, 0, 0, 0, 1]));
        Bpdu::Rst(CistBpdu {
            flags: Flags::default()
                .with_role(FlagRole::DESIGNATED)
                .with_proposal(true),
            root_id: root,
            external_root_path_cost: 0,
            regional_root_id: root,
            port_id: PortId(0x8001),
            message_age: 0,
            max_age: 20,
            hello_time: 2,
            forward_delay: 15,
        })
        .to_vec()
    }

    #[test]
    fn stopped_bridge_reports_disabled() {
        let b = bridge(2, 1);
        assert!(!b.is_started());
        assert_eq!(b.root_id(CIST), Err(Error::Disabled));
        assert_eq!(b.root_path_cost(1), Err(Error::Disabled));
        assert_eq!(b.designated_bridge_id(0, CIST), Err(Error::Disabled));
        assert_eq!(b.port_role(1, 1), Err(Error::Disabled));
        assert_eq!(b.topology_change_info(CIST), Err(Error::Disabled));
        assert!(b.host().calls.is_empty());
    }

    #[test]
    fn start_traps_and_stop_forwards_everywhere() {
        let mut b = bridge(2, 1);
        b.start(5);
        assert_eq!(b.host().calls[0], "trap true");
        assert_eq!(b.root_id(CIST).unwrap(), b.bridge_id(CIST));
        assert_eq!(b.root_port(CIST).unwrap(), None);

        b.host_mut().calls.clear();
        b.stop(6);
        let calls = &b.host().calls;
        assert_eq!(calls[0], "trap false");
        assert!(calls.contains(&"forward 1 1 true".to_string()));
        assert!(calls.contains(&"learn 0 0 true".to_string()));
        assert_eq!(b.root_id(CIST), Err(Error::Disabled));
    }

    #[test]
    fn enabled_port_becomes_designated_and_forwards() {
        let mut b = bridge(1, 0);
        b.start(0);
        b.on_port_enabled(0, 1000, true, 0);
        assert_eq!(b.port_role(0, CIST).unwrap(), PortRole::Designated);
        assert!(b.port_stats(0).tx_mst > 0);

        // no neighbour answers, so the port waits out both forward delays
        for now in 1..=30 {
            b.on_one_second_tick(now);
        }
        assert_eq!(b.port_state(0, CIST).unwrap(), PortState::Forwarding);
    }

    #[test]
    fn superior_bpdu_makes_a_root_port() {
        let mut b = bridge(2, 0);
        b.start(0);
        b.on_port_enabled(0, 1000, true, 0);
        b.on_port_enabled(1, 1000, true, 0);
        b.on_bpdu_received(0, &superior_rst(), 1);

        assert_eq!(b.port_stats(0).rx_rst, 1);
        assert_eq!(b.port_role(0, CIST).unwrap(), PortRole::Root);
        assert_eq!(b.root_port(CIST).unwrap(), Some(0));
        assert_eq!(b.root_path_cost(CIST).unwrap(), 20_000);
        assert_eq!(b.root_id(CIST).unwrap().mac_addr(), EtherAddr([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(b.port_role(1, CIST).unwrap(), PortRole::Designated);
    }

    #[test]
    fn unknown_and_early_frames_are_dropped() {
        let mut b = bridge(1, 0);
        b.start(0);
        b.on_bpdu_received(0, &[0x00, 0x00, 0x02], 0);
        b.on_bpdu_received(0, &superior_rst(), 0);
        let stats = b.port_stats(0);
        assert_eq!(stats.rx_dropped, 2);
        assert_eq!(stats.rx_rst, 0);
        assert!(b.root_port(CIST).unwrap().is_none());
    }

    #[test]
    fn setters_validate() {
        let mut b = bridge(1, 1);
        assert!(matches!(
            b.set_bridge_priority(CIST, 1000, 0),
            Err(Error::InvalidPriority { step: 4096, .. })
        ));
        assert!(matches!(
            b.set_port_priority(0, 1, 8, 0),
            Err(Error::InvalidPriority { step: 16, .. })
        ));
        assert!(matches!(
            b.set_max_age(45, 0),
            Err(Error::OutOfRange { name: "max age", .. })
        ));
        assert!(matches!(
            b.set_forward_delay(4, 0),
            Err(Error::InconsistentTimes { .. })
        ));
        assert!(b.set_vlan_tree(10, 2, 0).is_err());
        assert!(b.set_mst_config_name(&"x".repeat(33), 0).is_err());

        b.set_bridge_priority(1, 4096, 0).unwrap();
        assert_eq!(b.bridge_priority(1), 4096);
        assert_eq!(b.bridge_id(1).sys_id_ext(), 1);
        assert_eq!(b.bridge_priority(CIST), 32768);
        b.set_bridge_times(10, 1, 6, 0).unwrap();
        assert_eq!((b.max_age(), b.hello_time(), b.forward_delay()), (10, 1, 6));
    }

    #[test]
    fn vlan_assignment_changes_the_digest() {
        let mut b = bridge(1, 2);
        let before = b.mst_config_id();
        b.set_vlan_tree(100, 2, 0).unwrap();
        assert_eq!(b.vlan_tree(100).unwrap(), 2);
        assert_ne!(b.mst_config_id().digest, before.digest);
        b.set_vlan_tree(100, 0, 0).unwrap();
        assert_eq!(b.mst_config_id(), before);
    }

    #[test]
    fn bridge_priority_change_moves_the_root() {
        let mut b = bridge(2, 0);
        b.start(0);
        b.on_port_enabled(0, 1000, true, 0);
        b.on_bpdu_received(0, &superior_rst(), 0);
        assert_eq!(b.root_port(CIST).unwrap(), Some(0));

        // the neighbour advertises priority 0 from a lower address, so even
        // the best priority leaves it the root
        b.set_bridge_priority(CIST, 0, 1).unwrap();
        assert_eq!(b.root_id(CIST).unwrap().mac_addr(), EtherAddr([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(b.regional_root_id().unwrap(), b.bridge_id(CIST));
        assert_eq!(b.port_role(0, CIST).unwrap(), PortRole::Root);
    }

    #[test]
    fn protocol_version_change_restarts() {
        let mut b = bridge(1, 0);
        b.start(0);
        b.on_port_enabled(0, 100, true, 0);
        b.set_protocol_version(ProtocolVersion::Stp, 1);
        assert_eq!(b.protocol_version(), ProtocolVersion::Stp);
        let before = b.port_stats(0);
        b.force_protocol_migration(0, 2);
        assert_eq!(b.port_stats(0).tx_rst, before.tx_rst);
        assert!(b.port_stats(0).tx_config > 0);
    }
}
