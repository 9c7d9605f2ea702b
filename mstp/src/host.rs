//! The effects a bridge asks of the system it runs on.
//!
//! The engine never touches a wire or a forwarding table itself. Every
//! externally visible action is a call on the [`Host`] the bridge was built
//! with, made synchronously from inside the entry point that caused it. A host
//! cannot call back into its bridge from a callback: the bridge holds the only
//! mutable borrow of it for the duration of the call.
//!
//! Port and tree arguments are zero-based indices; tree 0 is the CIST and tree
//! `n` is MSTI `n`. Timestamps are whatever the host passed to the entry point.

use serde::{Deserialize, Serialize};

use crate::types::PortRole;

/// How a forwarding database flush should be carried out.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FlushType {
    /// Remove the learned entries right away.
    Immediate,
    /// Age the entries out using the short (Forward Delay) ageing time, as
    /// legacy STP bridges do.
    RapidAgeing,
}

/// Callbacks a bridge uses to act on its surroundings.
///
/// Only the transmit, learning, forwarding and flush callbacks are required;
/// the notifications default to doing nothing.
pub trait Host {
    /// Start or stop delivering BPDUs to the engine instead of forwarding them.
    fn enable_bpdu_trapping(&mut self, enable: bool, timestamp: u32);

    /// Allow or stop address learning on `port` for the VLANs of `tree`.
    fn enable_learning(&mut self, port: usize, tree: usize, enable: bool, timestamp: u32);

    /// Allow or stop frame forwarding on `port` for the VLANs of `tree`.
    fn enable_forwarding(&mut self, port: usize, tree: usize, enable: bool, timestamp: u32);

    /// Provide a buffer of at least `size` bytes to encode a BPDU into.
    ///
    /// Returning `None` skips the transmission; the port counts it as dropped.
    fn transmit_get_buffer(&mut self, port: usize, size: usize, timestamp: u32) -> Option<&mut [u8]>;

    /// Send the BPDU written into the buffer handed out by the last
    /// `transmit_get_buffer` call for `port`.
    fn transmit_release_buffer(&mut self, port: usize, timestamp: u32);

    /// Flush the addresses learned on `port` for the VLANs of `tree`.
    fn flush_fdb(&mut self, port: usize, tree: usize, flush_type: FlushType, timestamp: u32);

    /// `port` detected a topology change on `tree`.
    fn on_topology_change(&mut self, port: usize, tree: usize, timestamp: u32) {
        let _ = (port, tree, timestamp);
    }

    /// A neighbour on `port` notified a topology change on `tree`.
    fn on_notified_topology_change(&mut self, port: usize, tree: usize, timestamp: u32) {
        let _ = (port, tree, timestamp);
    }

    /// The role of `port` on `tree` changed to `role`.
    fn on_port_role_changed(&mut self, port: usize, tree: usize, role: PortRole, timestamp: u32) {
        let _ = (port, tree, role, timestamp);
    }
}

impl<T: Host + ?Sized> Host for &mut T {
    fn enable_bpdu_trapping(&mut self, enable: bool, timestamp: u32) {
        (**self).enable_bpdu_trapping(enable, timestamp)
    }

    fn enable_learning(&mut self, port: usize, tree: usize, enable: bool, timestamp: u32) {
        (**self).enable_learning(port, tree, enable, timestamp)
    }

    fn enable_forwarding(&mut self, port: usize, tree: usize, enable: bool, timestamp: u32) {
        (**self).enable_forwarding(port, tree, enable, timestamp)
    }

    fn transmit_get_buffer(&mut self, port: usize, size: usize, timestamp: u32) -> Option<&mut [u8]> {
        (**self).transmit_get_buffer(port, size, timestamp)
    }

    fn transmit_release_buffer(&mut self, port: usize, timestamp: u32) {
        (**self).transmit_release_buffer(port, timestamp)
    }

    fn flush_fdb(&mut self, port: usize, tree: usize, flush_type: FlushType, timestamp: u32) {
        (**self).flush_fdb(port, tree, flush_type, timestamp)
    }

    fn on_topology_change(&mut self, port: usize, tree: usize, timestamp: u32) {
        (**self).on_topology_change(port, tree, timestamp)
    }

    fn on_notified_topology_change(&mut self, port: usize, tree: usize, timestamp: u32) {
        (**self).on_notified_topology_change(port, tree, timestamp)
    }

    fn on_port_role_changed(&mut self, port: usize, tree: usize, role: PortRole, timestamp: u32) {
        (**self).on_port_role_changed(port, tree, role, timestamp)
    }
}
