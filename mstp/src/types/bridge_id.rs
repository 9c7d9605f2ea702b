use core::fmt;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::ether::EtherAddr;

/// `BridgeId` represents a root/bridge identifier.
///
/// The identifier contains the following fields:
/// * Priority: 4 bits, accessed with `priority`/`set_priority`.
/// * System ID extension: 12 bits, accessed with `sys_id_ext`/`set_sys_id_ext`.
///   MSTP stores the MSTID of the tree here.
/// * MAC address: 48 bits, accessed with `mac_addr`/`set_mac_addr`.
///
/// Identifiers compare as 64-bit big-endian integers, which is the same as
/// comparing the raw octets lexicographically.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Serialize, Deserialize,
)]
pub struct BridgeId(pub [u8; 8]);

impl BridgeId {
    /// Build an identifier from its three components.
    ///
    /// # Panics
    ///
    /// `priority` is not a multiple of 4096 or `sys_id_ext` does not fit in 12 bits.
    pub fn new(priority: u16, sys_id_ext: u16, mac_addr: EtherAddr) -> Self {
        let mut id = Self::default();
        id.set_priority(priority);
        id.set_sys_id_ext(sys_id_ext);
        id.set_mac_addr(mac_addr);
        id
    }

    /// Convert byte slice to `BridgeId`.
    ///
    /// # Panics
    ///
    /// `bytes` is not eight octets long.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0; 8];
        buf.copy_from_slice(bytes);
        Self(buf)
    }

    /// Create a byte slice from the `BridgeId`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The identifier as a big-endian integer.
    #[inline]
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Build an identifier from a big-endian integer.
    #[inline]
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    /// Get the priority from the `BridgeId`.
    ///
    /// Note: the result is a multiple of 4096.
    #[inline]
    pub fn priority(&self) -> u16 {
        ((self.0[0] >> 4) as u16) << 12
    }

    /// The 4-bit priority as carried in MSTI configuration messages.
    #[inline]
    pub fn priority_nibble(&self) -> u8 {
        self.0[0] >> 4
    }

    /// Get the system id extension from the `BridgeId`.
    #[inline]
    pub fn sys_id_ext(&self) -> u16 {
        BigEndian::read_u16(&self.0[0..2]) & 0xfff
    }

    /// Get the mac address from the `BridgeId`.
    #[inline]
    pub fn mac_addr(&self) -> EtherAddr {
        EtherAddr::from_bytes(&self.0[2..8])
    }

    /// Set the priority for the `BridgeId`.
    ///
    /// # Panics
    ///
    /// The lower 12 bits of `value` are not all zero.
    #[inline]
    pub fn set_priority(&mut self, value: u16) {
        assert!(value & 0x0fff == 0);
        self.set_priority_nibble((value >> 12) as u8);
    }

    /// Set the priority from its 4-bit encoding. Higher bits are ignored.
    #[inline]
    pub fn set_priority_nibble(&mut self, nibble: u8) {
        self.0[0] = (self.0[0] & 0x0f) | ((nibble & 0x0f) << 4);
    }

    /// Set the system id extension for the `BridgeId`.
    ///
    /// # Panics
    ///
    /// `value` does not fit in 12 bits.
    #[inline]
    pub fn set_sys_id_ext(&mut self, value: u16) {
        assert!(value <= 0xfff);
        let write_value = ((self.0[0] & 0xf0) as u16) << 8 | value;
        BigEndian::write_u16(&mut self.0[0..2], write_value);
    }

    /// Set the mac address for the `BridgeId`.
    #[inline]
    pub fn set_mac_addr(&mut self, value: EtherAddr) {
        self.0[2..8].copy_from_slice(value.as_bytes());
    }

    /// Whether both identifiers name the same bridge, regardless of priority
    /// and tree.
    #[inline]
    pub fn same_bridge(&self, other: &BridgeId) -> bool {
        self.0[2..8] == other.0[2..8]
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}.{:03x}.{}",
            self.priority_nibble(),
            self.sys_id_ext(),
            self.mac_addr()
        )
    }
}
