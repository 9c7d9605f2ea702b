//! Ethernet addressing and 802.3/LLC framing for BPDUs.
//!
//! The engine itself only produces and consumes bare BPDU octets. Hosts that
//! move real frames can use [`encode_bpdu_frame`] and [`strip_bpdu_frame`] to
//! add or remove the IEEE 802.3 header and the 802.2 LLC header that carry
//! every spanning tree BPDU:
//!
//! ```text
//! +-----------------+-----------------+--------+------+------+------+---------+
//! | dst 01:80:c2:.. | src             | length | DSAP | SSAP | ctrl | BPDU .. |
//! +-----------------+-----------------+--------+------+------+------+---------+
//!        6                 6              2       1      1      1
//! ```

use core::fmt;
use core::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A six-octet Ethernet address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct EtherAddr(pub [u8; 6]);

impl EtherAddr {
    /// The broadcast address.
    pub const BROADCAST: EtherAddr = EtherAddr([0xff; 6]);

    /// The Nearest Customer Bridge group address all spanning tree BPDUs are
    /// sent to.
    pub const BRIDGE_GROUP: EtherAddr = EtherAddr([0x01, 0x80, 0xc2, 0x00, 0x00, 0x00]);

    /// Construct an Ethernet address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> EtherAddr {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        EtherAddr(bytes)
    }

    /// Return an Ethernet address as a sequence of octets, in big-endian.
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Query whether the 'multicast' bit in the OUI is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Query whether the address is an unicast address.
    pub const fn is_unicast(&self) -> bool {
        !self.is_multicast()
    }

    /// Parse a string with the form 'Aa:0b:Cc:11:02:33' into `EtherAddr`.
    pub fn parse_from<T: AsRef<str>>(s: T) -> Option<Self> {
        let mut result = [0; 6];
        let mut groups = s.as_ref().split(':');
        for octet in result.iter_mut() {
            let group = groups.next()?;
            if group.len() != 2 {
                return None;
            }
            *octet = u8::from_str_radix(group, 16).ok()?;
        }
        match groups.next() {
            Some(_) => None,
            None => Some(Self(result)),
        }
    }
}

impl fmt::Display for EtherAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Error returned when a string is not a colon separated Ethernet address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ethernet address: {0:?}")]
pub struct ParseEtherAddrError(pub String);

impl FromStr for EtherAddr {
    type Err = ParseEtherAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_from(s).ok_or_else(|| ParseEtherAddrError(s.to_owned()))
    }
}

impl Serialize for EtherAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EtherAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<smoltcp::wire::EthernetAddress> for EtherAddr {
    fn from(value: smoltcp::wire::EthernetAddress) -> Self {
        EtherAddr(value.0)
    }
}

impl From<EtherAddr> for smoltcp::wire::EthernetAddress {
    fn from(value: EtherAddr) -> Self {
        smoltcp::wire::EthernetAddress(value.0)
    }
}

/// Length of the IEEE 802.3 header (destination, source, length).
pub const ETHER_DOT3_HEADER_LEN: usize = 14;

/// Length of the 802.2 LLC header.
pub const LLC_HEADER_LEN: usize = 3;

/// The LLC service access point reserved for the spanning tree protocol.
pub const BPDU_CONST: u8 = 0x42;

/// LLC control field for unnumbered information frames.
pub const LLC_UI_CONTROL: u8 = 0x03;

/// Minimum Ethernet frame length without the frame check sequence.
pub const MIN_FRAME_LEN: usize = 60;

/// Build a complete 802.3 frame carrying `bpdu`, padded to the minimum frame
/// length.
pub fn encode_bpdu_frame(src: EtherAddr, bpdu: &[u8]) -> Vec<u8> {
    let header_len = ETHER_DOT3_HEADER_LEN + LLC_HEADER_LEN;
    let frame_len = (header_len + bpdu.len()).max(MIN_FRAME_LEN);
    let mut frame = vec![0; frame_len];

    frame[0..6].copy_from_slice(EtherAddr::BRIDGE_GROUP.as_bytes());
    frame[6..12].copy_from_slice(src.as_bytes());
    BigEndian::write_u16(&mut frame[12..14], (LLC_HEADER_LEN + bpdu.len()) as u16);
    frame[14] = BPDU_CONST;
    frame[15] = BPDU_CONST;
    frame[16] = LLC_UI_CONTROL;
    frame[header_len..header_len + bpdu.len()].copy_from_slice(bpdu);
    frame
}

/// Return the BPDU carried by a received 802.3 frame.
///
/// `None` is returned for frames not addressed to the bridge group address,
/// Ethernet II frames, frames whose LLC header does not name the spanning tree
/// SAP, and frames shorter than their length field claims. Padding past the
/// length field is not part of the result.
pub fn strip_bpdu_frame(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < ETHER_DOT3_HEADER_LEN + LLC_HEADER_LEN {
        return None;
    }
    if EtherAddr::from_bytes(&frame[0..6]) != EtherAddr::BRIDGE_GROUP {
        return None;
    }
    let length = BigEndian::read_u16(&frame[12..14]) as usize;
    if length > 1500 || length < LLC_HEADER_LEN {
        return None;
    }
    if frame[14] != BPDU_CONST || frame[15] != BPDU_CONST || frame[16] != LLC_UI_CONTROL {
        return None;
    }
    let end = ETHER_DOT3_HEADER_LEN + length;
    frame.get(ETHER_DOT3_HEADER_LEN + LLC_HEADER_LEN..end)
}
