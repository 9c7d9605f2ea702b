//! BPDU wire codec.
//!
//! Four BPDU formats are exchanged between bridges, all starting with a
//! two-octet protocol identifier (always zero), a version and a type:
//!
//! - **Config BPDU** (version 0, type 0x00, 35 octets): legacy STP information.
//! - **TCN BPDU** (version 0, type 0x80, 4 octets): legacy topology change
//!   notification.
//! - **RST BPDU** (version 2, type 0x02, 36 octets): Config layout plus the
//!   Version 1 Length octet, with port role and agreement flags.
//! - **MST BPDU** (version 3, type 0x02, 102 octets plus 16 per MSTI): RST
//!   layout plus the MST configuration identifier, CIST internal information
//!   and one configuration message per MSTI.
//!
//! Two layers are provided. [`BpduMessage`] and [`MstiMessage`] are zero-copy
//! views over a buffer with field accessors and setters, in the manner of a
//! packet parser. [`Bpdu`] is the owned, structured value the engine records
//! from and builds outgoing frames with.
//!
//! Classification never fails: anything that is not a well-formed BPDU is
//! [`BpduKind::Unknown`].
//!
//! # Example
//!
//! ```rust
//! use mstp::bpdu::*;
//! use mstp::ProtocolVersion;
//!
//! let tcn = [0x00, 0x00, 0x00, 0x80];
//! assert_eq!(classify(&tcn[..], ProtocolVersion::Rstp), BpduKind::StpTcn);
//! assert_eq!(Bpdu::decode(&tcn[..], ProtocolVersion::Rstp, 0), Some(Bpdu::Tcn));
//!
//! let truncated = [0x00, 0x00, 0x02, 0x02, 0x3c];
//! assert_eq!(classify(&truncated[..], ProtocolVersion::Rstp), BpduKind::Unknown);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PortRole, ProtocolVersion};

mod message;
pub use message::{BpduMessage, MstiMessage};

mod value;
pub use value::{Bpdu, CistBpdu, MstBpdu, MstiConfigMessage};

/// Length of a TCN BPDU.
pub const TCN_BPDU_LEN: usize = 4;
/// Length of a Config BPDU.
pub const CONFIG_BPDU_LEN: usize = 35;
/// Length of an RST BPDU.
pub const RST_BPDU_LEN: usize = 36;
/// Length of an MST BPDU carrying no MSTI configuration messages.
pub const MST_BPDU_MIN_LEN: usize = 102;
/// Length of one MSTI configuration message.
pub const MSTI_MESSAGE_LEN: usize = 16;
/// Most MSTI configuration messages an MST BPDU may carry.
pub const MAX_MSTI_MESSAGES: usize = 64;
/// Version 3 Length of an MST BPDU without MSTI messages.
pub const MST_VERSION3_BASE_LEN: u16 = 64;

enum_sim! {
    /// An enum-like type for the protocol version identifier octet.
    pub struct BpduVersion (u8) {
        /// Config and TCN BPDUs.
        STP = 0x00,

        /// RST BPDUs.
        RSTP = 0x02,

        /// MST BPDUs.
        MSTP = 0x03,
    }
}

enum_sim! {
    /// An enum-like type for the BPDU type octet.
    pub struct BpduType (u8) {
        /// Config BPDU.
        CONFIG = 0x00,

        /// RST or MST BPDU.
        RST = 0x02,

        /// Topology change notification.
        TCN = 0x80,
    }
}

enum_sim! {
    /// An enum-like type for the two-bit port role field of the flags octet.
    pub struct FlagRole (u8) {
        /// Unknown in a CIST message, Master in an MSTI message.
        MASTER_OR_UNKNOWN = 0,

        /// Alternate or Backup port.
        ALTERNATE_OR_BACKUP = 1,

        /// Root port.
        ROOT = 2,

        /// Designated port.
        DESIGNATED = 3,
    }
}

impl FlagRole {
    /// The code point a port in `role` transmits.
    pub fn from_role(role: PortRole) -> Self {
        match role {
            PortRole::Root => FlagRole::ROOT,
            PortRole::Designated => FlagRole::DESIGNATED,
            PortRole::Alternate | PortRole::Backup => FlagRole::ALTERNATE_OR_BACKUP,
            PortRole::Master | PortRole::Disabled => FlagRole::MASTER_OR_UNKNOWN,
        }
    }
}

/// The flags octet of a CIST or MSTI message.
///
/// Bit 8 is the Topology Change Acknowledgment flag in CIST messages and the
/// Master flag in MSTI messages.
#[derive(Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Flags(pub u8);

impl Flags {
    /// Topology Change.
    pub const TC: u8 = 0x01;
    /// Proposal.
    pub const PROPOSAL: u8 = 0x02;
    /// Port role, two bits.
    pub const ROLE_MASK: u8 = 0x0c;
    /// Learning.
    pub const LEARNING: u8 = 0x10;
    /// Forwarding.
    pub const FORWARDING: u8 = 0x20;
    /// Agreement.
    pub const AGREEMENT: u8 = 0x40;
    /// Topology Change Acknowledgment, or Master for MSTIs.
    pub const TCA_OR_MASTER: u8 = 0x80;

    #[inline]
    fn bit(&self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    #[inline]
    fn with(self, mask: u8, value: bool) -> Self {
        if value {
            Flags(self.0 | mask)
        } else {
            Flags(self.0 & !mask)
        }
    }

    /// Topology Change flag.
    pub fn tc(&self) -> bool {
        self.bit(Self::TC)
    }

    /// Proposal flag.
    pub fn proposal(&self) -> bool {
        self.bit(Self::PROPOSAL)
    }

    /// Port role field.
    pub fn role(&self) -> FlagRole {
        FlagRole::from((self.0 & Self::ROLE_MASK) >> 2)
    }

    /// Learning flag.
    pub fn learning(&self) -> bool {
        self.bit(Self::LEARNING)
    }

    /// Forwarding flag.
    pub fn forwarding(&self) -> bool {
        self.bit(Self::FORWARDING)
    }

    /// Agreement flag.
    pub fn agreement(&self) -> bool {
        self.bit(Self::AGREEMENT)
    }

    /// Topology Change Acknowledgment flag of a CIST message.
    pub fn tca(&self) -> bool {
        self.bit(Self::TCA_OR_MASTER)
    }

    /// Master flag of an MSTI message.
    pub fn master(&self) -> bool {
        self.bit(Self::TCA_OR_MASTER)
    }

    /// Set or clear the Topology Change flag.
    pub fn with_tc(self, value: bool) -> Self {
        self.with(Self::TC, value)
    }

    /// Set or clear the Proposal flag.
    pub fn with_proposal(self, value: bool) -> Self {
        self.with(Self::PROPOSAL, value)
    }

    /// Replace the port role field.
    pub fn with_role(self, role: FlagRole) -> Self {
        Flags((self.0 & !Self::ROLE_MASK) | ((role.raw() & 0x03) << 2))
    }

    /// Set or clear the Learning flag.
    pub fn with_learning(self, value: bool) -> Self {
        self.with(Self::LEARNING, value)
    }

    /// Set or clear the Forwarding flag.
    pub fn with_forwarding(self, value: bool) -> Self {
        self.with(Self::FORWARDING, value)
    }

    /// Set or clear the Agreement flag.
    pub fn with_agreement(self, value: bool) -> Self {
        self.with(Self::AGREEMENT, value)
    }

    /// Set or clear the Topology Change Acknowledgment flag.
    pub fn with_tca(self, value: bool) -> Self {
        self.with(Self::TCA_OR_MASTER, value)
    }

    /// Set or clear the Master flag.
    pub fn with_master(self, value: bool) -> Self {
        self.with(Self::TCA_OR_MASTER, value)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#04x}", self.0)?;
        for (mask, name) in [
            (Self::TC, " tc"),
            (Self::PROPOSAL, " prop"),
            (Self::LEARNING, " lrn"),
            (Self::FORWARDING, " fwd"),
            (Self::AGREEMENT, " agr"),
            (Self::TCA_OR_MASTER, " tca/mst"),
        ] {
            if self.bit(mask) {
                f.write_str(name)?;
            }
        }
        write!(f, " role={})", self.role())
    }
}

/// What a received octet string turned out to be.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BpduKind {
    /// Not a valid BPDU; dropped without side effects.
    Unknown,
    /// 802.1D Config BPDU.
    StpConfig,
    /// 802.1D topology change notification.
    StpTcn,
    /// Rapid spanning tree BPDU, or an MST BPDU handled as one.
    Rst,
    /// Multiple spanning tree BPDU.
    Mst,
}

/// Classify `bytes` for a bridge running `local`.
///
/// MST BPDUs are only recognised as such by MSTP bridges; other bridges, and
/// MSTP bridges facing a structurally malformed MST BPDU that is still a valid
/// RST BPDU, handle them as RST BPDUs.
pub fn classify(bytes: &[u8], local: ProtocolVersion) -> BpduKind {
    match BpduMessage::parse(bytes) {
        Ok(msg) => msg.kind(local),
        Err(_) => BpduKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_bits() {
        let flags = Flags(0x7c);
        assert!(!flags.tc());
        assert!(!flags.proposal());
        assert_eq!(flags.role(), FlagRole::DESIGNATED);
        assert!(flags.learning());
        assert!(flags.forwarding());
        assert!(flags.agreement());
        assert!(!flags.tca());

        let built = Flags::default()
            .with_role(FlagRole::DESIGNATED)
            .with_learning(true)
            .with_forwarding(true)
            .with_agreement(true);
        assert_eq!(built, flags);

        let rapid = Flags(0x3d);
        assert!(rapid.tc());
        assert_eq!(rapid.role(), FlagRole::DESIGNATED);
        assert_eq!(rapid.with_tc(false).0, 0x3c);
        assert_eq!(format!("{}", FlagRole::ROOT), "ROOT");
    }

    #[test]
    fn role_code_points() {
        assert_eq!(FlagRole::from_role(PortRole::Backup), FlagRole::ALTERNATE_OR_BACKUP);
        assert_eq!(FlagRole::from_role(PortRole::Master), FlagRole::MASTER_OR_UNKNOWN);
        assert_eq!(FlagRole::from_role(PortRole::Root).raw(), 2);
        assert!(FlagRole::from(3).is_known());
        assert!(!BpduType::from(0x01).is_known());
    }
}
