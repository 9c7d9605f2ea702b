#![allow(missing_docs)]

use byteorder::{BigEndian, ByteOrder};

use crate::cursors::*;
use crate::traits::*;
use crate::types::{BridgeId, MstConfigId, PortId, ProtocolVersion, MST_CONFIG_ID_LEN};

use super::*;

// Field offsets shared by every BPDU format past the 4-octet header.
const FLAGS: usize = 4;
const ROOT_ID: usize = 5;
const EXT_ROOT_PATH_COST: usize = 13;
const REGIONAL_ROOT_ID: usize = 17;
const PORT_ID: usize = 25;
const MESSAGE_AGE: usize = 27;
const MAX_AGE: usize = 29;
const HELLO_TIME: usize = 31;
const FORWARD_DELAY: usize = 33;
const VERSION1_LEN: usize = 35;
const VERSION3_LEN: usize = 36;
const MST_CONFIG_ID: usize = 38;
const INT_ROOT_PATH_COST: usize = 89;
const CIST_BRIDGE_ID: usize = 93;
const CIST_REMAINING_HOPS: usize = 101;

// Timer values travel in units of 1/256 second.
#[inline]
fn time_from_wire(raw: u16) -> u16 {
    raw >> 8
}

#[inline]
fn time_to_wire(secs: u16) -> u16 {
    secs.min(0xff) << 8
}

fn structural_kind(chunk: &[u8]) -> BpduKind {
    if chunk.len() < TCN_BPDU_LEN || BigEndian::read_u16(&chunk[0..2]) != 0 {
        return BpduKind::Unknown;
    }
    let version = chunk[2];
    match BpduType::from(chunk[3]) {
        BpduType::TCN => BpduKind::StpTcn,
        BpduType::CONFIG if chunk.len() >= CONFIG_BPDU_LEN => {
            // information at or past its Max Age is not a valid Config BPDU
            let age = BigEndian::read_u16(&chunk[MESSAGE_AGE..MESSAGE_AGE + 2]);
            let max_age = BigEndian::read_u16(&chunk[MAX_AGE..MAX_AGE + 2]);
            if age < max_age {
                BpduKind::StpConfig
            } else {
                BpduKind::Unknown
            }
        }
        BpduType::RST if version >= BpduVersion::RSTP.raw() && chunk.len() >= RST_BPDU_LEN => {
            if version >= BpduVersion::MSTP.raw() && mst_structure_ok(chunk) {
                BpduKind::Mst
            } else {
                BpduKind::Rst
            }
        }
        _ => BpduKind::Unknown,
    }
}

fn mst_structure_ok(chunk: &[u8]) -> bool {
    if chunk.len() < MST_BPDU_MIN_LEN || chunk[VERSION1_LEN] != 0 {
        return false;
    }
    let v3_len = BigEndian::read_u16(&chunk[VERSION3_LEN..VERSION3_LEN + 2]);
    if v3_len < MST_VERSION3_BASE_LEN {
        return false;
    }
    let msti_bytes = (v3_len - MST_VERSION3_BASE_LEN) as usize;
    msti_bytes % MSTI_MESSAGE_LEN == 0
        && msti_bytes / MSTI_MESSAGE_LEN <= MAX_MSTI_MESSAGES
        && chunk.len() >= VERSION3_LEN + 2 + v3_len as usize
}

/// A zero-copy view of a BPDU held in `T`.
///
/// `parse` guarantees that the buffer holds every field of the format the
/// header claims. Fields past the end of that format must not be accessed:
/// the RST fields of a Config BPDU, or the MST fields of an RST BPDU, panic.
#[derive(Debug, Clone, Copy)]
pub struct BpduMessage<T> {
    buf: T,
}

impl<T: Buf> BpduMessage<T> {
    /// Wrap a buffer without any check.
    #[inline]
    pub fn parse_unchecked(buf: T) -> Self {
        Self { buf }
    }

    /// The wrapped buffer.
    #[inline]
    pub fn buf(&self) -> &T {
        &self.buf
    }

    /// Unwrap the buffer.
    #[inline]
    pub fn release(self) -> T {
        self.buf
    }

    /// Wrap `buf` if it holds a well-formed BPDU of any kind.
    #[inline]
    pub fn parse(buf: T) -> Result<Self, T> {
        if structural_kind(buf.chunk()) == BpduKind::Unknown {
            return Err(buf);
        }
        Ok(Self { buf })
    }

    /// The kind of BPDU as seen by a bridge running `local`.
    pub fn kind(&self, local: ProtocolVersion) -> BpduKind {
        match structural_kind(self.buf.chunk()) {
            BpduKind::Mst if local < ProtocolVersion::Mstp => BpduKind::Rst,
            kind => kind,
        }
    }

    /// Number of octets the BPDU occupies; anything past it is padding.
    pub fn bpdu_len(&self) -> usize {
        match structural_kind(self.buf.chunk()) {
            BpduKind::StpTcn => TCN_BPDU_LEN,
            BpduKind::StpConfig => CONFIG_BPDU_LEN,
            BpduKind::Rst => RST_BPDU_LEN,
            BpduKind::Mst => VERSION3_LEN + 2 + self.version3_len() as usize,
            BpduKind::Unknown => self.buf.chunk().len(),
        }
    }

    #[inline]
    pub fn proto_id(&self) -> u16 {
        BigEndian::read_u16(&self.buf.chunk()[0..2])
    }

    #[inline]
    pub fn version(&self) -> BpduVersion {
        BpduVersion::from(self.buf.chunk()[2])
    }

    #[inline]
    pub fn type_(&self) -> BpduType {
        BpduType::from(self.buf.chunk()[3])
    }

    /// Flags of the CIST message.
    #[inline]
    pub fn flags(&self) -> Flags {
        Flags(self.buf.chunk()[FLAGS])
    }

    #[inline]
    pub fn root_id(&self) -> BridgeId {
        BridgeId::from_bytes(&self.buf.chunk()[ROOT_ID..ROOT_ID + 8])
    }

    #[inline]
    pub fn external_root_path_cost(&self) -> u32 {
        BigEndian::read_u32(&self.buf.chunk()[EXT_ROOT_PATH_COST..EXT_ROOT_PATH_COST + 4])
    }

    /// The CIST regional root identifier of an MST BPDU, which is the
    /// "bridge identifier" field of Config and RST BPDUs.
    #[inline]
    pub fn regional_root_id(&self) -> BridgeId {
        BridgeId::from_bytes(&self.buf.chunk()[REGIONAL_ROOT_ID..REGIONAL_ROOT_ID + 8])
    }

    #[inline]
    pub fn port_id(&self) -> PortId {
        PortId(BigEndian::read_u16(&self.buf.chunk()[PORT_ID..PORT_ID + 2]))
    }

    /// Message age in whole seconds.
    #[inline]
    pub fn message_age(&self) -> u16 {
        time_from_wire(BigEndian::read_u16(&self.buf.chunk()[MESSAGE_AGE..MESSAGE_AGE + 2]))
    }

    #[inline]
    pub fn max_age(&self) -> u16 {
        time_from_wire(BigEndian::read_u16(&self.buf.chunk()[MAX_AGE..MAX_AGE + 2]))
    }

    #[inline]
    pub fn hello_time(&self) -> u16 {
        time_from_wire(BigEndian::read_u16(&self.buf.chunk()[HELLO_TIME..HELLO_TIME + 2]))
    }

    #[inline]
    pub fn forward_delay(&self) -> u16 {
        time_from_wire(BigEndian::read_u16(
            &self.buf.chunk()[FORWARD_DELAY..FORWARD_DELAY + 2],
        ))
    }

    #[inline]
    pub fn version1_len(&self) -> u8 {
        self.buf.chunk()[VERSION1_LEN]
    }

    #[inline]
    pub fn version3_len(&self) -> u16 {
        BigEndian::read_u16(&self.buf.chunk()[VERSION3_LEN..VERSION3_LEN + 2])
    }

    #[inline]
    pub fn mst_config_id(&self) -> MstConfigId {
        MstConfigId::from_bytes(&self.buf.chunk()[MST_CONFIG_ID..MST_CONFIG_ID + MST_CONFIG_ID_LEN])
    }

    #[inline]
    pub fn internal_root_path_cost(&self) -> u32 {
        BigEndian::read_u32(&self.buf.chunk()[INT_ROOT_PATH_COST..INT_ROOT_PATH_COST + 4])
    }

    /// Identifier of the transmitting bridge for the CIST.
    #[inline]
    pub fn cist_bridge_id(&self) -> BridgeId {
        BridgeId::from_bytes(&self.buf.chunk()[CIST_BRIDGE_ID..CIST_BRIDGE_ID + 8])
    }

    #[inline]
    pub fn cist_remaining_hops(&self) -> u8 {
        self.buf.chunk()[CIST_REMAINING_HOPS]
    }

    /// Number of MSTI configuration messages advertised by Version 3 Length.
    #[inline]
    pub fn num_of_msti_msg(&self) -> usize {
        let v3_len = self.version3_len();
        v3_len.saturating_sub(MST_VERSION3_BASE_LEN) as usize / MSTI_MESSAGE_LEN
    }

    /// The `index`-th MSTI configuration message.
    ///
    /// # Panics
    ///
    /// `index` is not below `num_of_msti_msg`.
    #[inline]
    pub fn msti_message(&self, index: usize) -> MstiMessage<Cursor<'_>> {
        assert!(index < self.num_of_msti_msg());
        let start = MST_BPDU_MIN_LEN + index * MSTI_MESSAGE_LEN;
        MstiMessage::parse_unchecked(Cursor::new(
            &self.buf.chunk()[start..start + MSTI_MESSAGE_LEN],
        ))
    }
}

impl<T: PktBufMut> BpduMessage<T> {
    /// Write the header of a `kind` BPDU carrying `msti_count` MSTI messages
    /// into `buf` and zero every other field.
    ///
    /// # Panics
    ///
    /// `kind` is `Unknown`, `msti_count` exceeds the format limit, or `buf`
    /// is too small.
    pub fn init_header(mut buf: T, kind: BpduKind, msti_count: usize) -> Self {
        let (len, version, type_) = match kind {
            BpduKind::StpTcn => (TCN_BPDU_LEN, BpduVersion::STP, BpduType::TCN),
            BpduKind::StpConfig => (CONFIG_BPDU_LEN, BpduVersion::STP, BpduType::CONFIG),
            BpduKind::Rst => (RST_BPDU_LEN, BpduVersion::RSTP, BpduType::RST),
            BpduKind::Mst => {
                assert!(msti_count <= MAX_MSTI_MESSAGES);
                (
                    MST_BPDU_MIN_LEN + msti_count * MSTI_MESSAGE_LEN,
                    BpduVersion::MSTP,
                    BpduType::RST,
                )
            }
            BpduKind::Unknown => panic!("cannot encode an unknown BPDU"),
        };
        assert!(buf.chunk().len() >= len);
        let chunk = &mut buf.chunk_mut()[..len];
        chunk.fill(0);
        chunk[2] = version.raw();
        chunk[3] = type_.raw();
        if kind == BpduKind::Mst {
            let v3_len = MST_VERSION3_BASE_LEN + (msti_count * MSTI_MESSAGE_LEN) as u16;
            BigEndian::write_u16(&mut chunk[VERSION3_LEN..VERSION3_LEN + 2], v3_len);
        }
        Self { buf }
    }

    #[inline]
    pub fn set_flags(&mut self, value: Flags) {
        self.buf.chunk_mut()[FLAGS] = value.0;
    }

    #[inline]
    pub fn set_root_id(&mut self, value: BridgeId) {
        self.buf.chunk_mut()[ROOT_ID..ROOT_ID + 8].copy_from_slice(value.as_bytes());
    }

    #[inline]
    pub fn set_external_root_path_cost(&mut self, value: u32) {
        BigEndian::write_u32(
            &mut self.buf.chunk_mut()[EXT_ROOT_PATH_COST..EXT_ROOT_PATH_COST + 4],
            value,
        );
    }

    #[inline]
    pub fn set_regional_root_id(&mut self, value: BridgeId) {
        self.buf.chunk_mut()[REGIONAL_ROOT_ID..REGIONAL_ROOT_ID + 8]
            .copy_from_slice(value.as_bytes());
    }

    #[inline]
    pub fn set_port_id(&mut self, value: PortId) {
        BigEndian::write_u16(&mut self.buf.chunk_mut()[PORT_ID..PORT_ID + 2], value.raw());
    }

    #[inline]
    pub fn set_message_age(&mut self, secs: u16) {
        BigEndian::write_u16(
            &mut self.buf.chunk_mut()[MESSAGE_AGE..MESSAGE_AGE + 2],
            time_to_wire(secs),
        );
    }

    #[inline]
    pub fn set_max_age(&mut self, secs: u16) {
        BigEndian::write_u16(
            &mut self.buf.chunk_mut()[MAX_AGE..MAX_AGE + 2],
            time_to_wire(secs),
        );
    }

    #[inline]
    pub fn set_hello_time(&mut self, secs: u16) {
        BigEndian::write_u16(
            &mut self.buf.chunk_mut()[HELLO_TIME..HELLO_TIME + 2],
            time_to_wire(secs),
        );
    }

    #[inline]
    pub fn set_forward_delay(&mut self, secs: u16) {
        BigEndian::write_u16(
            &mut self.buf.chunk_mut()[FORWARD_DELAY..FORWARD_DELAY + 2],
            time_to_wire(secs),
        );
    }

    #[inline]
    pub fn set_mst_config_id(&mut self, value: &MstConfigId) {
        self.buf.chunk_mut()[MST_CONFIG_ID..MST_CONFIG_ID + MST_CONFIG_ID_LEN]
            .copy_from_slice(&value.to_bytes());
    }

    #[inline]
    pub fn set_internal_root_path_cost(&mut self, value: u32) {
        BigEndian::write_u32(
            &mut self.buf.chunk_mut()[INT_ROOT_PATH_COST..INT_ROOT_PATH_COST + 4],
            value,
        );
    }

    #[inline]
    pub fn set_cist_bridge_id(&mut self, value: BridgeId) {
        self.buf.chunk_mut()[CIST_BRIDGE_ID..CIST_BRIDGE_ID + 8].copy_from_slice(value.as_bytes());
    }

    #[inline]
    pub fn set_cist_remaining_hops(&mut self, value: u8) {
        self.buf.chunk_mut()[CIST_REMAINING_HOPS] = value;
    }

    /// Mutable view of the `index`-th MSTI configuration message.
    ///
    /// # Panics
    ///
    /// `index` is not below `num_of_msti_msg`.
    #[inline]
    pub fn msti_message_mut(&mut self, index: usize) -> MstiMessage<CursorMut<'_>> {
        assert!(index < self.num_of_msti_msg());
        let start = MST_BPDU_MIN_LEN + index * MSTI_MESSAGE_LEN;
        MstiMessage::parse_unchecked(CursorMut::new(
            &mut self.buf.chunk_mut()[start..start + MSTI_MESSAGE_LEN],
        ))
    }
}

/// A zero-copy view of one 16-octet MSTI configuration message.
#[derive(Debug, Clone, Copy)]
pub struct MstiMessage<T> {
    buf: T,
}

impl<T: Buf> MstiMessage<T> {
    /// Wrap a buffer without any check.
    #[inline]
    pub fn parse_unchecked(buf: T) -> Self {
        Self { buf }
    }

    /// Wrap `buf` if it is long enough to hold a message.
    #[inline]
    pub fn parse(buf: T) -> Result<Self, T> {
        if buf.chunk().len() < MSTI_MESSAGE_LEN {
            return Err(buf);
        }
        Ok(Self { buf })
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        Flags(self.buf.chunk()[0])
    }

    /// MSTI regional root; its system id extension is the MSTID.
    #[inline]
    pub fn regional_root_id(&self) -> BridgeId {
        BridgeId::from_bytes(&self.buf.chunk()[1..9])
    }

    #[inline]
    pub fn mstid(&self) -> u16 {
        self.regional_root_id().sys_id_ext()
    }

    #[inline]
    pub fn internal_root_path_cost(&self) -> u32 {
        BigEndian::read_u32(&self.buf.chunk()[9..13])
    }

    /// Designated bridge priority, top nibble of the octet.
    #[inline]
    pub fn bridge_priority(&self) -> u8 {
        self.buf.chunk()[13] >> 4
    }

    /// Designated port priority, top nibble of the octet.
    #[inline]
    pub fn port_priority(&self) -> u8 {
        self.buf.chunk()[14] >> 4
    }

    #[inline]
    pub fn remaining_hops(&self) -> u8 {
        self.buf.chunk()[15]
    }
}

impl<T: PktBufMut> MstiMessage<T> {
    #[inline]
    pub fn set_flags(&mut self, value: Flags) {
        self.buf.chunk_mut()[0] = value.0;
    }

    #[inline]
    pub fn set_regional_root_id(&mut self, value: BridgeId) {
        self.buf.chunk_mut()[1..9].copy_from_slice(value.as_bytes());
    }

    #[inline]
    pub fn set_internal_root_path_cost(&mut self, value: u32) {
        BigEndian::write_u32(&mut self.buf.chunk_mut()[9..13], value);
    }

    #[inline]
    pub fn set_bridge_priority(&mut self, nibble: u8) {
        self.buf.chunk_mut()[13] = nibble << 4;
    }

    #[inline]
    pub fn set_port_priority(&mut self, nibble: u8) {
        self.buf.chunk_mut()[14] = nibble << 4;
    }

    #[inline]
    pub fn set_remaining_hops(&mut self, value: u8) {
        self.buf.chunk_mut()[15] = value;
    }
}
