use serde::{Deserialize, Serialize};

use crate::cursors::{Cursor, CursorMut};
use crate::traits::{Buf, PktBuf};
use crate::types::{BridgeId, MstConfigId, PortId, ProtocolVersion};

use super::*;

/// The CIST information common to Config, RST and MST BPDUs.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CistBpdu {
    /// Flags octet.
    pub flags: Flags,
    /// CIST root identifier.
    pub root_id: BridgeId,
    /// CIST external root path cost.
    pub external_root_path_cost: u32,
    /// CIST regional root identifier (the bridge identifier of Config/RST).
    pub regional_root_id: BridgeId,
    /// Transmitting port.
    pub port_id: PortId,
    /// Message age, seconds.
    pub message_age: u16,
    /// Max age, seconds.
    pub max_age: u16,
    /// Hello time, seconds.
    pub hello_time: u16,
    /// Forward delay, seconds.
    pub forward_delay: u16,
}

/// One MSTI configuration message.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MstiConfigMessage {
    /// Flags octet; bit 8 is the Master flag.
    pub flags: Flags,
    /// MSTI regional root; its system id extension is the MSTID.
    pub regional_root_id: BridgeId,
    /// MSTI internal root path cost.
    pub internal_root_path_cost: u32,
    /// 4-bit priority of the designated bridge.
    pub bridge_priority: u8,
    /// 4-bit priority of the designated port.
    pub port_priority: u8,
    /// MSTI remaining hops.
    pub remaining_hops: u8,
}

impl MstiConfigMessage {
    /// The MSTID this message describes.
    pub fn mstid(&self) -> u16 {
        self.regional_root_id.sys_id_ext()
    }
}

/// An MST BPDU.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct MstBpdu {
    /// CIST information shared with RST BPDUs.
    pub cist: CistBpdu,
    /// MST configuration identifier of the transmitting bridge.
    pub mst_config_id: MstConfigId,
    /// CIST internal root path cost.
    pub internal_root_path_cost: u32,
    /// CIST identifier of the transmitting bridge.
    pub cist_bridge_id: BridgeId,
    /// CIST remaining hops.
    pub cist_remaining_hops: u8,
    /// MSTI configuration messages, at most 64.
    pub mstis: Vec<MstiConfigMessage>,
}

/// A decoded BPDU.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Bpdu {
    /// 802.1D Config BPDU.
    Config(CistBpdu),
    /// 802.1D topology change notification.
    Tcn,
    /// RST BPDU.
    Rst(CistBpdu),
    /// MST BPDU.
    Mst(MstBpdu),
}

impl Bpdu {
    /// The wire format of this BPDU.
    pub fn kind(&self) -> BpduKind {
        match self {
            Bpdu::Config(_) => BpduKind::StpConfig,
            Bpdu::Tcn => BpduKind::StpTcn,
            Bpdu::Rst(_) => BpduKind::Rst,
            Bpdu::Mst(_) => BpduKind::Mst,
        }
    }

    /// The CIST information, absent from TCN BPDUs.
    pub fn cist(&self) -> Option<&CistBpdu> {
        match self {
            Bpdu::Config(c) | Bpdu::Rst(c) => Some(c),
            Bpdu::Mst(m) => Some(&m.cist),
            Bpdu::Tcn => None,
        }
    }

    /// Decode `bytes` for a bridge running `local` with `msti_limit` MSTIs.
    ///
    /// Returns `None` for anything [`classify`] reports as unknown. MSTI
    /// messages past `msti_limit` are dropped.
    pub fn decode(bytes: &[u8], local: ProtocolVersion, msti_limit: usize) -> Option<Bpdu> {
        let msg = BpduMessage::parse(Cursor::new(bytes)).ok()?;
        let padding = bytes.len() - msg.bpdu_len();
        let mut buf = msg.release();
        buf.trim_off(padding);
        let msg = BpduMessage::parse_unchecked(buf);
        let bpdu = match msg.kind(local) {
            BpduKind::Unknown => return None,
            BpduKind::StpTcn => Bpdu::Tcn,
            BpduKind::StpConfig => Bpdu::Config(decode_cist(&msg)),
            BpduKind::Rst => Bpdu::Rst(decode_cist(&msg)),
            BpduKind::Mst => {
                let count = msg.num_of_msti_msg().min(msti_limit);
                let mstis = (0..count)
                    .map(|i| {
                        let m = msg.msti_message(i);
                        MstiConfigMessage {
                            flags: m.flags(),
                            regional_root_id: m.regional_root_id(),
                            internal_root_path_cost: m.internal_root_path_cost(),
                            bridge_priority: m.bridge_priority(),
                            port_priority: m.port_priority(),
                            remaining_hops: m.remaining_hops(),
                        }
                    })
                    .collect();
                Bpdu::Mst(MstBpdu {
                    cist: decode_cist(&msg),
                    mst_config_id: msg.mst_config_id(),
                    internal_root_path_cost: msg.internal_root_path_cost(),
                    cist_bridge_id: msg.cist_bridge_id(),
                    cist_remaining_hops: msg.cist_remaining_hops(),
                    mstis,
                })
            }
        };
        Some(bpdu)
    }

    /// Number of octets `encode` writes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Bpdu::Tcn => TCN_BPDU_LEN,
            Bpdu::Config(_) => CONFIG_BPDU_LEN,
            Bpdu::Rst(_) => RST_BPDU_LEN,
            Bpdu::Mst(m) => MST_BPDU_MIN_LEN + m.mstis.len().min(MAX_MSTI_MESSAGES) * MSTI_MESSAGE_LEN,
        }
    }

    /// Encode into the front of `buf` and return the number of octets written.
    ///
    /// Timer values above 255 seconds saturate and MSTI messages past the 64th
    /// are not encoded.
    ///
    /// # Panics
    ///
    /// `buf` is shorter than `encoded_len`.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let len = self.encoded_len();
        let msti_count = match self {
            Bpdu::Mst(m) => m.mstis.len().min(MAX_MSTI_MESSAGES),
            _ => 0,
        };
        let mut msg = BpduMessage::init_header(CursorMut::new(buf), self.kind(), msti_count);
        match self {
            Bpdu::Tcn => {}
            Bpdu::Config(cist) | Bpdu::Rst(cist) => encode_cist(&mut msg, cist),
            Bpdu::Mst(mst) => {
                encode_cist(&mut msg, &mst.cist);
                msg.set_mst_config_id(&mst.mst_config_id);
                msg.set_internal_root_path_cost(mst.internal_root_path_cost);
                msg.set_cist_bridge_id(mst.cist_bridge_id);
                msg.set_cist_remaining_hops(mst.cist_remaining_hops);
                for (i, msti) in mst.mstis.iter().take(msti_count).enumerate() {
                    let mut view = msg.msti_message_mut(i);
                    view.set_flags(msti.flags);
                    view.set_regional_root_id(msti.regional_root_id);
                    view.set_internal_root_path_cost(msti.internal_root_path_cost);
                    view.set_bridge_priority(msti.bridge_priority);
                    view.set_port_priority(msti.port_priority);
                    view.set_remaining_hops(msti.remaining_hops);
                }
            }
        }
        len
    }

    /// Encode into a freshly allocated buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = vec![0; self.encoded_len()];
        self.encode(&mut buf);
        buf
    }
}

fn decode_cist<T: Buf>(msg: &BpduMessage<T>) -> CistBpdu {
    CistBpdu {
        flags: msg.flags(),
        root_id: msg.root_id(),
        external_root_path_cost: msg.external_root_path_cost(),
        regional_root_id: msg.regional_root_id(),
        port_id: msg.port_id(),
        message_age: msg.message_age(),
        max_age: msg.max_age(),
        hello_time: msg.hello_time(),
        forward_delay: msg.forward_delay(),
    }
}

fn encode_cist<T: crate::traits::PktBufMut>(msg: &mut BpduMessage<T>, cist: &CistBpdu) {
    msg.set_flags(cist.flags);
    msg.set_root_id(cist.root_id);
    msg.set_external_root_path_cost(cist.external_root_path_cost);
    msg.set_regional_root_id(cist.regional_root_id);
    msg.set_port_id(cist.port_id);
    msg.set_message_age(cist.message_age);
    msg.set_max_age(cist.max_age);
    msg.set_hello_time(cist.hello_time);
    msg.set_forward_delay(cist.forward_delay);
}
