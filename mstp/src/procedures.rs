//! Procedures and derived conditions of IEEE 802.1Q 13.25 to 13.27.
//!
//! These are the operations the state machines perform on entering a state
//! and the conditions they test. Each takes the port and tree it applies to as
//! indices; an index out of range is a caller bug and panics.

use tracing::{debug, warn};

use crate::bpdu::{Bpdu, CistBpdu, FlagRole, Flags, MstBpdu, MstiConfigMessage};
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::{BridgeId, InfoIs, PortId, PortRole, PriorityVector, RcvdInfo, Times, CIST};

/// The role a received message conveys.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum MsgRole {
    Designated,
    RootOrAlternate,
    Unknown,
}

impl Engine {
    // -- derived conditions (13.25) --

    /// allSynced.
    pub(crate) fn all_synced(&self, port: usize, tree: usize) -> bool {
        let stable = self.ports.iter().all(|q| {
            let x = &q.trees[tree];
            x.selected && x.role == x.selected_role && !x.updt_info
        });
        if !stable {
            return false;
        }
        match self.ports[port].trees[tree].role {
            PortRole::Root | PortRole::Alternate => self
                .ports
                .iter()
                .map(|q| &q.trees[tree])
                .filter(|x| x.role != PortRole::Root)
                .all(|x| x.synced),
            PortRole::Designated | PortRole::Master => self
                .ports
                .iter()
                .enumerate()
                .filter(|(q, _)| *q != port)
                .all(|(_, x)| x.trees[tree].synced),
            _ => false,
        }
    }

    /// reRooted.
    pub(crate) fn re_rooted(&self, port: usize, tree: usize) -> bool {
        self.ports
            .iter()
            .enumerate()
            .filter(|(q, _)| *q != port)
            .all(|(_, x)| x.trees[tree].rr_while == 0)
    }

    /// allTransmitReady.
    pub(crate) fn all_transmit_ready(&self, port: usize) -> bool {
        self.ports[port]
            .trees
            .iter()
            .all(|x| x.selected && !x.updt_info)
    }

    /// HelloTime: taken from the CIST port times.
    pub(crate) fn port_hello_time(&self, port: usize) -> u16 {
        self.ports[port].trees[CIST].port_times.hello_time
    }

    /// FwdDelay: taken from the CIST designated times.
    pub(crate) fn fwd_delay(&self, port: usize) -> u16 {
        self.ports[port].trees[CIST].designated_times.forward_delay
    }

    /// MaxAge: taken from the CIST designated times.
    pub(crate) fn port_max_age(&self, port: usize) -> u16 {
        self.ports[port].trees[CIST].designated_times.max_age
    }

    /// forwardDelay: how long a port spends in Discarding and Learning.
    pub(crate) fn forward_delay_for(&self, port: usize) -> u16 {
        if self.ports[port].send_rstp {
            self.port_hello_time(port)
        } else {
            self.fwd_delay(port)
        }
    }

    /// EdgeDelay.
    pub(crate) fn edge_delay(&self, port: usize) -> u16 {
        if self.ports[port].oper_p2p() {
            self.migrate_time
        } else {
            self.port_max_age(port)
        }
    }

    pub(crate) fn cist_root_port(&self, port: usize) -> bool {
        self.ports[port].trees[CIST].role == PortRole::Root
    }

    pub(crate) fn cist_designated_port(&self, port: usize) -> bool {
        self.ports[port].trees[CIST].role == PortRole::Designated
    }

    /// mstiDesignatedOrTCpropagatingRootPort.
    pub(crate) fn msti_designated_or_tc_propagating_root_port(&self, port: usize) -> bool {
        self.ports[port].trees[1..].iter().any(|x| {
            x.role == PortRole::Designated || (x.role == PortRole::Root && x.tc_while != 0)
        })
    }

    /// mstiMasterPort.
    pub(crate) fn msti_master_port(&self, port: usize) -> bool {
        self.ports[port].trees[1..]
            .iter()
            .any(|x| x.role == PortRole::Master)
    }

    /// rcvdCistMsg or rcvdMstiMsg. An MSTI message is only acted on once the
    /// CIST message of the same BPDU has been processed.
    pub(crate) fn rcvd_xst_msg(&self, port: usize, tree: usize) -> bool {
        let p = &self.ports[port];
        if tree == CIST {
            p.trees[CIST].rcvd_msg
        } else {
            p.trees[tree].rcvd_msg && !p.trees[CIST].rcvd_msg
        }
    }

    /// updtCistInfo or updtMstiInfo.
    pub(crate) fn updt_xst_info(&self, port: usize, tree: usize) -> bool {
        let p = &self.ports[port];
        if tree == CIST {
            p.trees[CIST].updt_info
        } else {
            p.trees[tree].updt_info || p.trees[CIST].updt_info
        }
    }

    // -- procedures (13.26) --

    /// betterorsameInfo.
    pub(crate) fn better_or_same_info(&self, port: usize, tree: usize, new_info_is: InfoIs) -> bool {
        let x = &self.ports[port].trees[tree];
        match new_info_is {
            InfoIs::Received => x.info_is == InfoIs::Received && x.msg_priority <= x.port_priority,
            InfoIs::Mine => x.info_is == InfoIs::Mine && x.designated_priority <= x.port_priority,
            _ => false,
        }
    }

    /// clearAllRcvdMsgs.
    pub(crate) fn clear_all_rcvd_msgs(&mut self, port: usize) {
        for x in self.ports[port].trees.iter_mut() {
            x.rcvd_msg = false;
        }
    }

    /// clearReselectTree.
    pub(crate) fn clear_reselect_tree(&mut self, tree: usize) {
        for p in self.ports.iter_mut() {
            p.trees[tree].reselect = false;
        }
    }

    /// fromSameRegion.
    pub(crate) fn from_same_region(&self, port: usize) -> bool {
        match &self.ports[port].rcvd {
            Some(Bpdu::Mst(mst)) => self.mstp() && mst.mst_config_id == self.mst_config_id,
            _ => false,
        }
    }

    /// Set newInfo for the CIST or newInfoMsti for an MSTI.
    pub(crate) fn new_info_xst(&mut self, port: usize, tree: usize) {
        if tree == CIST {
            self.ports[port].new_info = true;
        } else {
            self.ports[port].new_info_msti = true;
        }
    }

    /// newTcWhile.
    pub(crate) fn new_tc_while(&mut self, port: usize, tree: usize) {
        if self.ports[port].trees[tree].tc_while != 0 {
            return;
        }
        if self.ports[port].send_rstp {
            let hello = self.port_hello_time(port);
            self.ports[port].trees[tree].tc_while = hello + 1;
            self.new_info_xst(port, tree);
        } else {
            let root_times = self.trees[tree].root_times;
            self.ports[port].trees[tree].tc_while = root_times.max_age + root_times.forward_delay;
        }
    }

    /// newTcDetected: keep reporting a detected change for HelloTime + 1.
    pub(crate) fn new_tc_detected(&mut self, port: usize, tree: usize) {
        let hello = self.port_hello_time(port);
        let x = &mut self.ports[port].trees[tree];
        if x.tc_detected == 0 {
            x.tc_detected = hello + 1;
        }
    }

    /// rcvInfo. A TCN BPDU carries no priority information; it raises the
    /// topology change flags of every tree and classifies as other.
    pub(crate) fn rcv_info(&mut self, port: usize, tree: usize) -> RcvdInfo {
        if let Some(Bpdu::Tcn) = self.ports[port].rcvd {
            if tree == CIST {
                let p = &mut self.ports[port];
                p.rcvd_tcn = true;
                for x in p.trees[1..].iter_mut() {
                    x.rcvd_tc = true;
                }
            }
            return RcvdInfo::Other;
        }
        let msg_role = match &self.ports[port].rcvd {
            None | Some(Bpdu::Tcn) => return RcvdInfo::Other,
            Some(Bpdu::Config(_)) => MsgRole::Designated,
            Some(_) => {
                let flags = self.ports[port].trees[tree].msg_flags;
                match flags.role() {
                    FlagRole::DESIGNATED => MsgRole::Designated,
                    FlagRole::ROOT | FlagRole::ALTERNATE_OR_BACKUP => MsgRole::RootOrAlternate,
                    // the Master code point only exists in MSTI messages
                    _ if tree != CIST => MsgRole::RootOrAlternate,
                    _ => MsgRole::Unknown,
                }
            }
        };

        let x = &self.ports[port].trees[tree];
        let msg = &x.msg_priority;
        let stored = &x.port_priority;
        match msg_role {
            MsgRole::Designated => {
                if msg.is_superior_to(stored) && msg != stored {
                    RcvdInfo::SuperiorDesignated
                } else if msg == stored {
                    if times_differ(tree, &x.msg_times, &x.port_times) {
                        RcvdInfo::SuperiorDesignated
                    } else {
                        RcvdInfo::RepeatedDesignated
                    }
                } else {
                    RcvdInfo::InferiorDesignated
                }
            }
            MsgRole::RootOrAlternate if msg >= stored => RcvdInfo::InferiorRootAlternate,
            _ => RcvdInfo::Other,
        }
    }

    /// recordAgreement.
    pub(crate) fn record_agreement(&mut self, port: usize, tree: usize) {
        let rapid = !matches!(self.ports[port].rcvd, Some(Bpdu::Config(_)) | Some(Bpdu::Tcn) | None);
        let p2p = self.ports[port].oper_p2p();
        let rstp = self.rstp_version();
        let p = &mut self.ports[port];
        if tree == CIST {
            let cist = &mut p.trees[CIST];
            if rstp && p2p && rapid && cist.msg_flags.agreement() {
                cist.agreed = true;
                cist.proposing = false;
            } else {
                cist.agreed = false;
            }
            if !p.rcvd_internal {
                let (agreed, proposing) = (p.trees[CIST].agreed, p.trees[CIST].proposing);
                for x in p.trees[1..].iter_mut() {
                    x.agreed = agreed;
                    x.proposing = proposing;
                }
            }
        } else {
            let same_root = p.trees[CIST]
                .msg_priority
                .same_root_and_region(&p.trees[CIST].port_priority);
            let x = &mut p.trees[tree];
            if p.rcvd_internal && p2p && x.msg_flags.agreement() && same_root {
                x.agreed = true;
                x.proposing = false;
            } else {
                x.agreed = false;
            }
        }
    }

    /// recordDispute.
    pub(crate) fn record_dispute(&mut self, port: usize, tree: usize) {
        if matches!(self.ports[port].rcvd, Some(Bpdu::Config(_)) | Some(Bpdu::Tcn) | None) {
            return;
        }
        let p = &mut self.ports[port];
        if !p.trees[tree].msg_flags.learning() {
            return;
        }
        p.trees[tree].disputed = true;
        p.trees[tree].agreed = false;
        if tree == CIST && !p.rcvd_internal {
            for x in p.trees[1..].iter_mut() {
                x.disputed = true;
                x.agreed = false;
            }
        }
    }

    /// recordMastered.
    pub(crate) fn record_mastered(&mut self, port: usize, tree: usize) {
        let p = &mut self.ports[port];
        if tree == CIST {
            if !p.rcvd_internal {
                for x in p.trees[1..].iter_mut() {
                    x.mastered = false;
                }
            }
        } else if p.rcvd_internal {
            let x = &mut p.trees[tree];
            x.mastered = x.msg_flags.master();
        }
    }

    /// recordPriority.
    pub(crate) fn record_priority(&mut self, port: usize, tree: usize) {
        let x = &mut self.ports[port].trees[tree];
        x.port_priority = x.msg_priority;
    }

    /// recordProposal.
    pub(crate) fn record_proposal(&mut self, port: usize, tree: usize) {
        let p = &mut self.ports[port];
        let flags = p.trees[tree].msg_flags;
        if flags.role() == FlagRole::DESIGNATED && flags.proposal() {
            p.trees[tree].proposed = true;
            if tree == CIST && !p.rcvd_internal {
                for x in p.trees[1..].iter_mut() {
                    x.proposed = true;
                }
            }
        }
    }

    /// recordTimes. MSTIs only track remaining hops.
    pub(crate) fn record_times(&mut self, port: usize, tree: usize) {
        let x = &mut self.ports[port].trees[tree];
        if tree == CIST {
            x.port_times = x.msg_times;
            x.port_times.hello_time = x.msg_times.hello_time.max(1);
        } else {
            x.port_times.remaining_hops = x.msg_times.remaining_hops;
        }
    }

    /// setRcvdMsgs: compute the message priority vector, times and flags of
    /// every tree the received BPDU carries a message for, and flag them.
    pub(crate) fn set_rcvd_msgs(&mut self, port: usize) {
        let bpdu = match self.ports[port].rcvd.take() {
            Some(bpdu) => bpdu,
            None => return,
        };
        let internal = self.ports[port].rcvd_internal;
        let max_hops = self.max_hops;
        let p = &mut self.ports[port];

        match &bpdu {
            Bpdu::Tcn => {}
            Bpdu::Config(c) | Bpdu::Rst(c) => {
                let cist = &mut p.trees[CIST];
                cist.msg_priority = external_priority(c, c.regional_root_id);
                cist.msg_times = cist_times(c, max_hops);
                cist.msg_flags = c.flags;
            }
            Bpdu::Mst(m) => {
                let cist = &mut p.trees[CIST];
                if internal {
                    cist.msg_priority = PriorityVector {
                        root_id: m.cist.root_id,
                        external_root_path_cost: m.cist.external_root_path_cost,
                        regional_root_id: m.cist.regional_root_id,
                        internal_root_path_cost: m.internal_root_path_cost,
                        designated_bridge_id: m.cist_bridge_id,
                        designated_port_id: m.cist.port_id,
                    };
                    cist.msg_times = cist_times(&m.cist, m.cist_remaining_hops);
                } else {
                    cist.msg_priority = external_priority(&m.cist, m.cist_bridge_id);
                    cist.msg_times = cist_times(&m.cist, max_hops);
                }
                cist.msg_flags = m.cist.flags;
            }
        }
        p.trees[CIST].rcvd_msg = true;

        if let (true, Bpdu::Mst(m)) = (internal, &bpdu) {
            let cist_times = p.trees[CIST].msg_times;
            for msg in &m.mstis {
                let tree = msg.mstid() as usize;
                if tree == CIST || tree >= p.trees.len() {
                    continue;
                }
                let x = &mut p.trees[tree];
                x.msg_priority = msti_priority(m, msg);
                x.msg_times = Times {
                    remaining_hops: msg.remaining_hops,
                    ..cist_times
                };
                x.msg_flags = msg.flags;
                x.rcvd_msg = true;
            }
        }
        p.rcvd = Some(bpdu);
    }

    /// setReRootTree.
    pub(crate) fn set_re_root_tree(&mut self, tree: usize) {
        for p in self.ports.iter_mut() {
            p.trees[tree].re_root = true;
        }
    }

    /// setSelectedTree: only once no port of the tree wants reselection.
    pub(crate) fn set_selected_tree(&mut self, tree: usize) {
        if self.ports.iter().any(|p| p.trees[tree].reselect) {
            return;
        }
        for p in self.ports.iter_mut() {
            p.trees[tree].selected = true;
        }
    }

    /// setSyncTree.
    pub(crate) fn set_sync_tree(&mut self, tree: usize) {
        for p in self.ports.iter_mut() {
            p.trees[tree].sync = true;
        }
    }

    /// setTcFlags.
    pub(crate) fn set_tc_flags(&mut self, port: usize, tree: usize) {
        let config = matches!(self.ports[port].rcvd, Some(Bpdu::Config(_)));
        let p = &mut self.ports[port];
        let flags = p.trees[tree].msg_flags;
        if tree == CIST {
            if flags.tc() {
                p.trees[CIST].rcvd_tc = true;
                if !p.rcvd_internal {
                    for x in p.trees[1..].iter_mut() {
                        x.rcvd_tc = true;
                    }
                }
            }
            if config && flags.tca() {
                p.rcvd_tc_ack = true;
            }
        } else if flags.tc() {
            p.trees[tree].rcvd_tc = true;
        }
    }

    /// setTcPropTree: ask every other port of the tree to propagate a change,
    /// unless this port is restrictedTcn.
    pub(crate) fn set_tc_prop_tree(&mut self, port: usize, tree: usize) {
        if self.ports[port].restricted_tcn {
            return;
        }
        for (q, p) in self.ports.iter_mut().enumerate() {
            if q != port {
                p.trees[tree].tc_prop = true;
            }
        }
    }

    /// syncMaster: restart agreements on every internal port of every MSTI.
    pub(crate) fn sync_master(&mut self) {
        for p in self.ports.iter_mut() {
            if !p.info_internal {
                continue;
            }
            for x in p.trees[1..].iter_mut() {
                x.agree = false;
                x.agreed = false;
                x.synced = false;
                x.sync = true;
            }
        }
    }

    /// updtBPDUVersion.
    pub(crate) fn updt_bpdu_version(&mut self, port: usize) {
        let p = &mut self.ports[port];
        match &p.rcvd {
            Some(Bpdu::Config(_)) | Some(Bpdu::Tcn) => p.rcvd_stp = true,
            Some(Bpdu::Rst(_)) | Some(Bpdu::Mst(_)) => p.rcvd_rstp = true,
            None => {}
        }
    }

    /// updtRcvdInfoWhile.
    pub(crate) fn updt_rcvd_info_while(&mut self, port: usize, tree: usize) {
        let hello = self.port_hello_time(port);
        let p = &mut self.ports[port];
        let internal = p.info_internal;
        let x = &mut p.trees[tree];
        let t = x.port_times;
        let alive = if tree == CIST && !internal {
            t.message_age + 1 <= t.max_age
        } else {
            t.remaining_hops > 1
        };
        x.rcvd_info_while = if alive { 3 * hello } else { 0 };
    }

    /// updtRoleDisabledTree.
    pub(crate) fn updt_role_disabled_tree(&mut self, tree: usize) {
        for p in self.ports.iter_mut() {
            p.trees[tree].selected_role = PortRole::Disabled;
        }
    }

    // -- transmission --

    /// txConfig.
    pub(crate) fn tx_config<H: Host>(&mut self, host: &mut H, port: usize) {
        let p = &self.ports[port];
        let cist = &p.trees[CIST];
        let flags = Flags::default()
            .with_tc(cist.tc_while != 0)
            .with_tca(p.tc_ack);
        let bpdu = Bpdu::Config(self.cist_message(port, flags));
        self.transmit(host, port, &bpdu);
    }

    /// txTcn.
    pub(crate) fn tx_tcn<H: Host>(&mut self, host: &mut H, port: usize) {
        self.transmit(host, port, &Bpdu::Tcn);
    }

    /// txRstp: an RST BPDU, or an MST BPDU when running MSTP.
    pub(crate) fn tx_rstp<H: Host>(&mut self, host: &mut H, port: usize) {
        let p = &self.ports[port];
        let cist = &p.trees[CIST];
        let flags = Flags::default()
            .with_tc(cist.tc_while != 0)
            .with_proposal(cist.proposing)
            .with_role(FlagRole::from_role(cist.role))
            .with_learning(cist.learning)
            .with_forwarding(cist.forwarding)
            .with_agreement(cist.agree);
        let message = self.cist_message(port, flags);

        let bpdu = if !self.mstp() {
            Bpdu::Rst(message)
        } else {
            let mstis = p.trees[1..]
                .iter()
                .enumerate()
                .map(|(i, x)| {
                    let flags = Flags::default()
                        .with_tc(x.tc_while != 0)
                        .with_proposal(x.proposing)
                        .with_role(FlagRole::from_role(x.role))
                        .with_learning(x.learning)
                        .with_forwarding(x.forwarding)
                        .with_agreement(x.agree)
                        .with_master(x.master);
                    MstiConfigMessage {
                        flags,
                        regional_root_id: x.designated_priority.regional_root_id,
                        internal_root_path_cost: x.designated_priority.internal_root_path_cost,
                        bridge_priority: self.trees[i + 1].bridge_id.priority_nibble(),
                        port_priority: x.port_id.priority() >> 4,
                        remaining_hops: x.designated_times.remaining_hops,
                    }
                })
                .collect();
            Bpdu::Mst(MstBpdu {
                cist: message,
                mst_config_id: self.mst_config_id,
                internal_root_path_cost: cist.designated_priority.internal_root_path_cost,
                cist_bridge_id: cist.designated_priority.designated_bridge_id,
                cist_remaining_hops: cist.designated_times.remaining_hops,
                mstis,
            })
        };
        self.transmit(host, port, &bpdu);
    }

    /// The CIST part of an outgoing BPDU. The bridge identifier field carries
    /// the CIST regional root, so a region looks like one bridge from outside.
    fn cist_message(&self, port: usize, flags: Flags) -> CistBpdu {
        let cist = &self.ports[port].trees[CIST];
        let dp = &cist.designated_priority;
        let dt = &cist.designated_times;
        CistBpdu {
            flags,
            root_id: dp.root_id,
            external_root_path_cost: dp.external_root_path_cost,
            regional_root_id: dp.regional_root_id,
            port_id: dp.designated_port_id,
            message_age: dt.message_age,
            max_age: dt.max_age,
            hello_time: dt.hello_time,
            forward_delay: dt.forward_delay,
        }
    }

    fn transmit<H: Host>(&mut self, host: &mut H, port: usize, bpdu: &Bpdu) {
        let len = bpdu.encoded_len();
        let written = match host.transmit_get_buffer(port, len, self.now) {
            Some(buf) if buf.len() >= len => {
                bpdu.encode(buf);
                true
            }
            _ => false,
        };
        let stats = &mut self.ports[port].stats;
        if !written {
            stats.tx_dropped += 1;
            warn!(port, kind = ?bpdu.kind(), len, "no transmit buffer, BPDU dropped");
            return;
        }
        host.transmit_release_buffer(port, self.now);
        stats.count_tx(bpdu.kind());
        debug!(port, kind = ?bpdu.kind(), "BPDU sent");
    }
}

/// Whether received times differ from stored ones. MSTIs carry hops only.
fn times_differ(tree: usize, msg: &Times, stored: &Times) -> bool {
    if tree == CIST {
        msg.message_age != stored.message_age
            || msg.max_age != stored.max_age
            || msg.hello_time.max(1) != stored.hello_time
            || msg.forward_delay != stored.forward_delay
            || msg.remaining_hops != stored.remaining_hops
    } else {
        msg.remaining_hops != stored.remaining_hops
    }
}

/// The CIST message priority of a BPDU from another region: the designated
/// bridge stands in for the regional root.
fn external_priority(c: &CistBpdu, designated: BridgeId) -> PriorityVector {
    PriorityVector {
        root_id: c.root_id,
        external_root_path_cost: c.external_root_path_cost,
        regional_root_id: designated,
        internal_root_path_cost: 0,
        designated_bridge_id: designated,
        designated_port_id: c.port_id,
    }
}

fn cist_times(c: &CistBpdu, remaining_hops: u8) -> Times {
    Times {
        message_age: c.message_age,
        max_age: c.max_age,
        hello_time: c.hello_time,
        forward_delay: c.forward_delay,
        remaining_hops,
    }
}

/// The message priority of an MSTI message. Designated bridge and port are
/// the CIST ones with the priorities the message carries.
fn msti_priority(m: &MstBpdu, msg: &MstiConfigMessage) -> PriorityVector {
    let mut designated = m.cist_bridge_id;
    designated.set_priority_nibble(msg.bridge_priority);
    designated.set_sys_id_ext(msg.mstid());
    PriorityVector {
        regional_root_id: msg.regional_root_id,
        internal_root_path_cost: msg.internal_root_path_cost,
        designated_bridge_id: designated,
        designated_port_id: PortId(((msg.port_priority as u16) << 12) | m.cist.port_id.number()),
        ..Default::default()
    }
}
