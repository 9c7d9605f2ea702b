use serde::{Deserialize, Serialize};

use super::{BridgeId, PortId};

/// A spanning tree priority vector.
///
/// Vectors are totally ordered by comparing the six components in declaration
/// order; a smaller vector is a better one. MSTI vectors leave `root_id` and
/// `external_root_path_cost` at zero since only the CIST spans regions.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Serialize, Deserialize,
)]
pub struct PriorityVector {
    /// CIST root identifier.
    pub root_id: BridgeId,
    /// Cost to the CIST root across region boundaries.
    pub external_root_path_cost: u32,
    /// CIST regional root, or the MSTI regional root.
    pub regional_root_id: BridgeId,
    /// Cost to the regional root within the region.
    pub internal_root_path_cost: u32,
    /// Bridge transmitting the information.
    pub designated_bridge_id: BridgeId,
    /// Port of the designated bridge transmitting the information.
    pub designated_port_id: PortId,
}

impl PriorityVector {
    /// The bridge priority vector of the CIST: the bridge as root, regional root,
    /// and designated bridge with zero costs.
    pub fn cist_bridge(bridge_id: BridgeId) -> Self {
        PriorityVector {
            root_id: bridge_id,
            external_root_path_cost: 0,
            regional_root_id: bridge_id,
            internal_root_path_cost: 0,
            designated_bridge_id: bridge_id,
            designated_port_id: PortId(0),
        }
    }

    /// The bridge priority vector of an MSTI.
    pub fn msti_bridge(bridge_id: BridgeId) -> Self {
        PriorityVector {
            regional_root_id: bridge_id,
            designated_bridge_id: bridge_id,
            ..Default::default()
        }
    }

    /// Whether a message carrying `self` supersedes the stored `port` vector.
    ///
    /// The message wins when it is better, or when it comes from the same
    /// designated bridge and port number, in which case it replaces whatever
    /// that port sent before even if it got worse.
    pub fn is_superior_to(&self, port: &PriorityVector) -> bool {
        self < port
            || (self.designated_bridge_id.same_bridge(&port.designated_bridge_id)
                && self.designated_port_id.number() == port.designated_port_id.number())
    }

    /// Whether both vectors agree on the CIST root, external root path cost and
    /// regional root.
    pub fn same_root_and_region(&self, other: &PriorityVector) -> bool {
        self.root_id == other.root_id
            && self.external_root_path_cost == other.external_root_path_cost
            && self.regional_root_id == other.regional_root_id
    }
}

/// The timer values carried alongside a priority vector, in whole seconds.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Times {
    /// Age of the information since the root sent it.
    pub message_age: u16,
    /// Age at which the information is discarded.
    pub max_age: u16,
    /// Interval between periodic transmissions.
    pub hello_time: u16,
    /// Delay spent in each of the Discarding and Learning states.
    pub forward_delay: u16,
    /// Hops left before the information is discarded inside a region.
    pub remaining_hops: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ether::EtherAddr;
    use proptest::prelude::*;

    fn bid(prio: u16, last: u8) -> BridgeId {
        BridgeId::new(prio, 0, EtherAddr([0, 0, 0, 0, 0, last]))
    }

    #[test]
    fn field_order_is_the_tie_break_order() {
        let base = PriorityVector::cist_bridge(bid(32768, 1));

        let lower_root = PriorityVector {
            root_id: bid(4096, 9),
            external_root_path_cost: u32::MAX,
            ..base
        };
        assert!(lower_root < base);

        let cheaper = PriorityVector {
            external_root_path_cost: 10,
            internal_root_path_cost: 0,
            ..base
        };
        let dearer_external = PriorityVector {
            external_root_path_cost: 20,
            ..base
        };
        assert!(cheaper < dearer_external);

        let same_cost_lower_port = PriorityVector {
            designated_port_id: PortId::new(128, 1),
            ..base
        };
        let same_cost_higher_port = PriorityVector {
            designated_port_id: PortId::new(128, 2),
            ..base
        };
        assert!(same_cost_lower_port < same_cost_higher_port);
    }

    #[test]
    fn superior_from_same_designated_port() {
        let stored = PriorityVector {
            root_id: bid(4096, 1),
            external_root_path_cost: 10,
            designated_bridge_id: bid(32768, 2),
            designated_port_id: PortId::new(128, 3),
            ..Default::default()
        };
        let worse_same_sender = PriorityVector {
            external_root_path_cost: 50,
            designated_port_id: PortId::new(64, 3),
            ..stored
        };
        assert!(worse_same_sender > stored);
        assert!(worse_same_sender.is_superior_to(&stored));

        let worse_other_sender = PriorityVector {
            designated_port_id: PortId::new(128, 4),
            ..worse_same_sender
        };
        assert!(!worse_other_sender.is_superior_to(&stored));
    }

    fn arb_vector() -> impl Strategy<Value = PriorityVector> {
        (
            any::<u64>(),
            0u32..4,
            any::<u64>(),
            0u32..4,
            0u64..4,
            0u16..4,
        )
            .prop_map(|(r, erc, rr, irc, d, p)| PriorityVector {
                root_id: BridgeId::from_u64(r % 4),
                external_root_path_cost: erc,
                regional_root_id: BridgeId::from_u64(rr % 4),
                internal_root_path_cost: irc,
                designated_bridge_id: BridgeId::from_u64(d),
                designated_port_id: PortId(p),
            })
    }

    proptest! {
        #[test]
        fn total_order(a in arb_vector(), b in arb_vector(), c in arb_vector()) {
            let outcomes = [a < b, a == b, b < a];
            prop_assert_eq!(outcomes.iter().filter(|o| **o).count(), 1);
            if a < b && b < c {
                prop_assert!(a < c);
            }
            if a == b {
                prop_assert_eq!(a.root_id, b.root_id);
                prop_assert_eq!(a.designated_port_id, b.designated_port_id);
            }
        }
    }
}
