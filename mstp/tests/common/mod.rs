#![allow(dead_code)]

use std::collections::HashMap;

use mstp::ether::{encode_bpdu_frame, strip_bpdu_frame, EtherAddr};
use mstp::{Bridge, BridgeConfig, FlushType, Host, PortRole, PortState};

/// Frames moved per `deliver` call before the network is declared looping.
const MAX_DELIVERIES: usize = 100_000;

/// A host that keeps every effect the bridge asks for.
#[derive(Debug)]
pub struct RecordingHost {
    pub address: EtherAddr,
    pub trapping: bool,
    pub learning: HashMap<(usize, usize), bool>,
    pub forwarding: HashMap<(usize, usize), bool>,
    pub flushes: Vec<(usize, usize, FlushType)>,
    pub topology_changes: Vec<(usize, usize)>,
    pub notified: Vec<(usize, usize)>,
    pub role_changes: Vec<(usize, usize, PortRole)>,
    /// Frames waiting to be carried, with the port they left on.
    pub outbox: Vec<(usize, Vec<u8>)>,
    buf: Vec<u8>,
}

impl RecordingHost {
    pub fn new(address: EtherAddr) -> Self {
        RecordingHost {
            address,
            trapping: false,
            learning: HashMap::new(),
            forwarding: HashMap::new(),
            flushes: Vec::new(),
            topology_changes: Vec::new(),
            notified: Vec::new(),
            role_changes: Vec::new(),
            outbox: Vec::new(),
            buf: Vec::new(),
        }
    }

    pub fn is_forwarding(&self, port: usize, tree: usize) -> bool {
        self.forwarding.get(&(port, tree)).copied().unwrap_or(false)
    }
}

impl Host for RecordingHost {
    fn enable_bpdu_trapping(&mut self, enable: bool, _timestamp: u32) {
        self.trapping = enable;
    }

    fn enable_learning(&mut self, port: usize, tree: usize, enable: bool, _timestamp: u32) {
        self.learning.insert((port, tree), enable);
    }

    fn enable_forwarding(&mut self, port: usize, tree: usize, enable: bool, _timestamp: u32) {
        self.forwarding.insert((port, tree), enable);
    }

    fn transmit_get_buffer(&mut self, _port: usize, size: usize, _timestamp: u32) -> Option<&mut [u8]> {
        self.buf = vec![0; size];
        Some(&mut self.buf[..])
    }

    fn transmit_release_buffer(&mut self, port: usize, _timestamp: u32) {
        let frame = encode_bpdu_frame(self.address, &self.buf);
        self.outbox.push((port, frame));
    }

    fn flush_fdb(&mut self, port: usize, tree: usize, flush_type: FlushType, _timestamp: u32) {
        self.flushes.push((port, tree, flush_type));
    }

    fn on_topology_change(&mut self, port: usize, tree: usize, _timestamp: u32) {
        self.topology_changes.push((port, tree));
    }

    fn on_notified_topology_change(&mut self, port: usize, tree: usize, _timestamp: u32) {
        self.notified.push((port, tree));
    }

    fn on_port_role_changed(&mut self, port: usize, tree: usize, role: PortRole, _timestamp: u32) {
        self.role_changes.push((port, tree, role));
    }
}

#[derive(Debug, Clone, Copy)]
struct Link {
    a: (usize, usize),
    b: (usize, usize),
    /// Frames are carried; a cut link drops them while both ends stay up.
    carrying: bool,
    up: bool,
}

/// A LAN of bridges joined by point-to-point links, driven by a shared clock.
#[derive(Debug, Default)]
pub struct Network {
    pub bridges: Vec<Bridge<RecordingHost>>,
    links: Vec<Link>,
    pub now: u32,
}

/// A locally administered address ending in `last`.
pub fn addr(last: u8) -> EtherAddr {
    EtherAddr([0x02, 0x00, 0x00, 0x00, 0x00, last])
}

impl Network {
    pub fn new() -> Self {
        Network::default()
    }

    /// Add a bridge built from `config` and start it. Returns its index.
    pub fn add_bridge(&mut self, config: &BridgeConfig) -> usize {
        let mut bridge = Bridge::new(config, RecordingHost::new(config.address)).unwrap();
        bridge.start(self.now);
        self.bridges.push(bridge);
        self.bridges.len() - 1
    }

    /// Add a started bridge with `ports` ports and default settings.
    pub fn add_default_bridge(&mut self, last: u8, ports: usize) -> usize {
        self.add_bridge(&BridgeConfig::new(addr(last), ports))
    }

    /// Join port `a.1` of bridge `a.0` with port `b.1` of bridge `b.0` by a
    /// full duplex link and bring both ends up. Returns the link index.
    pub fn connect(&mut self, a: (usize, usize), b: (usize, usize), speed_mbps: u32) -> usize {
        self.links.push(Link {
            a,
            b,
            carrying: true,
            up: true,
        });
        self.bridges[a.0].on_port_enabled(a.1, speed_mbps, true, self.now);
        self.bridges[b.0].on_port_enabled(b.1, speed_mbps, true, self.now);
        self.deliver();
        self.links.len() - 1
    }

    /// Take a link down at both ends.
    pub fn disconnect(&mut self, link: usize) {
        let Link { a, b, .. } = self.links[link];
        self.links[link].up = false;
        self.bridges[a.0].on_port_disabled(a.1, self.now);
        self.bridges[b.0].on_port_disabled(b.1, self.now);
        self.deliver();
    }

    /// Stop carrying frames over a link without telling either end.
    pub fn cut(&mut self, link: usize) {
        self.links[link].carrying = false;
    }

    fn peer(&self, from: (usize, usize)) -> Option<(usize, usize)> {
        self.links
            .iter()
            .filter(|l| l.up && l.carrying)
            .find_map(|l| {
                if l.a == from {
                    Some(l.b)
                } else if l.b == from {
                    Some(l.a)
                } else {
                    None
                }
            })
    }

    /// Carry frames until no bridge has anything left to send. Frames sent
    /// on unconnected ports are lost.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            let mut frames = Vec::new();
            for (i, bridge) in self.bridges.iter_mut().enumerate() {
                for (port, frame) in std::mem::take(&mut bridge.host_mut().outbox) {
                    frames.push(((i, port), frame));
                }
            }
            if frames.is_empty() {
                return delivered;
            }
            for (from, frame) in frames {
                if let Some((bridge, port)) = self.peer(from) {
                    let bpdu = strip_bpdu_frame(&frame).unwrap();
                    self.bridges[bridge].on_bpdu_received(port, bpdu, self.now);
                    delivered += 1;
                    assert!(delivered < MAX_DELIVERIES, "frames keep circulating");
                }
            }
        }
    }

    /// Let `seconds` seconds pass, carrying frames after every tick.
    pub fn run_for(&mut self, seconds: u32) {
        for _ in 0..seconds {
            self.now += 1;
            for bridge in self.bridges.iter_mut() {
                bridge.on_one_second_tick(self.now);
            }
            self.deliver();
        }
    }

    pub fn roles(&self, bridge: usize, tree: usize) -> Vec<PortRole> {
        let b = &self.bridges[bridge];
        (0..b.port_count())
            .map(|port| b.port_role(port, tree).unwrap())
            .collect()
    }

    pub fn states(&self, bridge: usize, tree: usize) -> Vec<PortState> {
        let b = &self.bridges[bridge];
        (0..b.port_count())
            .map(|port| b.port_state(port, tree).unwrap())
            .collect()
    }
}
