use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mstp::ether::EtherAddr;
use mstp::{Bridge, BridgeConfig, FlushType, Host, PortRole};

/// Keeps transmitted BPDUs until the ring carries them.
struct Wire {
    outbox: Vec<(usize, Vec<u8>)>,
    buf: Vec<u8>,
}

impl Host for Wire {
    fn enable_bpdu_trapping(&mut self, _enable: bool, _timestamp: u32) {}

    fn enable_learning(&mut self, _port: usize, _tree: usize, _enable: bool, _timestamp: u32) {}

    fn enable_forwarding(&mut self, _port: usize, _tree: usize, _enable: bool, _timestamp: u32) {}

    fn transmit_get_buffer(&mut self, _port: usize, size: usize, _timestamp: u32) -> Option<&mut [u8]> {
        self.buf.resize(size, 0);
        Some(&mut self.buf[..])
    }

    fn transmit_release_buffer(&mut self, port: usize, _timestamp: u32) {
        self.outbox.push((port, self.buf.clone()));
    }

    fn flush_fdb(&mut self, _port: usize, _tree: usize, _flush_type: FlushType, _timestamp: u32) {}
}

// Bridges on a ring, port 1 of bridge i wired to port 0 of bridge i + 1.
fn ring(size: u8, msti_count: usize) -> Vec<Bridge<Wire>> {
    (0..size)
        .map(|i| {
            let mut config = BridgeConfig::new(EtherAddr([0x02, 0, 0, 0, 0, i + 1]), 2);
            config.msti_count = msti_count;
            config.mst_config_name = Some("ring".to_string());
            let host = Wire {
                outbox: Vec::new(),
                buf: Vec::new(),
            };
            Bridge::new(&config, host).unwrap()
        })
        .collect()
}

fn deliver(bridges: &mut [Bridge<Wire>], now: u32) {
    let n = bridges.len();
    loop {
        let mut frames = Vec::new();
        for i in 0..n {
            for (port, bpdu) in std::mem::take(&mut bridges[i].host_mut().outbox) {
                let peer = if port == 1 { ((i + 1) % n, 0) } else { ((i + n - 1) % n, 1) };
                frames.push((peer, bpdu));
            }
        }
        if frames.is_empty() {
            return;
        }
        for ((bridge, port), bpdu) in frames {
            bridges[bridge].on_bpdu_received(port, &bpdu, now);
        }
    }
}

fn converge(size: u8, msti_count: usize) -> usize {
    let mut bridges = ring(size, msti_count);
    for bridge in bridges.iter_mut() {
        bridge.start(0);
        bridge.on_port_enabled(0, 1000, true, 0);
        bridge.on_port_enabled(1, 1000, true, 0);
    }
    deliver(&mut bridges, 0);
    for now in 1..=5 {
        for bridge in bridges.iter_mut() {
            bridge.on_one_second_tick(now);
        }
        deliver(&mut bridges, now);
    }
    bridges
        .iter()
        .flat_map(|b| (0..2).map(move |p| b.port_role(p, 0)))
        .filter(|role| *role == Ok(PortRole::Alternate))
        .count()
}

pub fn b1(c: &mut Criterion) {
    c.bench_function("ring_8_cist", |b| {
        b.iter(|| converge(black_box(8), 0))
    });
}

pub fn b2(c: &mut Criterion) {
    c.bench_function("ring_8_msti_4", |b| {
        b.iter(|| converge(black_box(8), 4))
    });
}

criterion_group!(benches, b1, b2);
criterion_main!(benches);
