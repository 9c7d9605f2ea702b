use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mstp::bpdu::*;
use mstp::types::{BridgeId, MstConfigId, PortId, VlanTable};
use mstp::ProtocolVersion;

// An RST BPDU captured from a root bridge: 6001.000d65adf600, proposal and
// agreement set, designated role.
static RST_BYTES: [u8; 36] = [
    0x00, 0x00, 0x02, 0x02, 0x3c, 0x60, 0x01, 0x00, 0x0d, 0x65, 0xad, 0xf6, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x60, 0x01, 0x00, 0x0d, 0x65, 0xad, 0xf6, 0x00, 0x80, 0x01, 0x00, 0x00, 0x14, 0x00, 0x02,
    0x00, 0x0f, 0x00, 0x00,
];

fn mst_bpdu(msti_count: u16) -> Bpdu {
    let cist = CistBpdu {
        flags: Flags(0x3c),
        root_id: BridgeId::from_u64(0x6001000d65adf600),
        external_root_path_cost: 20_000,
        regional_root_id: BridgeId::from_u64(0x8000000c305dd100),
        port_id: PortId(0x8001),
        message_age: 1,
        max_age: 20,
        hello_time: 2,
        forward_delay: 15,
    };
    let mut table = VlanTable::default();
    for mstid in 1..=msti_count {
        table.set_tree(mstid * 10, mstid).unwrap();
    }
    Bpdu::Mst(MstBpdu {
        cist,
        mst_config_id: MstConfigId::new("bench", 1, &table).unwrap(),
        internal_root_path_cost: 0,
        cist_bridge_id: BridgeId::from_u64(0x8000000c305dd100),
        cist_remaining_hops: 20,
        mstis: (1..=msti_count)
            .map(|mstid| MstiConfigMessage {
                flags: Flags(0x7c),
                regional_root_id: BridgeId::from_u64(0x8000000c305dd100 | ((mstid as u64) << 48)),
                internal_root_path_cost: 20_000,
                bridge_priority: 8,
                port_priority: 8,
                remaining_hops: 19,
            })
            .collect(),
    })
}

pub fn b1(c: &mut Criterion) {
    c.bench_function("classify_rst", |b| {
        b.iter(|| classify(black_box(&RST_BYTES[..]), ProtocolVersion::Mstp))
    });
}

pub fn b2(c: &mut Criterion) {
    c.bench_function("decode_rst", |b| {
        b.iter(|| Bpdu::decode(black_box(&RST_BYTES[..]), ProtocolVersion::Mstp, MAX_MSTI_MESSAGES))
    });
}

pub fn b3(c: &mut Criterion) {
    let bytes = mst_bpdu(16).to_vec();
    c.bench_function("decode_mst_16", |b| {
        b.iter(|| Bpdu::decode(black_box(&bytes[..]), ProtocolVersion::Mstp, MAX_MSTI_MESSAGES))
    });
}

pub fn b4(c: &mut Criterion) {
    let bpdu = mst_bpdu(16);
    let mut buf = vec![0; bpdu.encoded_len()];
    c.bench_function("encode_mst_16", |b| {
        b.iter(|| black_box(&bpdu).encode(&mut buf[..]))
    });
}

criterion_group!(benches, b1, b2, b3, b4);
criterion_main!(benches);
