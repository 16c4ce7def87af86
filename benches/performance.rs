//! Performance benchmarks for the adbmap scanner

use adbmap::{
    protocol::message::{AdbMessage, Command, MessageHeader, A_VERSION, HEADER_LEN, MAX_PAYLOAD},
    utils::target_parser::{parse_target_list, TargetParser},
    ConnectError, ConnectionProvider, NetworkMapper, ProtocolError, ProtocolSession,
};
use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Even hosts accept connections after `latency`; every fourth speaks the protocol
struct SimulatedNetwork {
    latency: Duration,
}

#[async_trait]
impl ConnectionProvider for SimulatedNetwork {
    type Address = Ipv4Addr;
    type Connection = Ipv4Addr;

    async fn connect(&self, addr: &Ipv4Addr) -> Result<Ipv4Addr, ConnectError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if addr.octets()[3] % 2 == 1 {
            return Err(ConnectError::Refused);
        }
        Ok(*addr)
    }
}

struct SimulatedSession(Ipv4Addr);

#[async_trait]
impl ProtocolSession for SimulatedSession {
    async fn supports_protocol(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.0.octets()[3] % 4 == 0)
    }
}

fn subnet(size: u32) -> Vec<Ipv4Addr> {
    let base = u32::from(Ipv4Addr::new(10, 0, 0, 0));
    (0..size).map(|i| Ipv4Addr::from(base + i)).collect()
}

/// Benchmark ADB message encoding and header decoding
fn bench_message_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_codec");

    group.bench_function("encode_cnxn", |b| {
        b.iter(|| black_box(AdbMessage::connect(black_box("host::")).encode()))
    });

    let reply = AdbMessage::new(Command::Connect, A_VERSION, MAX_PAYLOAD, &b"device::"[..]).encode();
    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(&reply[..HEADER_LEN]);
    group.bench_function("decode_header", |b| {
        b.iter(|| black_box(MessageHeader::decode(black_box(&raw))))
    });

    group.finish();
}

/// Benchmark target expansion
fn bench_target_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_parsing");
    let parser = TargetParser::new(5555, 65536, false);

    for cidr in ["192.168.1.0/24", "10.0.0.0/20", "10.0.0.0/16"] {
        group.bench_with_input(BenchmarkId::new("expand_cidr", cidr), &cidr, |b, cidr| {
            b.iter(|| black_box(parse_target_list(&[*cidr], &parser)))
        });
    }

    group.finish();
}

/// Benchmark mapper overhead with instant collaborators
fn bench_scan_overhead(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("scan_overhead");
    group.sample_size(20);

    for size in [256u32, 4096] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("instant_hosts", size), &size, |b, &size| {
            let mapper = NetworkMapper::new(
                SimulatedNetwork {
                    latency: Duration::ZERO,
                },
                SimulatedSession,
            );
            let targets = subnet(size);
            let (mapper, targets) = (&mapper, &targets);
            b.to_async(&rt)
                .iter(move || async move { black_box(mapper.scan(targets.clone()).await) })
        });
    }

    group.finish();
}

/// Benchmark how in-flight capacity hides per-host latency
fn bench_concurrent_scan(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("concurrent_scan");
    group.sample_size(10); // Each iteration sleeps through simulated latency

    let targets = subnet(256);
    for max_in_flight in [16usize, 64, 256] {
        group.bench_with_input(
            BenchmarkId::new("latency_5ms", max_in_flight),
            &max_in_flight,
            |b, &max_in_flight| {
                let mapper = NetworkMapper::new(
                    SimulatedNetwork {
                        latency: Duration::from_millis(5),
                    },
                    SimulatedSession,
                )
                .with_max_in_flight(max_in_flight);
                let (mapper, targets) = (&mapper, &targets);
                b.to_async(&rt)
                    .iter(move || async move { black_box(mapper.scan(targets.clone()).await) })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_message_codec,
    bench_target_parsing,
    bench_scan_overhead,
    bench_concurrent_scan
);

criterion_main!(benches);
