use std::{collections::BTreeMap, io::Read, net::UdpSocket, time::Duration};

use chrono::{TimeZone, Utc};
use flate2::read::{GzDecoder, ZlibDecoder};
use gelf_codecs::{Compression, encoding::chunking::ChunkHeader};
use gelf_emitter::{BuildContext, FieldValue, GelfError, GelfSinkConfig, Level, NetError};
use serde_json::Value;

fn receiver() -> (UdpSocket, String) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let address = socket.local_addr().unwrap().to_string();
    (socket, address)
}

fn context() -> BuildContext {
    BuildContext::new("integration")
        .with_file("/usr/bin/integration")
        .with_clock(|| Utc.timestamp_opt(1_600_000_000, 0).unwrap())
}

/// Reads datagrams until one full message is available, reassembling chunks.
fn receive_message(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0; 65_535];
    let mut chunks = BTreeMap::new();
    loop {
        let len = socket.recv(&mut buf).unwrap();
        let Some((header, slice)) = ChunkHeader::parse(&buf[..len]) else {
            return buf[..len].to_vec();
        };
        chunks.insert(header.sequence_number, slice.to_vec());
        if chunks.len() == usize::from(header.sequence_count) {
            return chunks.into_values().flatten().collect();
        }
    }
}

fn decode(payload: &[u8], compression: Compression) -> Value {
    let mut json = String::new();
    match compression {
        Compression::Zlib => ZlibDecoder::new(payload).read_to_string(&mut json).unwrap(),
        Compression::Gzip => GzDecoder::new(payload).read_to_string(&mut json).unwrap(),
        Compression::None => return serde_json::from_slice(payload).unwrap(),
    };
    serde_json::from_str(&json).unwrap()
}

#[test]
fn delivers_small_message() {
    let (socket, address) = receiver();
    let sink = GelfSinkConfig::new(address)
        .build()
        .unwrap()
        .with_context(context());

    sink.log([
        ("short_message", FieldValue::from("hello")),
        ("level", FieldValue::from(3)),
        ("request_id", FieldValue::from("abc-123")),
    ])
    .unwrap();

    let json = decode(&receive_message(&socket), Compression::Zlib);
    assert_eq!(json["version"], "1.1");
    assert_eq!(json["host"], "integration");
    assert_eq!(json["timestamp"], 1_600_000_000.0);
    assert_eq!(json["level"], 3);
    assert_eq!(json["facility"], "GELF");
    assert_eq!(json["file"], "/usr/bin/integration");
    assert_eq!(json["short_message"], "hello");
    assert_eq!(json["_request_id"], "abc-123");
}

#[test]
fn delivers_chunked_message() {
    let (socket, address) = receiver();
    let mut config = GelfSinkConfig::new(address);
    config.compression = Compression::Gzip;
    config.max_datagram_size = 512;
    let sink = config.build().unwrap().with_context(context());

    // Xorshift letters; gzip leaves well over 512 bytes.
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let noise: String = (0..6_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            char::from(b'a' + (state % 26) as u8)
        })
        .collect();
    let message = sink
        .create([("short_message", noise.as_str()), ("component", "billing")])
        .unwrap();
    sink.send(&message).unwrap();

    let json = decode(&receive_message(&socket), Compression::Gzip);
    assert_eq!(json["short_message"], noise);
    assert_eq!(json["_component"], "billing");
    assert_eq!(json["level"], i64::from(Level::Alert));
}

#[tokio::test]
async fn delivers_message_async() {
    let (socket, address) = receiver();
    let mut config = GelfSinkConfig::new(address);
    config.compression = Compression::None;
    config.write_timeout_secs = Some(1);
    let sink = config.build().unwrap().with_context(context());

    let message = sink.create([("short_message", "async")]).unwrap();
    sink.send_async(&message).await.unwrap();

    let payload = tokio::task::spawn_blocking(move || receive_message(&socket))
        .await
        .unwrap();
    let json = decode(&payload, Compression::None);
    assert_eq!(json["short_message"], "async");
}

#[test]
fn unresolvable_collector_is_a_transport_error() {
    let sink = GelfSinkConfig::new("collector.invalid:12201")
        .build()
        .unwrap()
        .with_context(context());

    let error = sink.log([("short_message", "lost")]).unwrap_err();
    assert!(matches!(
        error,
        GelfError::Transport {
            source: NetError::FailedToResolve { .. } | NetError::NoAddresses
        }
    ));
}
