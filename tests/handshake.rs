//! End-to-end handshake and record-layer tests, driving two `Connection`s
//! against each other over an in-memory byte pipe (no socket exists to test
//! against, per the crate's sans-I/O design).

use std::sync::Arc;

use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPublicKey};
// Shadows the prelude's `#[test]` so every test below logs through
// `env_logger`, initialized once, with output only shown on failure.
use test_log::test;

use tls12_engine::client::Client;
use tls12_engine::context::State;
use tls12_engine::crypto::{DefaultCryptoBackend, DefaultRsaPrivateKey};
use tls12_engine::server::Server;
use tls12_engine::Connection;

// A fixed 1024-bit test key, generated once offline. Keeping handshake tests
// independent of RSA keygen time.
const TEST_PRIVATE_KEY_DER: &[u8] = include_bytes!("test_key.der");

fn test_server() -> (Server, Vec<u8>) {
    let private_key = rsa::RsaPrivateKey::from_pkcs1_der(TEST_PRIVATE_KEY_DER).expect("valid test key");
    let public_key_der = private_key
        .to_public_key()
        .to_pkcs1_der()
        .expect("PKCS#1 encoding never fails for a valid key")
        .as_bytes()
        .to_vec();
    let cert_der = build_test_certificate(&public_key_der);
    let backend = Arc::new(DefaultCryptoBackend);
    let server = Server::new(backend, cert_der, Arc::new(DefaultRsaPrivateKey(private_key)));
    (server, public_key_der)
}

/// A minimal self-signed-looking DER certificate. Certificate signature
/// verification is out of scope for the engine, so only a well-formed SPKI
/// wrapping a real RSA key matters here.
fn build_test_certificate(rsa_public_key_pkcs1_der: &[u8]) -> Vec<u8> {
    fn der_len(n: usize) -> Vec<u8> {
        if n < 0x80 {
            vec![n as u8]
        } else {
            let bytes = n.to_be_bytes();
            let trimmed: Vec<u8> = bytes.iter().skip_while(|&&b| b == 0).copied().collect();
            let mut out = vec![0x80 | trimmed.len() as u8];
            out.extend_from_slice(&trimmed);
            out
        }
    }
    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend_from_slice(&der_len(content.len()));
        out.extend_from_slice(content);
        out
    }
    fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
        tlv(0x30, &parts.concat())
    }
    fn set(parts: &[Vec<u8>]) -> Vec<u8> {
        tlv(0x31, &parts.concat())
    }
    fn oid(arcs_der: &[u8]) -> Vec<u8> {
        tlv(0x06, arcs_der)
    }
    fn null() -> Vec<u8> {
        tlv(0x05, &[])
    }
    fn integer_small(v: u64) -> Vec<u8> {
        tlv(0x02, &v.to_be_bytes())
    }
    fn printable_string(s: &str) -> Vec<u8> {
        tlv(0x13, s.as_bytes())
    }
    fn utc_time(s: &str) -> Vec<u8> {
        tlv(0x17, s.as_bytes())
    }
    fn bit_string(bytes: &[u8]) -> Vec<u8> {
        let mut content = vec![0u8];
        content.extend_from_slice(bytes);
        tlv(0x03, &content)
    }

    const RSA_ENCRYPTION_OID: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
    const SHA256_WITH_RSA_OID: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B];
    const COMMON_NAME_OID: [u8; 3] = [0x55, 0x04, 0x03];

    let rdn = sequence(&[set(&[sequence(&[oid(&COMMON_NAME_OID), printable_string("localhost")])])]);
    let signature_alg = sequence(&[oid(&SHA256_WITH_RSA_OID), null()]);
    let spki = sequence(&[sequence(&[oid(&RSA_ENCRYPTION_OID), null()]), bit_string(rsa_public_key_pkcs1_der)]);
    let validity = sequence(&[utc_time("250101000000Z"), utc_time("350101000000Z")]);
    let tbs = sequence(&[integer_small(1), signature_alg.clone(), rdn.clone(), validity, rdn, spki]);
    let signature_value = bit_string(&[0u8; 32]);
    sequence(&[tbs, signature_alg, signature_value])
}

/// Shuttles every queued record between two connections until neither has
/// anything left to send. Bounded so a stuck driver fails the test instead
/// of hanging it.
fn pump(a: &mut Connection, b: &mut Connection) {
    for _ in 0..64 {
        let mut moved = false;
        while let Some(record) = a.next_record() {
            moved = true;
            a_feed(b, &record);
        }
        while let Some(record) = b.next_record() {
            moved = true;
            a_feed(a, &record);
        }
        if !moved {
            return;
        }
    }
    panic!("pump exceeded round budget; handshake likely stuck");
}

fn a_feed(conn: &mut Connection, record: &[u8]) {
    conn.feed(record).expect("feed() reports errors via on_error, never Err");
}

fn full_handshake(client: &Client, server: &Server) -> (Connection, Connection) {
    let mut client_conn = client.new_connection(Some("localhost"));
    let mut server_conn = server.new_connection();
    client_conn.start().unwrap();
    pump(&mut client_conn, &mut server_conn);
    (client_conn, server_conn)
}

#[test]
fn full_handshake_reaches_open_on_both_sides() {
    let (server, _) = test_server();
    let client = Client::default();
    let (client_conn, server_conn) = full_handshake(&client, &server);
    assert_eq!(client_conn.state(), State::Open);
    assert_eq!(server_conn.state(), State::Open);
}

// The client offers `TLS_RSA_WITH_AES_128_CBC_SHA` first
// (`cipher_suite::KNOWN_SUITES` order), and the server picks the first
// suite it recognizes from that list, so a default handshake negotiates
// the block-cipher suite, not the null cipher.
#[test]
fn application_data_round_trips_over_negotiated_cipher() {
    let (server, _) = test_server();
    let client = Client::default();
    let (mut client_conn, mut server_conn) = full_handshake(&client, &server);

    let received = Arc::new(std::sync::Mutex::new(Vec::new()));
    let received_clone = received.clone();
    server_conn.on_data(move |data| received_clone.lock().unwrap().extend_from_slice(data));

    client_conn.send(b"ping over tls 1.2").unwrap();
    pump(&mut client_conn, &mut server_conn);
    assert_eq!(&received.lock().unwrap()[..], b"ping over tls 1.2");

    let reply = Arc::new(std::sync::Mutex::new(Vec::new()));
    let reply_clone = reply.clone();
    client_conn.on_data(move |data| reply_clone.lock().unwrap().extend_from_slice(data));
    server_conn.send(b"pong").unwrap();
    pump(&mut client_conn, &mut server_conn);
    assert_eq!(&reply.lock().unwrap()[..], b"pong");
}

#[test]
fn close_notify_shuts_down_both_sides() {
    let (server, _) = test_server();
    let client = Client::default();
    let (mut client_conn, mut server_conn) = full_handshake(&client, &server);

    client_conn.close().unwrap();
    pump(&mut client_conn, &mut server_conn);
    assert_eq!(client_conn.state(), State::Closed);
    assert_eq!(server_conn.state(), State::Closed);
}

#[test]
fn session_resumption_succeeds_on_second_handshake() {
    let (server, _) = test_server();
    let client = Client::default();

    let (first_client, first_server) = full_handshake(&client, &server);
    assert_eq!(first_client.state(), State::Open);
    drop(first_client);
    drop(first_server);
    assert_eq!(client.session_cache().len(), 1);
    assert_eq!(server.session_count(), 1);

    let mut second_client = client.new_connection(Some("localhost"));
    let mut second_server = server.new_connection();
    second_client.start().unwrap();
    pump(&mut second_client, &mut second_server);

    assert_eq!(second_client.state(), State::Open);
    assert_eq!(second_server.state(), State::Open);
}

#[test]
fn unknown_server_name_does_not_resume_a_different_hosts_session() {
    let (server, _) = test_server();
    let client = Client::default();
    let _ = full_handshake(&client, &server);

    let mut other_client = client.new_connection(Some("example.org"));
    let mut other_server = server.new_connection();
    other_client.start().unwrap();
    pump(&mut other_client, &mut other_server);
    assert_eq!(other_client.state(), State::Open);
    // A fresh full handshake, not a resumption, since the cache is keyed per
    // server name and "example.org" was never seen before.
    assert_eq!(server.session_count(), 2);
}

#[test]
fn send_before_handshake_completion_is_rejected() {
    let server = test_server().0;
    let mut server_conn = server.new_connection();
    assert_eq!(server_conn.state(), State::Idle);
    assert!(server_conn.send(b"too early").is_err());
}
