//! In-process client/server loopback demo: no socket, just a byte pipe
//! between two `Connection`s (spec.md §1 "sans-I/O" — there is nothing
//! transport-specific to demonstrate beyond feeding each side the other's
//! output).

mod cert;

use std::sync::Arc;

use clap::{value_parser, Arg, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use rsa::pkcs1::EncodeRsaPublicKey;

use tls12_engine::cipher_suite;
use tls12_engine::connection::Connection;
use tls12_engine::crypto::{DefaultCryptoBackend, DefaultRsaPrivateKey};
use tls12_engine::client::Client;
use tls12_engine::server::Server;

fn init_logging(level: LevelFilter) {
    let stdout = ConsoleAppender::builder().build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .expect("static log4rs config is well-formed");
    let _ = log4rs::init_config(config);
}

/// Shuttles every queued record between two connections until neither has
/// anything left to say, or one shuts down. A bound on the number of
/// rounds guards against a driver bug turning this into an infinite loop.
fn pump(a: &mut Connection, b: &mut Connection) {
    for _ in 0..64 {
        let mut moved = false;
        while let Some(record) = a.next_record() {
            moved = true;
            if b.feed(&record).is_err() {
                return;
            }
        }
        while let Some(record) = b.next_record() {
            moved = true;
            if a.feed(&record).is_err() {
                return;
            }
        }
        if !moved {
            return;
        }
    }
}

fn run_handshake(
    client: &Client,
    server: &Server,
    server_name: &str,
    cipher_suites: Option<Vec<u16>>,
) -> (Connection, Connection) {
    let mut client_conn = match cipher_suites {
        Some(suites) => client.new_connection_with_cipher_suites(Some(server_name), suites),
        None => client.new_connection(Some(server_name)),
    };
    let mut server_conn = server.new_connection();
    client_conn.start().expect("client handshake start never fails");
    pump(&mut client_conn, &mut server_conn);
    (client_conn, server_conn)
}

fn main() {
    let matches = Command::new("loopback")
        .about("Drives an in-process TLS 1.2 handshake and application data exchange")
        .arg(
            Arg::new("message")
                .long("message")
                .value_parser(value_parser!(String))
                .default_value("ping over tls 1.2"),
        )
        .arg(Arg::new("resume").long("resume").action(clap::ArgAction::SetTrue))
        .arg(
            Arg::new("server-name")
                .long("server-name")
                .value_parser(value_parser!(String))
                .default_value("localhost"),
        )
        .arg(
            Arg::new("cipher-suite")
                .long("cipher-suite")
                .value_parser(value_parser!(String))
                .help("restrict the client's offer to a single registry name, e.g. TLS_RSA_WITH_NULL_SHA"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbose")
                .short('v')
                .action(clap::ArgAction::Count),
        )
        .get_matches();

    let level = match matches.get_count("verbosity") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    init_logging(level);

    let mut rng = rand::thread_rng();
    let private_key = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation");
    let public_key_der = private_key
        .to_public_key()
        .to_pkcs1_der()
        .expect("PKCS#1 encoding of a freshly generated key never fails")
        .as_bytes()
        .to_vec();
    let cert_der = cert::build_self_signed_certificate("localhost", &public_key_der);

    let backend = Arc::new(DefaultCryptoBackend);
    let server = Server::new(
        backend.clone(),
        cert_der,
        Arc::new(DefaultRsaPrivateKey(private_key)),
    );
    let client = Client::new(backend);

    let message = matches.get_one::<String>("message").unwrap();
    let server_name = matches.get_one::<String>("server-name").unwrap();
    let cipher_suites = matches.get_one::<String>("cipher-suite").map(|name| {
        let suite = cipher_suite::lookup_by_name(name).unwrap_or_else(|| panic!("unknown cipher suite {}", name));
        vec![suite.code]
    });

    let (mut client_conn, mut server_conn) = run_handshake(&client, &server, server_name, cipher_suites.clone());
    assert!(client_conn.is_open(), "first handshake did not complete: {:?}", client_conn.state());
    println!("handshake complete (full), state={:?}", client_conn.state());

    server_conn.on_data(|data| {
        println!("server received: {}", String::from_utf8_lossy(data));
    });
    client_conn.send(message.as_bytes()).expect("send after Open never fails");
    pump(&mut client_conn, &mut server_conn);

    client_conn.close().expect("close never fails");
    pump(&mut client_conn, &mut server_conn);

    if matches.get_flag("resume") {
        println!("session cache entries before resumption: {}", client.session_cache().len());
        let (resumed_client, resumed_server) = run_handshake(&client, &server, server_name, cipher_suites);
        println!("second handshake state={:?}", resumed_client.state());
        assert!(resumed_client.is_open(), "resumed handshake did not complete");
        drop(resumed_server);
    }
}
