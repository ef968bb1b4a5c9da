use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use natsd::Broker;

static NEXT_PORT: AtomicU16 = AtomicU16::new(17422);

fn start_broker() -> (std::sync::Arc<Broker>, u16) {
    let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);
    let broker = std::sync::Arc::new(Broker::new("127.0.0.1", port));
    broker.start().expect("broker should start");
    // Give the accept thread a moment to reach listen().
    thread::sleep(Duration::from_millis(50));
    (broker, port)
}

fn connect(port: u16) -> TcpStream {
    let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream
}

fn drain_info(stream: &mut TcpStream) -> String {
    read_line(stream)
}

fn read_line(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).expect("read");
        if n == 0 {
            break;
        }
        out.push(byte[0]);
        if out.ends_with(b"\r\n") {
            break;
        }
    }
    String::from_utf8(out).unwrap()
}

fn read_exact_str(stream: &mut TcpStream, len: usize) -> String {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).expect("read_exact");
    String::from_utf8(buf).unwrap()
}

#[test]
fn ping_gets_ponged() {
    let (broker, port) = start_broker();
    let mut stream = connect(port);
    let info = drain_info(&mut stream);
    assert!(info.starts_with("INFO "));

    stream.write_all(b"PING\r\n").unwrap();
    assert_eq!(read_line(&mut stream), "PONG\r\n");

    broker.stop();
}

#[test]
fn connect_is_acknowledged() {
    let (broker, port) = start_broker();
    let mut stream = connect(port);
    drain_info(&mut stream);

    stream.write_all(b"CONNECT {}\r\n").unwrap();
    assert_eq!(read_line(&mut stream), "+OK\r\n");

    broker.stop();
}

#[test]
fn sub_then_pub_delivers_to_subscriber() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB FOO 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB FOO 5\r\nHello\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    let header = read_line(&mut sub);
    assert_eq!(header, "MSG FOO 1 5\r\n");
    assert_eq!(read_exact_str(&mut sub, 7), "Hello\r\n");

    broker.stop();
}

#[test]
fn pub_with_reply_to_is_forwarded() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB FOO 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB FOO BAR 5\r\nHello\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    assert_eq!(read_line(&mut sub), "MSG FOO 1 BAR 5\r\n");
    assert_eq!(read_exact_str(&mut sub, 7), "Hello\r\n");

    broker.stop();
}

#[test]
fn queue_group_token_is_accepted_but_not_enforced() {
    let (broker, port) = start_broker();

    let mut sub_a = connect(port);
    drain_info(&mut sub_a);
    sub_a.write_all(b"SUB FOO QG 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub_a), "+OK\r\n");

    let mut sub_b = connect(port);
    drain_info(&mut sub_b);
    sub_b.write_all(b"SUB FOO QG 2\r\n").unwrap();
    assert_eq!(read_line(&mut sub_b), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB FOO 2\r\nhi\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    // Both queue members get the message: the broker does not implement
    // load-balanced queue-group delivery, only accepts the token.
    assert_eq!(read_line(&mut sub_a), "MSG FOO 1 2\r\n");
    assert_eq!(read_exact_str(&mut sub_a, 4), "hi\r\n");
    assert_eq!(read_line(&mut sub_b), "MSG FOO 2 2\r\n");
    assert_eq!(read_exact_str(&mut sub_b, 4), "hi\r\n");

    broker.stop();
}

#[test]
fn unsub_stops_delivery() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB FOO 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    sub.write_all(b"UNSUB 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB FOO 2\r\nhi\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    sub.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    let mut byte = [0u8; 1];
    let err = sub.read(&mut byte);
    assert!(err.is_err() || err.unwrap() == 0, "unsubscribed client should receive nothing");

    broker.stop();
}

#[test]
fn split_frame_across_two_writes_is_still_parsed() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB FOO 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB FOO 5\r\n").unwrap();
    thread::sleep(Duration::from_millis(100));
    publ.write_all(b"Hello\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    assert_eq!(read_line(&mut sub), "MSG FOO 1 5\r\n");
    assert_eq!(read_exact_str(&mut sub, 7), "Hello\r\n");

    broker.stop();
}

#[test]
fn two_frames_in_one_write_both_get_acknowledged() {
    let (broker, port) = start_broker();

    let mut stream = connect(port);
    drain_info(&mut stream);
    stream.write_all(b"SUB FOO 1\r\nSUB BAR 2\r\n").unwrap();

    assert_eq!(read_line(&mut stream), "+OK\r\n");
    assert_eq!(read_line(&mut stream), "+OK\r\n");

    broker.stop();
}

#[test]
fn start_and_stop_are_idempotent() {
    let (broker, _port) = start_broker();
    assert!(broker.is_running());
    broker.start().expect("starting an already-running broker is a no-op");
    assert!(broker.is_running());

    broker.stop();
    assert!(!broker.is_running());
    broker.stop();
    assert!(!broker.is_running());
}

#[test]
fn random_payload_round_trips_byte_for_byte() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB FOO 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut rng = rand::thread_rng();
    let payload: Vec<u8> = (0..rng.gen_range(16, 256)).map(|_| rng.gen::<u8>()).collect();

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(format!("PUB FOO {}\r\n", payload.len()).as_bytes()).unwrap();
    publ.write_all(&payload).unwrap();
    publ.write_all(b"\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    assert_eq!(read_line(&mut sub), format!("MSG FOO 1 {}\r\n", payload.len()));
    let mut received = vec![0u8; payload.len() + 2];
    sub.read_exact(&mut received).unwrap();
    assert_eq!(&received[..payload.len()], &payload[..]);
    assert_eq!(&received[payload.len()..], b"\r\n");

    broker.stop();
}

#[test]
fn messages_on_one_subject_never_reach_a_different_subject() {
    let (broker, port) = start_broker();

    let mut sub = connect(port);
    drain_info(&mut sub);
    sub.write_all(b"SUB A 1\r\n").unwrap();
    assert_eq!(read_line(&mut sub), "+OK\r\n");

    let mut publ = connect(port);
    drain_info(&mut publ);
    publ.write_all(b"PUB B 2\r\nhi\r\n").unwrap();
    assert_eq!(read_line(&mut publ), "+OK\r\n");

    sub.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    let mut byte = [0u8; 1];
    let result = sub.read(&mut byte);
    assert!(result.is_err() || result.unwrap() == 0);

    broker.stop();
}
