use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::BrokerError;
use crate::index::{Subscription, SubscriptionIndex};
use crate::protocol::server::{MessageBuilder, ServerInfo};
use crate::protocol::Op;
use crate::session::Session;

/// How often the accept loop wakes up to re-check the running flag while no
/// connection is pending. Keeps `stop()` responsive without needing a
/// self-connect trick to unblock a genuinely blocking `accept()`.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A subject-based publish/subscribe broker speaking the NATS text wire
/// protocol over plain TCP. One thread accepts connections; one thread per
/// connected client runs its read-and-dispatch loop; fan-out writes run on
/// whichever thread dispatched the publish.
pub struct Broker {
    host: String,
    port: u16,
    running: Arc<AtomicBool>,
    index: Arc<SubscriptionIndex>,
    sessions: Arc<Mutex<Vec<Arc<Session>>>>,
    // Shared with the accept loop, which pushes a handle for every
    // per-connection reader thread it spawns.
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Broker {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Broker {
            host: host.into(),
            port,
            running: Arc::new(AtomicBool::new(false)),
            index: Arc::new(SubscriptionIndex::new()),
            sessions: Arc::new(Mutex::new(Vec::new())),
            workers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Idempotent: starting an already-running broker is a no-op success.
    pub fn start(&self) -> Result<(), BrokerError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr).map_err(|e| BrokerError::BindFailed(addr.clone(), e))?;
        // Non-blocking with a short poll interval, rather than a single
        // blocking accept(): closing a listening socket from another thread
        // while it's parked in accept() is a race on most platforms, so the
        // accept loop instead wakes up periodically to check `running`.
        listener
            .set_nonblocking(true)
            .map_err(|e| BrokerError::BindFailed(addr.clone(), e))?;
        info!(target: "natsd", "listening on {}", addr);

        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let index = Arc::clone(&self.index);
        let sessions = Arc::clone(&self.sessions);
        let workers = Arc::clone(&self.workers);
        let host = self.host.clone();
        let port = self.port;

        let accept_handle = thread::spawn(move || {
            accept_loop(listener, running, index, sessions, workers, host, port);
        });

        self.workers.lock().push(accept_handle);
        Ok(())
    }

    /// Idempotent: stopping an already-stopped broker is a no-op.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        for session in self.sessions.lock().drain(..) {
            session.disconnect();
        }

        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }

        self.index.clear();
        info!(target: "natsd", "stopped");
    }
}

fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    index: Arc<SubscriptionIndex>,
    sessions: Arc<Mutex<Vec<Arc<Session>>>>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    host: String,
    port: u16,
) {
    while running.load(Ordering::SeqCst) {
        let stream = match listener.accept() {
            Ok((stream, _addr)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
                continue;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    warn!(target: "natsd", "accept failed: {}", e);
                }
                break;
            }
        };

        let peer_ip = stream
            .peer_addr()
            .map(|a| a.ip().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let session = match Session::new(stream, peer_ip.clone()) {
            Ok(session) => session,
            Err(e) => {
                warn!(target: "natsd", "failed to set up session for {}: {}", peer_ip, e);
                continue;
            }
        };

        info!(target: "natsd", "accepted connection from {}", peer_ip);
        sessions.lock().push(Arc::clone(&session));

        let info_frame = ServerInfo {
            host: host.clone(),
            port,
            client_ip: peer_ip.clone(),
        };
        if session.send(&info_frame).is_err() {
            continue;
        }

        let reader_index = Arc::clone(&index);
        let reader_sessions = Arc::clone(&sessions);
        let reader_running = Arc::clone(&running);
        let reader_session = Arc::clone(&session);

        let handle = thread::spawn(move || {
            read_loop(reader_session.clone(), &reader_index, &reader_running);
            reader_sessions.lock().retain(|s| !Arc::ptr_eq(s, &reader_session));
            let swept = reader_index.remove_session(&reader_session);
            if swept > 0 {
                debug!(target: "natsd", "swept {} subscription(s) for {}", swept, reader_session.peer_ip());
            }
        });

        workers.lock().push(handle);
    }
}

/// Accumulates bytes across `receive()` calls and loops the codec's parser
/// until it can't yield another complete frame, so a PUB payload split
/// across two reads and two frames arriving in one read both work.
fn read_loop(session: Arc<Session>, index: &SubscriptionIndex, running: &AtomicBool) {
    let mut buf: Vec<u8> = Vec::new();

    while running.load(Ordering::SeqCst) && session.is_connected() {
        let chunk = session.receive();
        if chunk.is_empty() {
            break;
        }
        buf.extend_from_slice(&chunk);

        loop {
            match Op::parse(&buf) {
                Ok(Some((op, consumed))) => {
                    dispatch(&session, index, op);
                    buf.drain(..consumed);
                }
                Ok(None) => break,
                Err(_) => {
                    // Drop the malformed header line and resynchronize on
                    // the next CRLF instead of discarding the whole buffer.
                    if let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") {
                        buf.drain(..pos + 2);
                    } else {
                        buf.clear();
                        break;
                    }
                }
            }
        }
    }

    session.disconnect();
}

fn dispatch(session: &Arc<Session>, index: &SubscriptionIndex, op: Op) {
    match op {
        Op::Connect(_) => {
            let _ = session.send(&Op::Ok);
        }
        Op::Ping => {
            let _ = session.send(&Op::Pong);
        }
        Op::Pong => {}
        Op::Sub(cmd) => {
            let subscription = Arc::new(Subscription {
                subject: cmd.subject.clone(),
                sid: cmd.sid.clone(),
                session: Arc::downgrade(session),
            });

            if session.add_subscription(Arc::clone(&subscription)) {
                index.add(subscription);
                let _ = session.send(&Op::Ok);
            }
        }
        Op::Unsub(cmd) => {
            if session.remove_subscription(&cmd.sid) {
                index.remove_by_sid_and_session(&cmd.sid, session);
                let _ = session.send(&Op::Ok);
            }
        }
        Op::Pub(cmd) => {
            deliver(index, &cmd.subject, &cmd.reply_to, &cmd.payload);
            let _ = session.send(&Op::Ok);
        }
        Op::Msg(_) | Op::Info(_) | Op::Ok | Op::Unknown => {}
    }
}

fn deliver(index: &SubscriptionIndex, subject: &str, reply_to: &Option<String>, payload: &bytes::Bytes) {
    for subscription in index.snapshot(subject) {
        let session = match subscription.session.upgrade() {
            Some(session) => session,
            None => continue,
        };

        let msg = MessageBuilder::default()
            .subject(subject)
            .sid(subscription.sid.clone())
            .reply_to(reply_to.clone())
            .payload(payload.clone())
            .build();

        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(target: "natsd", "failed to build MSG frame: {}", e);
                continue;
            }
        };

        if let Err(e) = session.send(&msg) {
            warn!(target: "natsd", "delivery to {} failed: {}", session.peer_ip(), e);
        }
    }
}
