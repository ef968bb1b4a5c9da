use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SessionError;
use crate::index::Subscription;
use crate::protocol::Command;

const READ_CHUNK: usize = 4096;

struct SessionState {
    connected: bool,
    subscriptions: HashMap<String, Arc<Subscription>>,
}

/// One accepted TCP connection: its socket handles, the subscriptions it
/// locally owns, and whether it's still alive. A single mutex guards both the
/// `connected` flag and the subscription table, mirroring the reference
/// client's one-lock-per-connection design.
pub struct Session {
    peer_ip: String,
    reader: Mutex<TcpStream>,
    writer: Mutex<TcpStream>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(stream: TcpStream, peer_ip: String) -> Result<Arc<Self>, SessionError> {
        let writer = stream.try_clone()?;
        Ok(Arc::new(Session {
            peer_ip,
            reader: Mutex::new(stream),
            writer: Mutex::new(writer),
            state: Mutex::new(SessionState {
                connected: true,
                subscriptions: HashMap::new(),
            }),
        }))
    }

    pub fn peer_ip(&self) -> &str {
        &self.peer_ip
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Writes one frame's bytes as a single `write_all`, so concurrent
    /// senders (fan-out writers and this session's own reader thread replying
    /// to PING/CONNECT) never interleave mid-frame.
    pub fn send<T: Command>(&self, frame: &T) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::Closed);
        }

        let bytes = frame.into_vec();
        let mut writer = self.writer.lock();
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Reads the next chunk off the socket. Returns an empty vec on EOF, at
    /// which point the session has already transitioned to disconnected.
    /// Does not guarantee frame alignment: the caller is responsible for
    /// accumulating chunks and re-parsing until a complete frame appears.
    pub fn receive(&self) -> Vec<u8> {
        let mut buf = [0u8; READ_CHUNK];
        let read = {
            let mut reader = self.reader.lock();
            reader.read(&mut buf)
        };

        match read {
            Ok(0) | Err(_) => {
                self.disconnect();
                Vec::new()
            }
            Ok(n) => buf[..n].to_vec(),
        }
    }

    pub fn add_subscription(&self, subscription: Arc<Subscription>) -> bool {
        let mut state = self.state.lock();
        if !state.connected || state.subscriptions.contains_key(&subscription.sid) {
            return false;
        }
        state.subscriptions.insert(subscription.sid.clone(), subscription);
        true
    }

    pub fn remove_subscription(&self, sid: &str) -> bool {
        self.state.lock().subscriptions.remove(sid).is_some()
    }

    pub fn get_subscription(&self, sid: &str) -> Option<Arc<Subscription>> {
        self.state.lock().subscriptions.get(sid).cloned()
    }

    /// Whether this session currently holds any subscription on `subject`.
    pub fn has_subscription(&self, subject: &str) -> bool {
        self.state.lock().subscriptions.values().any(|sub| sub.subject == subject)
    }

    /// Idempotent. Flips the connected flag, drops the local subscription
    /// table, and shuts the socket down in both directions, which unblocks
    /// any thread currently parked in `receive`.
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        if !state.connected {
            return;
        }
        state.connected = false;
        state.subscriptions.clear();
        drop(state);

        let _ = self.writer.lock().shutdown(Shutdown::Both);
    }
}
