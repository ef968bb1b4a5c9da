use bytes::Bytes;

use super::client::{self, ConnectCommand, SubCommand, UnsubCommand};
use super::client::pub_cmd::{self, PubCommand};
use super::server::{Message, ServerInfo};
use super::{Command, CommandError};

/// The broker's unified command value, produced by [`Op::parse`] and consumed by
/// the dispatcher. Variants with no payload (`Ping`, `Pong`, `Ok`, `Unknown`) carry
/// nothing; everything else wraps the struct that owns its fields.
#[derive(Debug, Clone)]
pub enum Op {
    /// `[CLIENT]` Connection options, kept as opaque text.
    Connect(ConnectCommand),
    /// `[BOTH]` keep-alive.
    Ping,
    /// `[BOTH]` keep-alive reply.
    Pong,
    /// `[CLIENT]` Subscribe to a subject.
    Sub(SubCommand),
    /// `[CLIENT]` Publish a message to a subject, with an optional reply subject.
    Pub(PubCommand),
    /// `[CLIENT]` Unsubscribe from a subject.
    Unsub(UnsubCommand),
    /// `[SERVER]` Delivers a message payload to a subscriber.
    Msg(Message),
    /// `[SERVER]` Sent right after `accept`.
    Info(ServerInfo),
    /// `[SERVER]` Acknowledges a well-formed command.
    Ok,
    /// A verb the broker doesn't recognize; silently ignored by the dispatcher.
    Unknown,
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

impl Op {
    /// Tries to parse one complete frame off the front of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` doesn't yet hold a complete frame (the
    /// caller should read more and retry), `Ok(Some((op, consumed)))` on
    /// success, or `Err` for a malformed frame on a *recognized* verb. An
    /// unrecognized verb is not an error: it parses to `Op::Unknown`.
    pub fn parse(buf: &[u8]) -> Result<Option<(Op, usize)>, CommandError> {
        let header_end = match find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let header_len = header_end + 2;
        let header = ::std::str::from_utf8(&buf[..header_end])?;

        let verb_end = header.find(char::is_whitespace).unwrap_or_else(|| header.len());
        let verb = &header[..verb_end];

        match verb {
            "CONNECT" => {
                let rest = header[verb_end..].trim();
                if rest.is_empty() {
                    return Err(CommandError::CommandMalformed);
                }
                Ok(Some((Op::Connect(ConnectCommand::parse(rest)), header_len)))
            }
            "PING" => Ok(Some((Op::Ping, header_len))),
            "PONG" => Ok(Some((Op::Pong, header_len))),
            "SUB" => {
                let tokens: Vec<&str> = header[verb_end..].split_whitespace().collect();
                let cmd = client::sub_cmd::parse(&tokens)?;
                Ok(Some((Op::Sub(cmd), header_len)))
            }
            "UNSUB" => {
                let tokens: Vec<&str> = header[verb_end..].split_whitespace().collect();
                let cmd = client::unsub_cmd::parse(&tokens)?;
                Ok(Some((Op::Unsub(cmd), header_len)))
            }
            "PUB" => {
                let tokens: Vec<&str> = header[verb_end..].split_whitespace().collect();
                let (subject, reply_to, payload_size) = pub_cmd::parse_header(&tokens)?;

                let total_len = header_len + payload_size + 2;
                if buf.len() < total_len {
                    return Ok(None);
                }

                if &buf[header_len + payload_size..total_len] != b"\r\n" {
                    return Err(CommandError::CommandMalformed);
                }

                let payload = Bytes::from(buf[header_len..header_len + payload_size].to_vec());
                Ok(Some((
                    Op::Pub(PubCommand {
                        subject,
                        reply_to,
                        payload,
                    }),
                    total_len,
                )))
            }
            _ => Ok(Some((Op::Unknown, header_len))),
        }
    }
}

impl Command for Op {
    fn into_vec(&self) -> Vec<u8> {
        match self {
            Op::Connect(cmd) => cmd.into_vec(),
            Op::Ping => b"PING\r\n".to_vec(),
            Op::Pong => b"PONG\r\n".to_vec(),
            Op::Sub(cmd) => cmd.into_vec(),
            Op::Pub(cmd) => cmd.into_vec(),
            Op::Unsub(cmd) => cmd.into_vec(),
            Op::Msg(msg) => msg.into_vec(),
            Op::Info(info) => info.into_vec(),
            Op::Ok => b"+OK\r\n".to_vec(),
            Op::Unknown => Vec::new(),
        }
    }
}
