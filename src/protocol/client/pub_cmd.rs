use bytes::Bytes;
use crate::protocol::{check_cmd_arg, Command, CommandError};

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct PubCommand {
    pub subject: String,
    #[builder(default)]
    pub reply_to: Option<String>,
    pub payload: Bytes,
}

impl Command for PubCommand {
    fn into_vec(&self) -> Vec<u8> {
        let rt = if let Some(ref reply_to) = self.reply_to {
            format!(" {}", reply_to)
        } else {
            "".into()
        };

        let mut bytes = format!("PUB {}{} {}\r\n", self.subject, rt, self.payload.len()).into_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

impl PubCommandBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref subj) = self.subject {
            check_cmd_arg!(subj, "subject");
        }

        if let Some(Some(ref reply_to)) = self.reply_to {
            check_cmd_arg!(reply_to, "inbox");
        }

        Ok(())
    }
}

/// Parses the `PUB <subject> [reply_to] <payload_size>` header, already split on
/// whitespace with the leading `PUB` token removed. Returns subject, reply_to and
/// the declared payload length; the caller is responsible for slicing the payload
/// out of the buffer once enough bytes have arrived.
pub(crate) fn parse_header(tokens: &[&str]) -> Result<(String, Option<String>, usize), CommandError> {
    match tokens.len() {
        2 => {
            let subject = tokens[0].to_string();
            let payload_size: usize = tokens[1].parse()?;
            Ok((subject, None, payload_size))
        }
        3 => {
            let subject = tokens[0].to_string();
            let reply_to = Some(tokens[1].to_string());
            let payload_size: usize = tokens[2].parse()?;
            Ok((subject, reply_to, payload_size))
        }
        _ => Err(CommandError::CommandMalformed),
    }
}
