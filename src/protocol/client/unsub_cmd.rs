use crate::protocol::{Command, CommandError};

/// `max_msgs` is recognized and carried but never enforced by the core: the
/// token is kept as raw text rather than parsed into a number.
#[derive(Debug, Clone, Builder)]
pub struct UnsubCommand {
    pub sid: String,
    #[builder(default)]
    pub max_msgs: Option<String>,
}

impl Command for UnsubCommand {
    fn into_vec(&self) -> Vec<u8> {
        let mm = if let Some(ref max_msgs) = self.max_msgs {
            format!(" {}", max_msgs)
        } else {
            "".into()
        };

        format!("UNSUB {}{}\r\n", self.sid, mm).into_bytes()
    }
}

/// Parses `UNSUB <sid> [max_msgs]`, already split on whitespace with the
/// leading `UNSUB` token removed.
pub(crate) fn parse(tokens: &[&str]) -> Result<UnsubCommand, CommandError> {
    match tokens.len() {
        1 => Ok(UnsubCommand {
            sid: tokens[0].to_string(),
            max_msgs: None,
        }),
        2 => Ok(UnsubCommand {
            sid: tokens[0].to_string(),
            max_msgs: Some(tokens[1].to_string()),
        }),
        _ => Err(CommandError::CommandMalformed),
    }
}
