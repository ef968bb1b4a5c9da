use crate::protocol::{check_cmd_arg, Command, CommandError};

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SubCommand {
    pub subject: String,
    #[builder(default)]
    pub queue_group: Option<String>,
    pub sid: String,
}

impl Command for SubCommand {
    fn into_vec(&self) -> Vec<u8> {
        let qg = if let Some(ref queue_group) = self.queue_group {
            format!(" {}", queue_group)
        } else {
            "".into()
        };

        format!("SUB {}{} {}\r\n", self.subject, qg, self.sid).into_bytes()
    }
}

impl SubCommandBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref subj) = self.subject {
            check_cmd_arg!(subj, "subject");
        }

        if let Some(Some(ref qg)) = self.queue_group {
            check_cmd_arg!(qg, "queue group");
        }

        Ok(())
    }
}

/// Parses `SUB <subject> [queue_group] <sid>`, already split on whitespace with
/// the leading `SUB` token removed.
pub(crate) fn parse(tokens: &[&str]) -> Result<SubCommand, CommandError> {
    match tokens.len() {
        2 => Ok(SubCommand {
            subject: tokens[0].to_string(),
            queue_group: None,
            sid: tokens[1].to_string(),
        }),
        3 => Ok(SubCommand {
            subject: tokens[0].to_string(),
            queue_group: Some(tokens[1].to_string()),
            sid: tokens[2].to_string(),
        }),
        _ => Err(CommandError::CommandMalformed),
    }
}
