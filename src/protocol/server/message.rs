use bytes::Bytes;
use crate::protocol::{check_cmd_arg, Command};

#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Message {
    #[builder(setter(into))]
    pub subject: String,
    #[builder(setter(into))]
    pub sid: String,
    #[builder(default)]
    pub reply_to: Option<String>,
    #[builder(setter(into))]
    pub payload: Bytes,
}

impl Command for Message {
    fn into_vec(&self) -> Vec<u8> {
        let rt = if let Some(ref reply_to) = self.reply_to {
            format!(" {}", reply_to)
        } else {
            "".into()
        };

        let mut bytes = format!("MSG {} {}{} {}\r\n", self.subject, self.sid, rt, self.payload.len()).into_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

impl MessageBuilder {
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

#[cfg(test)]
mod message_command_tests {
    use super::MessageBuilder;
    use crate::protocol::Command;

    #[test]
    fn it_stringifies_without_reply_to() {
        let cmd = MessageBuilder::default()
            .subject("FOO")
            .sid("1")
            .payload("Hello")
            .build()
            .unwrap();

        assert_eq!(cmd.into_vec(), b"MSG FOO 1 5\r\nHello\r\n".to_vec());
    }

    #[test]
    fn it_stringifies_with_reply_to() {
        let cmd = MessageBuilder::default()
            .subject("FOO")
            .sid("1")
            .reply_to(Some("BAR".to_string()))
            .payload("Hello")
            .build()
            .unwrap();

        assert_eq!(cmd.into_vec(), b"MSG FOO 1 BAR 5\r\nHello\r\n".to_vec());
    }
}
