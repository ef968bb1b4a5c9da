use crate::protocol::Command;

/// The CONNECT options blob is never tokenized by the broker; it's accepted as
/// opaque text and kept verbatim, since it may itself contain internal whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectCommand {
    pub raw: String,
}

impl Command for ConnectCommand {
    fn into_vec(&self) -> Vec<u8> {
        format!("CONNECT {}\r\n", self.raw).into_bytes()
    }
}

impl ConnectCommand {
    pub(crate) fn parse(rest: &str) -> Self {
        ConnectCommand { raw: rest.trim().to_string() }
    }
}
