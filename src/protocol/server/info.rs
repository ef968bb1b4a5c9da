use crate::protocol::Command;

/// The greeting sent to every client right after `accept`. Generated by plain
/// string templating rather than a JSON serializer, deliberately: the field set
/// is fixed and small, and this avoids pulling a JSON stack in just for three
/// scalars.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
    pub client_ip: String,
}

impl Command for ServerInfo {
    fn into_vec(&self) -> Vec<u8> {
        format!(
            "INFO {{\"host\":\"{}\",\"port\":{},\"client_ip\":\"{}\"}}\r\n",
            self.host, self.port, self.client_ip
        )
        .into_bytes()
    }
}
