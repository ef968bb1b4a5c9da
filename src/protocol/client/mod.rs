mod connect;
pub use self::connect::*;

pub(crate) mod pub_cmd;
pub use self::pub_cmd::{PubCommand, PubCommandBuilder};

pub(crate) mod sub_cmd;
pub use self::sub_cmd::{SubCommand, SubCommandBuilder};

pub(crate) mod unsub_cmd;
pub use self::unsub_cmd::{UnsubCommand, UnsubCommandBuilder};
