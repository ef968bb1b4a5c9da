mod info;
pub use self::info::*;

mod message;
pub use self::message::*;
