/// Anything that can turn itself into the exact bytes sent on the wire for it.
pub trait Command {
    fn into_vec(&self) -> Vec<u8>;
}

pub(crate) fn check_arg(s: &str) -> Result<(), ArgumentValidationError> {
    if s.contains(' ') {
        Err(ArgumentValidationError::ContainsSpace)
    } else if s.contains('\t') {
        Err(ArgumentValidationError::ContainsTab)
    } else {
        Ok(())
    }
}

macro_rules! check_cmd_arg {
    ($val:expr, $part:expr) => {
        match crate::protocol::check_arg($val) {
            Ok(_) => {}
            Err(crate::protocol::ArgumentValidationError::ContainsSpace) => {
                return Err(format!("{} contains spaces", $part).into());
            }
            Err(crate::protocol::ArgumentValidationError::ContainsTab) => {
                return Err(format!("{} contains tabs", $part).into());
            }
        }
    };
}
pub(crate) use check_cmd_arg;

mod error;
pub use self::error::*;

pub mod client;
pub mod op;
pub mod server;

pub use self::op::Op;
