#[macro_use]
extern crate derive_builder;

extern crate failure;
#[macro_use]
extern crate failure_derive;

extern crate bytes;

#[allow(unused_imports)]
#[macro_use]
extern crate log;

#[macro_use]
mod error;

pub use self::error::*;
pub mod protocol;

mod index;
mod session;

pub mod broker;
pub use self::broker::Broker;
pub use self::index::{Subscription, SubscriptionIndex};
pub use self::session::Session;
