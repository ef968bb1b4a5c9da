macro_rules! from_error {
    ($type:ty, $target:ident, $targetvar:expr) => {
        impl From<$type> for $target {
            fn from(s: $type) -> Self {
                $targetvar(s.into())
            }
        }
    };
}

/// Errors raised while starting, stopping, or running the broker listener itself,
/// as opposed to errors scoped to a single client session.
#[derive(Debug, Fail)]
pub enum BrokerError {
    #[fail(display = "failed to bind {}: {}", _0, _1)]
    BindFailed(String, ::std::io::Error),
}

/// Errors raised on one client's socket. These never escape the connection; the
/// reader loop that observes one tears down that session only.
#[derive(Debug, Fail)]
pub enum SessionError {
    #[fail(display = "session is closed")]
    Closed,
    #[fail(display = "io error: {}", _0)]
    Io(::std::io::Error),
}

from_error!(::std::io::Error, SessionError, SessionError::Io);
