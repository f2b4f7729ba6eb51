use thiserror::Error;

/// Authentication failures. These are answered to the client as
/// `AuthFailure` envelopes carrying the display string; they are never
/// propagated as errors inside the service.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AuthError {
    #[error("too many failed attempts, try again later")]
    LockedOut,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username and password must not be blank")]
    InvalidInput,
    #[error("unknown request")]
    UnknownRequest,
}
