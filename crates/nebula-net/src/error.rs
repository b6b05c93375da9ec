//! Request failure types.

/// Why a request did not complete.
///
/// The `Display` form is the message handed to
/// [`RequestObserver::on_error`](crate::RequestObserver::on_error).
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// A response arrived with a status other than 200 or 206.
    #[error("status: {code}")]
    Status { code: u16 },

    /// The transfer failed. `code` is 0 when no response was received.
    #[error("status: {code}, error: {detail}")]
    Transport { code: u16, detail: String },
}

impl RequestError {
    /// The HTTP status associated with the failure, 0 if there was none.
    pub fn code(&self) -> u16 {
        match self {
            Self::Status { code } | Self::Transport { code, .. } => *code,
        }
    }
}

impl From<ureq::Error> for RequestError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => Self::Status { code },
            ureq::Error::Transport(transport) => Self::Transport {
                code: 0,
                detail: transport.to_string(),
            },
        }
    }
}
