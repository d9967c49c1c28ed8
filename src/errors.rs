use crate::types::LightId;

/// All error types that can occur when talking to a Hue bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// The HTTP client failed before a response arrived.
    #[error("http {action} error: {err}")]
    Http { action: String, err: reqwest::Error },

    /// The request did not complete within its timeout.
    #[error("request to {url} timed out")]
    TimedOut { url: String },

    /// The bridge answered with a non-success HTTP status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// A local file operation failed.
    #[error("io {action} error: {err:?}")]
    Io { action: String, err: std::io::Error },

    /// The bridge reported an error entry in its response list.
    #[error("bridge error {kind} at {address}: {description}")]
    Bridge {
        kind: u32,
        address: String,
        description: String,
    },

    /// Pairing was refused, usually because the link button was not pressed.
    #[error("press the link button on the bridge and retry ({0})")]
    PairingRejected(String),

    /// Attempted to send a [`crate::StatePayload`] with no attributes set.
    #[error("invalid payload; no attributes set")]
    NoAttribute,

    /// A light object came back without its power state.
    #[error("light reply carried no power state")]
    MissingPowerState,

    /// No bridge address has been resolved.
    #[error("no hue bridge found")]
    NoBridge,

    /// No credential is available for the bridge.
    #[error("not paired with the bridge")]
    NotPaired,

    /// The light is not part of the current light set.
    #[error("light {0} not found")]
    LightNotFound(LightId),

    /// The background worker is no longer running.
    #[error("sync worker stopped")]
    WorkerStopped,

    /// A typed brightness entry could not be parsed.
    #[error("invalid brightness entry: {0:?}")]
    InvalidBrightness(String),
}

impl Error {
    /// Create a new http error
    pub fn http(action: &str, err: reqwest::Error) -> Self {
        Error::Http {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new io error
    pub fn io(action: &str, err: std::io::Error) -> Self {
        Error::Io {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new timeout error
    pub fn timed_out(url: &str) -> Self {
        Error::TimedOut {
            url: url.to_string(),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
