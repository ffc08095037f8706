/// All error types that can occur while reconciling against a Hue bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// The HTTP request to the bridge could not be completed.
    #[error("bridge transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The bridge answered with a non-200 status.
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// A resource listing was not a JSON object keyed by bridge id.
    #[error("malformed {resource} listing")]
    MalformedListing { resource: String },

    /// A host entity could not be resolved.
    #[error("unknown entity {0}")]
    UnknownEntity(String),

    /// The host platform rejected a device-control call.
    #[error("host call failed: {0}")]
    Host(String),
}

impl Error {
    /// Create a new status error
    pub fn status(method: &str, path: &str, status: u16, body: &serde_json::Value) -> Self {
        Error::Status {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }

    /// Create a new malformed listing error
    pub fn malformed_listing(resource: &str) -> Self {
        Error::MalformedListing {
            resource: resource.to_string(),
        }
    }

    /// Returns `true` for failures the next loop trigger may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Status { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
