//! Client error types.
//!
//! The routing core never raises for lookup misses (those are `Option`)
//! and never panics on runtime failure; everything here is reported by
//! return value. Contract violations are assertions.

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Client operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Topic creation was given an invalid configuration.
    #[error("invalid topic configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: &'static str,
    },

    /// The topic is not known locally.
    #[error("topic {name} not known locally")]
    UnknownTopic {
        /// The topic name.
        name: String,
    },

    /// The topic has no unassigned partition (it has been torn down).
    #[error("topic {name} has no unassigned partition")]
    NoUnassignedPartition {
        /// The topic name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownTopic {
            name: "events".to_owned(),
        };
        assert_eq!(format!("{err}"), "topic events not known locally");

        let err = Error::InvalidConfig {
            reason: "message_timeout_ms must be > 0",
        };
        assert!(format!("{err}").contains("message_timeout_ms"));
    }
}
