use thiserror::Error;

/// Errors raised by linking configuration, translation and platform queries.
///
/// The root container absorbs all of them: a failing platform query is
/// logged and treated as "no initial link", an unmatched path is not an
/// error at all. Only configuration loading and the inverse path mapping
/// surface these to callers.
#[derive(Error, Debug)]
pub enum LinkingError {
    /// The platform failed to answer the launch-URL query.
    #[error("platform link query failed: {0}")]
    Platform(String),

    /// A screen pattern is malformed.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two screens resolve to the same full pattern.
    #[error("pattern '{pattern}' is used by both '{first}' and '{second}'")]
    DuplicatePattern {
        pattern: String,
        first: String,
        second: String,
    },

    /// A state cannot be turned into a path because a required param is absent.
    #[error("screen '{screen}' requires param '{param}'")]
    MissingParam { screen: String, param: String },

    /// Configuration data could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LinkingError {
    fn from(e: serde_json::Error) -> Self {
        LinkingError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            LinkingError::Platform("no activity".into()).to_string(),
            "platform link query failed: no activity"
        );
        assert_eq!(
            LinkingError::MissingParam {
                screen: "Profile".into(),
                param: "id".into(),
            }
            .to_string(),
            "screen 'Profile' requires param 'id'"
        );
        assert_eq!(
            LinkingError::InvalidPattern {
                pattern: "a/*/b".into(),
                reason: "`*` must be the last segment".into(),
            }
            .to_string(),
            "invalid pattern 'a/*/b': `*` must be the last segment"
        );
    }

    #[test]
    fn json_error_maps_to_config() {
        let err: LinkingError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, LinkingError::Config(_)));
    }
}
