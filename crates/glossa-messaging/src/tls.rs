//! TLS mode selection and URI agreement checks.

use std::fmt;
use std::str::FromStr;

use crate::error::MessagingError;

/// TLS security profile for a `wss://` link.
///
/// The names follow the Mozilla server-side TLS recommendations; the
/// selected mode drives the cipher/protocol configuration of the
/// underlying connector or acceptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// No TLS; only valid together with a `ws://` URI.
    #[default]
    Undefined,
    /// Maximum compatibility profile.
    MozillaOld,
    /// The recommended general-purpose profile.
    MozillaIntermediate,
    /// Modern clients only.
    MozillaModern,
}

impl TlsMode {
    /// Whether the mode enables TLS at all.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::Undefined
    }

    /// Verify that the URI scheme agrees with this TLS mode.
    ///
    /// `wss` requires an enabled mode, `ws` requires [`TlsMode::Undefined`].
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidUri`] for an unparsable URI or a
    /// non-WebSocket scheme, and [`MessagingError::ConfigMismatch`] when
    /// the scheme and the mode disagree.
    pub fn check_uri(self, uri: &str) -> Result<(), MessagingError> {
        let parsed = url::Url::parse(uri).map_err(|e| MessagingError::InvalidUri {
            uri: uri.to_owned(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "ws" if self.is_enabled() => Err(MessagingError::ConfigMismatch(format!(
                "TLS mode {self} configured but {uri} is not a wss:// URI"
            ))),
            "wss" if !self.is_enabled() => Err(MessagingError::ConfigMismatch(format!(
                "{uri} requires TLS but no TLS mode is configured"
            ))),
            "ws" | "wss" => Ok(()),
            other => Err(MessagingError::InvalidUri {
                uri: uri.to_owned(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::MozillaOld => "mozilla_old",
            Self::MozillaIntermediate => "mozilla_intermediate",
            Self::MozillaModern => "mozilla_modern",
        };
        f.write_str(name)
    }
}

impl FromStr for TlsMode {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined" | "" => Ok(Self::Undefined),
            "mozilla_old" => Ok(Self::MozillaOld),
            "mozilla_intermediate" => Ok(Self::MozillaIntermediate),
            "mozilla_modern" => Ok(Self::MozillaModern),
            other => Err(MessagingError::ConfigMismatch(format!(
                "unknown TLS mode: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_uri_with_plain_mode_is_fine() {
        assert!(TlsMode::Undefined.check_uri("ws://localhost:9000").is_ok());
    }

    #[test]
    fn secure_uri_needs_a_mode() {
        assert!(matches!(
            TlsMode::Undefined.check_uri("wss://localhost:9000"),
            Err(MessagingError::ConfigMismatch(_))
        ));
        assert!(
            TlsMode::MozillaIntermediate
                .check_uri("wss://localhost:9000")
                .is_ok()
        );
    }

    #[test]
    fn plain_uri_with_a_mode_is_a_mismatch() {
        assert!(matches!(
            TlsMode::MozillaModern.check_uri("ws://localhost:9000"),
            Err(MessagingError::ConfigMismatch(_))
        ));
    }

    #[test]
    fn non_websocket_scheme_is_invalid() {
        assert!(matches!(
            TlsMode::Undefined.check_uri("http://localhost:9000"),
            Err(MessagingError::InvalidUri { .. })
        ));
    }

    #[test]
    fn modes_parse_from_their_names() {
        assert_eq!(
            "mozilla_intermediate".parse::<TlsMode>().unwrap(),
            TlsMode::MozillaIntermediate
        );
        assert!("mozilla_future".parse::<TlsMode>().is_err());
    }
}
