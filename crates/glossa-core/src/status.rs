//! Wire status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a job or of one sentence within it.
///
/// Serialised as the integer `stat_code` field of response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum StatusCode {
    /// No status assigned yet; never valid on the wire.
    Undefined,
    /// Everything succeeded.
    Ok,
    /// Some sentences succeeded, some failed.
    Partial,
    /// The job was canceled by a session close.
    Canceled,
    /// The job or sentence failed outright.
    ResultError,
}

impl StatusCode {
    /// Wire value of the code.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Ok => 1,
            Self::Partial => 2,
            Self::Canceled => 3,
            Self::ResultError => 4,
        }
    }
}

impl From<StatusCode> for u32 {
    fn from(code: StatusCode) -> Self {
        code.as_u32()
    }
}

impl TryFrom<u32> for StatusCode {
    type Error = InvalidStatusCode;

    fn try_from(value: u32) -> Result<Self, InvalidStatusCode> {
        match value {
            0 => Ok(Self::Undefined),
            1 => Ok(Self::Ok),
            2 => Ok(Self::Partial),
            3 => Ok(Self::Canceled),
            4 => Ok(Self::ResultError),
            other => Err(InvalidStatusCode(other)),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Canceled => "canceled",
            Self::ResultError => "error",
        };
        f.write_str(name)
    }
}

/// A `stat_code` value outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status code: {0}")]
pub struct InvalidStatusCode(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        for code in [
            StatusCode::Undefined,
            StatusCode::Ok,
            StatusCode::Partial,
            StatusCode::Canceled,
            StatusCode::ResultError,
        ] {
            assert_eq!(StatusCode::try_from(code.as_u32()).unwrap(), code);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert_eq!(StatusCode::try_from(9), Err(InvalidStatusCode(9)));
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&StatusCode::Ok).unwrap(), "1");
        let back: StatusCode = serde_json::from_str("4").unwrap();
        assert_eq!(back, StatusCode::ResultError);
    }
}
