use std::fmt::{self, Display};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::path::ExtractError;

/// Why fetching a single identifier failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The upstream answered with a status other than 200.
    Status(u16),
    /// The upstream answered 200, but the body could not be decoded or does
    /// not carry the expected field.
    Malformed(ExtractError),
    /// The request never produced a response.
    Transport(String),
    /// The identifier has no URL, so nothing was requested.
    InvalidIdentifier,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Status(status) => {
                write!(f, "upstream returned status {status}")
            }
            FailureReason::Malformed(err) => {
                write!(f, "malformed response: {err}")
            }
            FailureReason::Transport(msg) => {
                write!(f, "transport error: {msg}")
            }
            FailureReason::InvalidIdentifier => {
                write!(f, "identifier cannot be used in a URL path")
            }
        }
    }
}

/// The outcome of fetching one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The field was extracted.
    Success {
        /// The requested identifier.
        identifier: String,
        /// The extracted field.
        value: String,
    },
    /// The identifier could not be fetched.
    Failure {
        /// The requested identifier.
        identifier: String,
        /// What went wrong.
        reason: FailureReason,
    },
}

impl FetchOutcome {
    /// Returns the identifier this outcome belongs to.
    #[inline]
    pub fn identifier(&self) -> &str {
        match self {
            FetchOutcome::Success { identifier, .. }
            | FetchOutcome::Failure { identifier, .. } => identifier,
        }
    }

    /// Returns the extracted value, if any.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { value, .. } => Some(value),
            FetchOutcome::Failure { .. } => None,
        }
    }

    /// Returns the failure reason, if any.
    #[inline]
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure { reason, .. } => Some(reason),
        }
    }

    /// Returns `true` if the field was extracted.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Returns a view that serializes this outcome as a flat record.
    ///
    /// Failures are reported in-band: the identifier is suffixed with
    /// ` ERROR` and the value is the number `0`.
    #[inline]
    pub fn record<'a>(&'a self, keys: &'a RecordKeys) -> Record<'a> {
        Record {
            outcome: self,
            keys,
        }
    }
}

/// Names of the two entries of a serialized [`Record`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordKeys {
    /// The key the identifier is reported under, e.g. `city`.
    pub key_name: String,
    /// The key the extracted value is reported under, e.g. `temperature`.
    pub result_field: String,
}

impl RecordKeys {
    /// Creates the key pair.
    #[inline]
    pub fn new<K, F>(key_name: K, result_field: F) -> Self
    where
        K: Into<String>,
        F: Into<String>,
    {
        Self {
            key_name: key_name.into(),
            result_field: result_field.into(),
        }
    }
}

/// A flat record view of a [`FetchOutcome`], see [`FetchOutcome::record`].
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    outcome: &'a FetchOutcome,
    keys: &'a RecordKeys,
}

impl Record<'_> {
    /// Builds the record as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(2);
        let (name, value) = match self.outcome {
            FetchOutcome::Success { identifier, value } => {
                (identifier.clone(), Value::from(value.as_str()))
            }
            FetchOutcome::Failure { identifier, .. } => {
                (format!("{identifier} ERROR"), Value::from(0))
            }
        };
        map.insert(self.keys.key_name.clone(), Value::String(name));
        map.insert(self.keys.result_field.clone(), value);
        Value::Object(map)
    }
}

impl Serialize for Record<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        match self.outcome {
            FetchOutcome::Success { identifier, value } => {
                map.serialize_entry(&self.keys.key_name, identifier)?;
                map.serialize_entry(&self.keys.result_field, value)?;
            }
            FetchOutcome::Failure { identifier, .. } => {
                map.serialize_entry(
                    &self.keys.key_name,
                    &format!("{identifier} ERROR"),
                )?;
                map.serialize_entry(&self.keys.result_field, &0)?;
            }
        }
        map.end()
    }
}

/// The error returned by a strict batch when an identifier fails for any
/// reason other than an HTTP status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchError {
    identifier: String,
    reason: FailureReason,
}

impl BatchError {
    #[inline]
    pub(crate) fn new(identifier: String, reason: FailureReason) -> Self {
        Self { identifier, reason }
    }

    /// Returns the identifier that aborted the batch.
    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns why the identifier failed.
    #[inline]
    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }
}

impl Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetching `{}` failed: {}", self.identifier, self.reason)
    }
}

impl std::error::Error for BatchError {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_shape() {
        let keys = RecordKeys::new("city", "temperature");

        let success = FetchOutcome::Success {
            identifier: "Berlin".to_owned(),
            value: "21".to_owned(),
        };
        assert_eq!(
            serde_json::to_string(&success.record(&keys)).unwrap(),
            r#"{"city":"Berlin","temperature":"21"}"#
        );

        let failure = FetchOutcome::Failure {
            identifier: "Berlin".to_owned(),
            reason: FailureReason::Status(404),
        };
        assert_eq!(
            serde_json::to_value(failure.record(&keys)).unwrap(),
            json!({ "city": "Berlin ERROR", "temperature": 0 })
        );
        assert_eq!(failure.identifier(), "Berlin");
        assert_eq!(failure.value(), None);
    }

    #[test]
    fn test_record_to_value() {
        let keys = RecordKeys::new("city", "temperature_max");
        let outcomes = [
            FetchOutcome::Success {
                identifier: "Paris".to_owned(),
                value: "17".to_owned(),
            },
            FetchOutcome::Failure {
                identifier: "..".to_owned(),
                reason: FailureReason::InvalidIdentifier,
            },
        ];
        for outcome in &outcomes {
            let record = outcome.record(&keys);
            assert_eq!(
                record.to_value(),
                serde_json::to_value(record).unwrap()
            );
        }
        assert_eq!(
            outcomes[1].record(&keys).to_value(),
            json!({ "city": ".. ERROR", "temperature_max": 0 })
        );
    }
}
