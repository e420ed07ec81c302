use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::Value;

/// A single step of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Selects a member of a JSON object.
    Key(String),
    /// Selects an element of a JSON array.
    Index(usize),
}

/// A path that navigates a parsed JSON document to a scalar field, written
/// like `current_condition[0].temp_C`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

/// The error returned when a [`FieldPath`] can't be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPathError {
    path: String,
    reason: &'static str,
}

impl Display for FieldPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field path `{}`: {}", self.path, self.reason)
    }
}

impl std::error::Error for FieldPathError {}

/// Describes why a response body could not be turned into a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// The body is not valid UTF-8.
    InvalidUtf8,
    /// The body is not a valid JSON document.
    InvalidJson(String),
    /// The path does not exist in the document.
    MissingField(String),
    /// The path exists, but does not point to a scalar.
    UnsupportedValue(String),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::InvalidUtf8 => write!(f, "body is not valid UTF-8"),
            ExtractError::InvalidJson(err) => {
                write!(f, "body is not valid JSON: {err}")
            }
            ExtractError::MissingField(path) => {
                write!(f, "field `{path}` is missing")
            }
            ExtractError::UnsupportedValue(path) => {
                write!(f, "field `{path}` is not a scalar")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

impl FieldPath {
    /// Parses a path expression.
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        let err = |reason| FieldPathError {
            path: path.to_owned(),
            reason,
        };

        if path.is_empty() {
            return Err(err("path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(idx) => part.split_at(idx),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(err("empty key segment"));
            }
            segments.push(Segment::Key(key.to_owned()));

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(err("unexpected characters after index"));
                };
                let Some(close) = inner.find(']') else {
                    return Err(err("unclosed bracket"));
                };
                let index = inner[..close]
                    .parse::<usize>()
                    .map_err(|_| err("index is not a number"))?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    /// Returns the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Navigates `document` and returns the field rendered as a string.
    ///
    /// Strings are returned verbatim, numbers and booleans are rendered with
    /// their JSON representation. Anything else is an error.
    pub fn extract(&self, document: &Value) -> Result<String, ExtractError> {
        let mut current = document;
        for segment in &self.segments {
            let next = match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(index) => current.get(*index),
            };
            current = next
                .ok_or_else(|| ExtractError::MissingField(self.to_string()))?;
        }

        match current {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(ExtractError::UnsupportedValue(self.to_string())),
        }
    }

    /// Decodes `body` as UTF-8 JSON and extracts the field.
    pub fn extract_from_bytes(
        &self,
        body: &[u8],
    ) -> Result<String, ExtractError> {
        let text = str::from_utf8(body).map_err(|_| ExtractError::InvalidUtf8)?;
        let document: Value = serde_json::from_str(text)
            .map_err(|err| ExtractError::InvalidJson(err.to_string()))?;
        self.extract(&document)
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if idx == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse() {
        let path = FieldPath::parse("current_condition[0].temp_C").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("current_condition".to_owned()),
                Segment::Index(0),
                Segment::Key("temp_C".to_owned()),
            ]
        );
        assert_eq!(path.to_string(), "current_condition[0].temp_C");

        let nested = FieldPath::parse("grid[1][2]").unwrap();
        assert_eq!(nested.segments().len(), 3);
    }

    #[test]
    fn test_parse_invalid() {
        for path in ["", ".a", "a..b", "a[", "a[x]", "a[0]b", "[0]"] {
            assert!(FieldPath::parse(path).is_err(), "{path} should fail");
        }
    }

    #[test]
    fn test_extract() {
        let doc = json!({
            "current_condition": [{ "temp_C": "21", "humidity": 40 }],
            "weather": [{ "maxtempC": "25", "hourly": [] }],
        });

        let temp: FieldPath = "current_condition[0].temp_C".parse().unwrap();
        assert_eq!(temp.extract(&doc).unwrap(), "21");

        let humidity: FieldPath =
            "current_condition[0].humidity".parse().unwrap();
        assert_eq!(humidity.extract(&doc).unwrap(), "40");

        let missing: FieldPath = "weather[3].maxtempC".parse().unwrap();
        assert_eq!(
            missing.extract(&doc).unwrap_err(),
            ExtractError::MissingField("weather[3].maxtempC".to_owned())
        );

        let array: FieldPath = "weather[0].hourly".parse().unwrap();
        assert!(matches!(
            array.extract(&doc),
            Err(ExtractError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_extract_from_bytes() {
        let path: FieldPath = "weather[0].maxtempC".parse().unwrap();
        assert_eq!(
            path.extract_from_bytes(br#"{"weather":[{"maxtempC":"30"}]}"#)
                .unwrap(),
            "30"
        );
        assert_eq!(
            path.extract_from_bytes(&[0xff, 0xfe]).unwrap_err(),
            ExtractError::InvalidUtf8
        );
        assert!(matches!(
            path.extract_from_bytes(b"Unknown location"),
            Err(ExtractError::InvalidJson(_))
        ));
    }
}
