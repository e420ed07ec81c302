use std::fmt::{self, Display};

use reqwest::Url;

/// The error returned when a [`UrlTemplate`] base is not a usable URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplateError {
    base: String,
    reason: String,
}

impl Display for UrlTemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid base URL `{}`: {}", self.base, self.reason)
    }
}

impl std::error::Error for UrlTemplateError {}

/// Maps an identifier to a fully-qualified URL.
///
/// The identifier is appended to the base URL as a single path segment
/// (percent-encoded as needed), followed by the fixed query string.
///
/// Identifiers that URL normalization would drop from the path (the empty
/// string, `.` and `..`) have no URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplate {
    base: Url,
    query: Option<String>,
}

impl UrlTemplate {
    /// Creates a template from a base URL such as `https://wttr.in/`.
    pub fn new(base: &str) -> Result<Self, UrlTemplateError> {
        let err = |reason: String| UrlTemplateError {
            base: base.to_owned(),
            reason,
        };
        let base = Url::parse(base).map_err(|e| err(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(err("URL cannot be a base".to_owned()));
        }
        Ok(Self { base, query: None })
    }

    /// Sets the query string appended to every rendered URL.
    #[inline]
    pub fn with_query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Renders the URL for `identifier`.
    ///
    /// Returns `None` if `identifier` cannot be kept as a path segment.
    pub fn render(&self, identifier: &str) -> Option<Url> {
        if matches!(identifier, "" | "." | "..") {
            return None;
        }
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs.
        url.path_segments_mut().ok()?.pop_if_empty().push(identifier);
        url.set_query(self.query.as_deref());
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let template = UrlTemplate::new("https://wttr.in/")
            .unwrap()
            .with_query("format=j1");
        assert_eq!(
            template.render("Berlin").unwrap().as_str(),
            "https://wttr.in/Berlin?format=j1"
        );
        assert_eq!(
            template.render("Los Angeles").unwrap().as_str(),
            "https://wttr.in/Los%20Angeles?format=j1"
        );
        assert_eq!(
            template.render("a/b").unwrap().as_str(),
            "https://wttr.in/a%2Fb?format=j1"
        );
    }

    #[test]
    fn test_render_without_trailing_slash() {
        let template = UrlTemplate::new("http://localhost:8080/api").unwrap();
        assert_eq!(
            template.render("NY").unwrap().as_str(),
            "http://localhost:8080/api/NY"
        );
    }

    #[test]
    fn test_render_dot_segments() {
        let template = UrlTemplate::new("https://wttr.in/")
            .unwrap()
            .with_query("format=j1");
        assert_eq!(template.render(""), None);
        assert_eq!(template.render("."), None);
        assert_eq!(template.render(".."), None);
        assert_eq!(
            template.render("...").unwrap().as_str(),
            "https://wttr.in/...?format=j1"
        );
        assert_eq!(
            template.render("St. Louis").unwrap().as_str(),
            "https://wttr.in/St.%20Louis?format=j1"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(UrlTemplate::new("not a url").is_err());
        assert!(UrlTemplate::new("mailto:someone@example.com").is_err());
    }
}
