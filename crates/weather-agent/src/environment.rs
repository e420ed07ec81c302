use std::env;
use std::fmt::{self, Debug, Display};

const SENTINEL: &str = "ERROR";

/// Names of the variables read by [`ModelEnvironment::load`].
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// See [`API_KEY_VAR`].
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
/// See [`API_KEY_VAR`].
pub const PROJECT_VAR: &str = "OPENAI_PROJECT";
/// See [`API_KEY_VAR`].
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Connection settings of the model provider, read from the environment.
///
/// If any setting is missing, every field holds the string `"ERROR"` and
/// [`Self::is_sentinel`] returns `true`.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelEnvironment {
    /// The API key.
    pub api_key: String,
    /// The base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// The project requests are billed to.
    pub project_id: String,
    /// The model to use.
    pub model_id: String,
}

impl ModelEnvironment {
    /// Reads the settings from the process environment.
    #[inline]
    pub fn load() -> Self {
        Self::load_with(|name| env::var(name).ok())
    }

    /// Reads the settings with `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn load_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                warn!("{name} is not set, model settings are unavailable");
            }
            value
        };

        let values =
            [API_KEY_VAR, BASE_URL_VAR, PROJECT_VAR, MODEL_VAR].map(read);
        let [Some(api_key), Some(base_url), Some(project_id), Some(model_id)] =
            values
        else {
            return Self::sentinel();
        };
        Self {
            api_key,
            base_url,
            project_id,
            model_id,
        }
    }

    /// Returns the record standing for unavailable settings.
    pub fn sentinel() -> Self {
        Self {
            api_key: SENTINEL.to_owned(),
            base_url: SENTINEL.to_owned(),
            project_id: SENTINEL.to_owned(),
            model_id: SENTINEL.to_owned(),
        }
    }

    /// Returns `true` if the settings are unavailable.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

impl Debug for ModelEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEnvironment")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl Display for ModelEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.is_sentinel() {
            SENTINEL
        } else {
            "<redacted>"
        };
        write!(
            f,
            "{{ api_key: {api_key}, base_url: {}, project_id: {}, \
             model_id: {} }}",
            self.base_url, self.project_id, self.model_id
        )
    }
}
