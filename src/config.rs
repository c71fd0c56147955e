use crate::error::ToolkitError;
use anyhow::Context;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://partner.steinrein.com/api/";
pub const DEFAULT_USER_AGENT: &str = "SteinRein Inquiry Form";

const FORM_PAGE_PATH: &str = "form-page.json";
const FORM_SCRIPT_PATH: &str = "form.js";

/// Endpoints and request identity used when talking to the partner API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_base", deserialize_with = "deserialize_api_base")]
    api_base: Url,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("default api base should be a valid url")
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn deserialize_api_base<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_api_base(&raw).map_err(de::Error::custom)
}

/// Parses a base url and normalizes it to a directory: trailing `/`, no query or fragment.
fn parse_api_base(api_base: &str) -> Result<Url, ToolkitError> {
    let invalid = |reason: String| ToolkitError::InvalidBaseUrl {
        url: api_base.to_string(),
        reason,
    };
    let mut url = Url::parse(api_base).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

impl ApiSettings {
    /// Settings rooted at a different API base, e.g. a staging host or a local test server.
    /// The base is treated as a directory whether or not it ends with `/`.
    pub fn with_api_base(api_base: &str) -> Result<Self, ToolkitError> {
        Ok(Self {
            api_base: parse_api_base(api_base)?,
            ..Self::default()
        })
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Reads `STEINREIN_API_BASE` and `STEINREIN_USER_AGENT`, falling back to the production defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = match std::env::var("STEINREIN_API_BASE") {
            Ok(base) => Self::with_api_base(&base).context("failed to parse STEINREIN_API_BASE")?,
            Err(_) => Self::default(),
        };
        let user_agent =
            std::env::var("STEINREIN_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        Ok(settings.user_agent(user_agent))
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn form_page_url(&self) -> Url {
        self.endpoint(FORM_PAGE_PATH)
    }

    pub fn form_script_url(&self) -> Url {
        self.endpoint(FORM_SCRIPT_PATH)
    }

    pub fn certificate_script_url(&self, partner_id: u64) -> Url {
        self.endpoint(&format!("certificate/{partner_id}/main.js"))
    }

    fn endpoint(&self, path: &str) -> Url {
        // Bases are hierarchical (see `parse_api_base`), so joining a relative path cannot fail.
        self.api_base
            .join(path)
            .unwrap_or_else(|_| self.api_base.clone())
    }
}
