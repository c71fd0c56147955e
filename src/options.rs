use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Query options for the inquiry form widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    /// ISO two-letter language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Comma separated list of branch ids hidden from the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gmaps_api_key: Option<String>,
}

impl FormOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn exclude_branch(mut self, exclude_branch: impl Into<String>) -> Self {
        self.exclude_branch = Some(exclude_branch.into());
        self
    }

    pub fn exclude_branches<I>(self, branch_ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let joined = branch_ids
            .into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.exclude_branch(joined)
    }

    pub fn gmaps_api_key(mut self, gmaps_api_key: impl Into<String>) -> Self {
        self.gmaps_api_key = Some(gmaps_api_key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lang.is_none() && self.exclude_branch.is_none() && self.gmaps_api_key.is_none()
    }

    /// Present options in query order. Empty strings and `"0"` count as absent.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("lang", &self.lang),
            ("exclude_branch", &self.exclude_branch),
            ("gmaps_api_key", &self.gmaps_api_key),
        ]
        .into_iter()
        .filter_map(|(key, value)| present(value).map(|v| (key, v)))
        .collect()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty() && *v != "0")
}

/// Corner the certificate badge is pinned to. The widget defaults to `top-right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificatePosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CertificatePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for CertificatePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(format!(
                "unknown certificate position {other:?}; expected top-left, top-right, bottom-left or bottom-right"
            )),
        }
    }
}

impl fmt::Display for CertificatePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display options handed verbatim to the certificate widget.
///
/// Keys keep their insertion order when serialized. Nothing here is validated;
/// `cssPrefix` and `position` are the keys the widget understands today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateOptions(Map<String, Value>);

impl CertificateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn css_prefix(self, css_prefix: impl Into<String>) -> Self {
        self.insert("cssPrefix", css_prefix.into())
    }

    pub fn position(self, position: CertificatePosition) -> Self {
        self.insert("position", position.as_str())
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for CertificateOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Default)]
struct ConfigurationState {
    form: FormOptions,
    certificate: CertificateOptions,
}

/// Shared handle to form and certificate options.
///
/// Clones point at the same options: a toolkit holding a clone sees every later
/// `set_*` call. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    inner: Arc<RwLock<ConfigurationState>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_form_options(&self, options: FormOptions) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .form = options;
    }

    pub fn set_certificate_options(&self, options: CertificateOptions) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .certificate = options;
    }

    pub fn form_options(&self) -> FormOptions {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .form
            .clone()
    }

    pub fn certificate_options(&self) -> CertificateOptions {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .certificate
            .clone()
    }
}
