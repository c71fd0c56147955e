use crate::config::ApiSettings;
use crate::error::ToolkitError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Envelope returned by the form page endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FormPageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<FormPage>,
}

impl FormPageResponse {
    pub fn into_page(self) -> Result<FormPage, ToolkitError> {
        if !self.success {
            return Err(ToolkitError::Unsuccessful);
        }
        self.data.ok_or(ToolkitError::MissingData)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPage {
    /// Raw HTML placed above the form container.
    #[serde(default, deserialize_with = "null_as_default")]
    pub intro: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Raw HTML body.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Missing and `null` values both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Where the toolkit gets its form page content from.
#[async_trait]
pub trait FormPageSource: Send + Sync {
    async fn fetch_form_page(&self) -> Result<FormPage, ToolkitError>;
}

/// Fetches the form page from the partner API. Every call issues a new request.
#[derive(Clone)]
pub struct HttpFormPageSource {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl HttpFormPageSource {
    pub fn new(settings: ApiSettings) -> Result<Self, ToolkitError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl FormPageSource for HttpFormPageSource {
    async fn fetch_form_page(&self) -> Result<FormPage, ToolkitError> {
        let url = self.settings.form_page_url();
        let resp = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ToolkitError::Status(status));
        }
        let bytes = resp.bytes().await?;
        let response: FormPageResponse = serde_json::from_slice(&bytes)?;
        let page = response.into_page()?;
        debug!(%url, sections = page.sections.len(), "fetched form page");
        Ok(page)
    }
}

/// Source that always yields the same page. Useful for previews and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticFormPageSource {
    page: FormPage,
}

impl StaticFormPageSource {
    pub fn new(page: FormPage) -> Self {
        Self { page }
    }
}

#[async_trait]
impl FormPageSource for StaticFormPageSource {
    async fn fetch_form_page(&self) -> Result<FormPage, ToolkitError> {
        Ok(self.page.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_successful_response() {
        let body = r#"{
            "success": true,
            "data": {
                "intro": "<p>Hello</p>",
                "sections": [
                    {"link": "https://a.example", "image": "https://a.example/a.png", "title": "A", "text": "<p>a</p>"}
                ]
            }
        }"#;
        let response: FormPageResponse = serde_json::from_str(body).unwrap();
        let page = response.into_page().unwrap();
        assert_eq!(page.intro, "<p>Hello</p>");
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].title, "A");
    }

    #[test]
    fn unsuccessful_response_is_an_error() {
        let response: FormPageResponse =
            serde_json::from_str(r#"{"success": false, "data": {"intro": "x"}}"#).unwrap();
        assert!(matches!(
            response.into_page(),
            Err(ToolkitError::Unsuccessful)
        ));
    }

    #[test]
    fn success_without_data_is_an_error() {
        let response: FormPageResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(response.into_page(), Err(ToolkitError::MissingData)));
    }

    #[test]
    fn missing_section_fields_default_to_empty() {
        let page: FormPage =
            serde_json::from_str(r#"{"sections": [{"title": "Only a title"}]}"#).unwrap();
        assert_eq!(page.intro, "");
        assert_eq!(page.sections[0].link, "");
        assert_eq!(page.sections[0].title, "Only a title");
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let body = r#"{"success":true,"data":{"intro":"<p>hi</p>","sections":[{"link":"https://a","image":null,"title":"A","text":"t"}]}}"#;
        let response: FormPageResponse = serde_json::from_str(body).unwrap();
        let page = response.into_page().unwrap();
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].image, "");
        assert_eq!(page.sections[0].title, "A");

        let page: FormPage = serde_json::from_str(r#"{"intro":null,"sections":null}"#).unwrap();
        assert_eq!(page, FormPage::default());
    }

    #[tokio::test]
    async fn static_source_returns_its_page() {
        let page = FormPage {
            intro: "intro".into(),
            sections: vec![],
        };
        let source = StaticFormPageSource::new(page.clone());
        assert_eq!(source.fetch_form_page().await.unwrap(), page);
    }
}
