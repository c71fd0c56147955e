use crate::config::ApiSettings;
use crate::content::{FormPage, FormPageSource, HttpFormPageSource};
use crate::error::ToolkitError;
use crate::options::Configuration;
use crate::render::{certificate_options_script, render_form_page, script_tag};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// Partner, form and key that scope one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerIdentity {
    pub partner_id: u64,
    pub form_id: u64,
    pub form_api_key: String,
}

/// Renders the partner form page and the widget script tags for one partner identity.
///
/// ```no_run
/// use steinrein_partner_toolkit::{Configuration, FormOptions, Toolkit};
///
/// # async fn page() -> Result<(), steinrein_partner_toolkit::ToolkitError> {
/// let configuration = Configuration::new();
/// configuration.set_form_options(FormOptions::new().lang("de"));
///
/// let toolkit = Toolkit::with_configuration(1, 2, "form-api-key", configuration)?;
/// let content = toolkit.fetch_form_page_content().await;
/// let scripts = format!("{}{}", toolkit.form_script_tag(), toolkit.certificate_script_tags());
/// # let _ = (content, scripts);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Toolkit {
    identity: PartnerIdentity,
    configuration: Option<Configuration>,
    settings: ApiSettings,
    http_source: HttpFormPageSource,
    custom_source: Option<Arc<dyn FormPageSource>>,
}

impl Toolkit {
    pub fn new(
        partner_id: u64,
        form_id: u64,
        form_api_key: impl Into<String>,
    ) -> Result<Self, ToolkitError> {
        let settings = ApiSettings::default();
        let http_source = HttpFormPageSource::new(settings.clone())?;
        Ok(Self {
            identity: PartnerIdentity {
                partner_id,
                form_id,
                form_api_key: form_api_key.into(),
            },
            configuration: None,
            settings,
            http_source,
            custom_source: None,
        })
    }

    pub fn with_configuration(
        partner_id: u64,
        form_id: u64,
        form_api_key: impl Into<String>,
        configuration: Configuration,
    ) -> Result<Self, ToolkitError> {
        let mut toolkit = Self::new(partner_id, form_id, form_api_key)?;
        toolkit.configuration = Some(configuration);
        Ok(toolkit)
    }

    /// Points script urls and the HTTP source at different endpoints.
    /// A source set with [`Toolkit::with_source`] stays in place.
    pub fn with_settings(mut self, settings: ApiSettings) -> Result<Self, ToolkitError> {
        self.http_source = HttpFormPageSource::new(settings.clone())?;
        self.settings = settings;
        Ok(self)
    }

    /// Replaces where form page content comes from. Script urls are unaffected.
    pub fn with_source(mut self, source: Arc<dyn FormPageSource>) -> Self {
        self.custom_source = Some(source);
        self
    }

    pub fn identity(&self) -> &PartnerIdentity {
        &self.identity
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Drops any previous configuration; its options no longer affect output.
    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = Some(configuration);
    }

    pub fn clear_configuration(&mut self) {
        self.configuration = None;
    }

    pub async fn load_form_page(&self) -> Result<FormPage, ToolkitError> {
        match &self.custom_source {
            Some(source) => source.fetch_form_page().await,
            None => self.http_source.fetch_form_page().await,
        }
    }

    /// Form page HTML, or an empty string when the page cannot be loaded.
    pub async fn fetch_form_page_content(&self) -> String {
        match self.load_form_page().await {
            Ok(page) => render_form_page(&page),
            Err(err) => {
                debug!(
                    partner_id = self.identity.partner_id,
                    %err,
                    "form page unavailable; rendering nothing"
                );
                String::new()
            }
        }
    }

    pub async fn render_form_page_content<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let content = self.fetch_form_page_content().await;
        out.write_all(content.as_bytes())
    }

    pub fn build_form_script_url(&self) -> String {
        let mut url = self.settings.form_script_url();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("form_id", &self.identity.form_id.to_string())
                .append_pair("api_key", &self.identity.form_api_key);
            if let Some(configuration) = &self.configuration {
                let form = configuration.form_options();
                if !form.is_empty() {
                    for (key, value) in form.query_pairs() {
                        query.append_pair(key, value);
                    }
                }
            }
        }
        url.to_string()
    }

    pub fn form_script_tag(&self) -> String {
        script_tag(&self.build_form_script_url())
    }

    pub fn render_form_script<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.form_script_tag().as_bytes())
    }

    pub fn build_certificate_script_url(&self) -> String {
        self.settings
            .certificate_script_url(self.identity.partner_id)
            .to_string()
    }

    /// Optional inline options block followed by the certificate script tag.
    pub fn certificate_script_tags(&self) -> String {
        let mut html = String::new();
        if let Some(configuration) = &self.configuration {
            let options = configuration.certificate_options();
            if !options.is_empty() {
                match certificate_options_script(&options) {
                    Ok(script) => html.push_str(&script),
                    Err(err) => warn!(%err, "failed to serialize certificate options"),
                }
            }
        }
        html.push_str(&script_tag(&self.build_certificate_script_url()));
        html
    }

    pub fn render_certificate_script<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.certificate_script_tags().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSection, StaticFormPageSource};
    use crate::options::{CertificateOptions, CertificatePosition, FormOptions};
    use async_trait::async_trait;

    struct FailingSource;

    #[async_trait]
    impl FormPageSource for FailingSource {
        async fn fetch_form_page(&self) -> Result<FormPage, ToolkitError> {
            Err(ToolkitError::Unsuccessful)
        }
    }

    fn toolkit() -> Toolkit {
        Toolkit::new(42, 7, "secret key").unwrap()
    }

    #[test]
    fn form_script_url_without_configuration_has_only_identity() {
        assert_eq!(
            toolkit().build_form_script_url(),
            "https://partner.steinrein.com/api/form.js?form_id=7&api_key=secret+key"
        );
    }

    #[test]
    fn form_script_url_with_lang_only() {
        let configuration = Configuration::new();
        configuration.set_form_options(FormOptions::new().lang("de"));
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration).unwrap();
        let url = toolkit.build_form_script_url();
        assert!(url.ends_with("?form_id=7&api_key=k&lang=de"));
        assert!(!url.contains("exclude_branch"));
        assert!(!url.contains("gmaps_api_key"));
    }

    #[test]
    fn form_script_url_orders_and_encodes_options() {
        let configuration = Configuration::new();
        configuration.set_form_options(
            FormOptions::new()
                .gmaps_api_key("maps&key")
                .exclude_branches([1, 2])
                .lang("en"),
        );
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration).unwrap();
        assert_eq!(
            toolkit.build_form_script_url(),
            "https://partner.steinrein.com/api/form.js?form_id=7&api_key=k&lang=en&exclude_branch=1%2C2&gmaps_api_key=maps%26key"
        );
    }

    #[test]
    fn empty_form_values_are_left_out() {
        let configuration = Configuration::new();
        configuration.set_form_options(FormOptions::new().lang("").gmaps_api_key("0"));
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration).unwrap();
        assert_eq!(
            toolkit.build_form_script_url(),
            "https://partner.steinrein.com/api/form.js?form_id=7&api_key=k"
        );
    }

    #[test]
    fn form_script_tag_wraps_url() {
        let mut out = Vec::new();
        toolkit().render_form_script(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<script src="https://partner.steinrein.com/api/form.js?form_id=7&api_key=secret+key" defer></script>"#
        );
    }

    #[test]
    fn certificate_url_uses_partner_id() {
        assert_eq!(
            toolkit().build_certificate_script_url(),
            "https://partner.steinrein.com/api/certificate/42/main.js"
        );
    }

    #[test]
    fn certificate_script_without_options_is_just_the_tag() {
        let configuration = Configuration::new();
        configuration.set_form_options(FormOptions::new().lang("de"));
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration).unwrap();
        assert_eq!(
            toolkit.certificate_script_tags(),
            r#"<script src="https://partner.steinrein.com/api/certificate/42/main.js" defer></script>"#
        );
    }

    #[test]
    fn certificate_script_emits_options_before_tag() {
        let configuration = Configuration::new();
        configuration.set_certificate_options(
            CertificateOptions::new()
                .css_prefix("sr-certificate")
                .position(CertificatePosition::TopLeft),
        );
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration).unwrap();
        let mut out = Vec::new();
        toolkit.render_certificate_script(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                r#"<script type="text/javascript">var SRCertOptions = {"cssPrefix":"sr-certificate","position":"top-left"};</script>"#,
                r#"<script src="https://partner.steinrein.com/api/certificate/42/main.js" defer></script>"#
            )
        );
    }

    #[test]
    fn replacing_configuration_discards_old_options() {
        let old = Configuration::new();
        old.set_form_options(FormOptions::new().lang("de").gmaps_api_key("old-key"));
        old.set_certificate_options(CertificateOptions::new().css_prefix("old"));
        let mut toolkit = Toolkit::with_configuration(42, 7, "k", old).unwrap();

        let new = Configuration::new();
        new.set_form_options(FormOptions::new().lang("en"));
        toolkit.set_configuration(new);

        let url = toolkit.build_form_script_url();
        assert!(url.ends_with("&lang=en"));
        assert!(!url.contains("old-key"));
        assert!(!toolkit.certificate_script_tags().contains("SRCertOptions"));

        toolkit.clear_configuration();
        assert!(!toolkit.build_form_script_url().contains("lang="));
    }

    #[test]
    fn configuration_changes_after_construction_are_observed() {
        let configuration = Configuration::new();
        let toolkit = Toolkit::with_configuration(42, 7, "k", configuration.clone()).unwrap();
        assert!(!toolkit.build_form_script_url().contains("lang="));

        configuration.set_form_options(FormOptions::new().lang("it"));
        assert!(toolkit.build_form_script_url().ends_with("&lang=it"));
    }

    #[test]
    fn settings_move_script_urls() {
        let settings = ApiSettings::with_api_base("https://staging.example.com/api").unwrap();
        let toolkit = toolkit().with_settings(settings).unwrap();
        assert_eq!(
            toolkit.build_certificate_script_url(),
            "https://staging.example.com/api/certificate/42/main.js"
        );
        assert!(
            toolkit
                .build_form_script_url()
                .starts_with("https://staging.example.com/api/form.js?")
        );
    }

    #[tokio::test]
    async fn page_content_renders_sections_from_source() {
        let page = FormPage {
            intro: "<p>intro</p>".into(),
            sections: vec![ContentSection {
                link: "https://example.com".into(),
                image: "https://example.com/a.png".into(),
                title: "Title".into(),
                text: "Body".into(),
            }],
        };
        let toolkit = toolkit().with_source(Arc::new(StaticFormPageSource::new(page)));
        let mut out = Vec::new();
        toolkit.render_form_page_content(&mut out).await.unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.starts_with("<p>intro</p><div id=\"steinrein-form\"></div>"));
        assert!(html.contains("<h3><a href=\"https://example.com\" target=\"_blank\">Title</a></h3>"));
    }

    #[tokio::test]
    async fn custom_source_survives_new_settings() {
        let page = FormPage {
            intro: "<p>static</p>".into(),
            sections: vec![],
        };
        let settings = ApiSettings::with_api_base("http://127.0.0.1:9/api").unwrap();
        let toolkit = toolkit()
            .with_source(Arc::new(StaticFormPageSource::new(page)))
            .with_settings(settings)
            .unwrap();
        assert!(
            toolkit
                .fetch_form_page_content()
                .await
                .starts_with("<p>static</p>")
        );
        assert!(
            toolkit
                .build_certificate_script_url()
                .starts_with("http://127.0.0.1:9/api/")
        );
    }

    #[tokio::test]
    async fn failed_source_renders_nothing() {
        let toolkit = toolkit().with_source(Arc::new(FailingSource));
        assert_eq!(toolkit.fetch_form_page_content().await, "");
        assert!(matches!(
            toolkit.load_form_page().await,
            Err(ToolkitError::Unsuccessful)
        ));
    }
}
