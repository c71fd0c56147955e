use crate::content::{ContentSection, FormPage};
use crate::options::CertificateOptions;
use std::fmt::Write as _;

/// Element the form script mounts into.
pub const FORM_CONTAINER: &str = r#"<div id="steinrein-form"></div>"#;

/// Class of one rendered content section.
pub const ALTERNATING_BLOCK_CLASS: &str = "steinrein--layout-alternating-block";

pub const CERTIFICATE_OPTIONS_VAR: &str = "SRCertOptions";

/// Two-column grid whose even blocks swap sides; collapses to one column below 800px.
pub const LAYOUT_CSS: &str = r#"<style type="text/css">
.steinrein--layout-alternating-block {
    display: grid;
    grid-template-columns: 1fr 1fr;
    gap: 35px;
    align-items: center;
    margin-bottom: 60px;
}
.steinrein--layout-alternating-block:nth-child(even) *:nth-child(1) {
    grid-column: 2;
}
.steinrein--layout-alternating-block:nth-child(even) *:nth-child(2) {
    grid-column: 1;
    grid-row: 1;
}
.steinrein--layout-alternating-column img {
    width: 100% !important;
    display: block;
}
.steinrein--partner-voucher-code {
    background-color:#eee;
    border:1px solid #b4b4b4;
    border-radius:3px;
    box-shadow:0 1px 1px rgba(0,0,0,.2),inset 0 2px 0 0 hsla(0,0%,100%,.7);
    color:#333;
    display:inline-block;
    font-size:.85em;
    font-weight:700;
    line-height:1;
    padding:2px 4px;
    white-space:nowrap;
}

@media (max-width: 800px) {
    .steinrein--layout-alternating-block {
        grid-template-columns: 1fr;
        justify-items: center;
    }
    .steinrein--layout-alternating-block:nth-child(even) *:nth-child(1) {
        grid-column: unset;
    }
    .steinrein--layout-alternating-block:nth-child(even) *:nth-child(2) {
        grid-row: unset;
    }
}
</style>"#;

/// Renders the page as intro, form container, sections and layout CSS.
///
/// Remote values are inserted as-is. The partner API delivers rich text and is
/// trusted; sanitizing belongs to the embedding application.
pub fn render_form_page(page: &FormPage) -> String {
    let mut html = String::with_capacity(page.intro.len() + LAYOUT_CSS.len() + 512);
    html.push_str(&page.intro);
    html.push_str(FORM_CONTAINER);
    for section in &page.sections {
        render_section(&mut html, section);
    }
    html.push_str(LAYOUT_CSS);
    html
}

fn render_section(html: &mut String, section: &ContentSection) {
    let ContentSection {
        link,
        image,
        title,
        text,
    } = section;
    let _ = write!(
        html,
        r#"<div class="{ALTERNATING_BLOCK_CLASS}">
    <div class="steinrein--layout-alternating-column">
        <a href="{link}" target="_blank">
            <img src="{image}" alt="{title}">
        </a>
    </div>
    <div class="steinrein--layout-alternating-column">
        <h3><a href="{link}" target="_blank">{title}</a></h3>
        {text}
    </div>
</div>
"#
    );
}

pub fn script_tag(src: &str) -> String {
    format!(r#"<script src="{src}" defer></script>"#)
}

/// Inline script assigning the options to the global the certificate widget reads.
pub fn certificate_options_script(options: &CertificateOptions) -> serde_json::Result<String> {
    let json = serde_json::to_string(options)?;
    // `<\/` is still valid JSON but cannot terminate the surrounding script element.
    let json = json.replace("</", r"<\/");
    Ok(format!(
        r#"<script type="text/javascript">var {CERTIFICATE_OPTIONS_VAR} = {json};</script>"#
    ))
}
