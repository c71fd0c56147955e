//! Server-side helpers for SteinRein partners: renders the partner form page
//! content and emits the inquiry form and certificate widget scripts.

pub mod config;
pub mod content;
pub mod error;
pub mod options;
pub mod render;
pub mod toolkit;

pub use config::ApiSettings;
pub use content::{
    ContentSection, FormPage, FormPageSource, HttpFormPageSource, StaticFormPageSource,
};
pub use error::ToolkitError;
pub use options::{CertificateOptions, CertificatePosition, Configuration, FormOptions};
pub use toolkit::{PartnerIdentity, Toolkit};
