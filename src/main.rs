use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use steinrein_partner_toolkit::{
    ApiSettings, CertificateOptions, CertificatePosition, Configuration, FormOptions, Toolkit,
};
use tracing_subscriber::EnvFilter;

/// Prints the partner page snippets for a partner identity.
#[derive(Debug, Parser)]
#[command(name = "partner-toolkit", version)]
struct Cli {
    #[arg(long)]
    partner_id: u64,
    #[arg(long)]
    form_id: u64,
    #[arg(long)]
    form_api_key: String,
    /// ISO two-letter language code passed to the form.
    #[arg(long)]
    lang: Option<String>,
    /// Branch ids hidden from the form, comma separated.
    #[arg(long)]
    exclude_branch: Option<String>,
    #[arg(long)]
    gmaps_api_key: Option<String>,
    #[arg(long)]
    css_prefix: Option<String>,
    /// top-left, top-right, bottom-left or bottom-right
    #[arg(long)]
    position: Option<CertificatePosition>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Form page content fetched from the partner API.
    PageContent,
    FormScript,
    CertificateScript,
    /// Page content followed by both script snippets.
    All,
}

impl Cli {
    fn configuration(&self) -> Configuration {
        let configuration = Configuration::new();

        let mut form = FormOptions::new();
        form.lang = self.lang.clone();
        form.exclude_branch = self.exclude_branch.clone();
        form.gmaps_api_key = self.gmaps_api_key.clone();
        configuration.set_form_options(form);

        let mut certificate = CertificateOptions::new();
        if let Some(css_prefix) = &self.css_prefix {
            certificate = certificate.css_prefix(css_prefix.clone());
        }
        if let Some(position) = self.position {
            certificate = certificate.position(position);
        }
        configuration.set_certificate_options(certificate);

        configuration
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = ApiSettings::from_env()?;
    tracing::debug!(api_base = %settings.api_base(), "using partner api");

    let toolkit = Toolkit::with_configuration(
        cli.partner_id,
        cli.form_id,
        cli.form_api_key.clone(),
        cli.configuration(),
    )?
    .with_settings(settings)?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::PageContent => toolkit.render_form_page_content(&mut out).await,
        Command::FormScript => toolkit.render_form_script(&mut out),
        Command::CertificateScript => toolkit.render_certificate_script(&mut out),
        Command::All => {
            toolkit.render_form_page_content(&mut out).await?;
            writeln!(out)?;
            toolkit.render_form_script(&mut out)?;
            writeln!(out)?;
            toolkit.render_certificate_script(&mut out)
        }
    }
    .context("failed to write snippet to stdout")?;
    writeln!(out)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
