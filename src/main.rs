use std::path::PathBuf;

use anyhow::Context;
use report_mailer::{EmailConfig, MessageComposer, ServerProfile, SmtpDelivery};

const USAGE: &str = "usage: report-mailer [--html <file>] <report>...";

fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut reports: Vec<PathBuf> = Vec::new();
    let mut html_path: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--html" => {
                let path = args.next().context(USAGE)?;
                html_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                eprintln!("{USAGE}");
                return Ok(());
            }
            _ => reports.push(PathBuf::from(arg)),
        }
    }

    let html = html_path
        .map(|path| {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read HTML body {}", path.display()))
        })
        .transpose()?;

    let profile = ServerProfile::from_env().context("Mail server configuration")?;
    let config = EmailConfig::from_env().context("Email configuration")?;

    MessageComposer::new(SmtpDelivery::new()).send(
        &reports,
        Some(&profile),
        Some(&config),
        html.as_deref(),
    )?;

    eprintln!("Sent {} report(s) to SMTP host {}", reports.len(), profile.host);
    Ok(())
}
