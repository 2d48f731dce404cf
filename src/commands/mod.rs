//! Command implementations and the connection session they share

pub mod config;
pub mod kinds;
pub mod pull;
pub mod push;

use anyhow::{Result, bail};
use reconcile::backend::DiscoveryApi;
use reconcile::backend::http::{HttpBackend, HttpConfig};
use reconcile::{Aborted, Registry, Summary, append_synthetic_descriptors};

use crate::Context;
use crate::config::{Config, config_path};
use crate::progress;
use crate::ui;

/// Connection settings resolved from the config file and overrides.
///
/// Nothing is sent to the server until [`Session::connect`] is called, and
/// even then only the client is built.
pub struct Session {
    context_name: String,
    http: Option<HttpConfig>,
}

impl Session {
    pub fn open(ctx: &Context) -> Result<Self> {
        let path = config_path(ctx.config_path.as_deref())?;
        let config = Config::load(&path)?;
        let (context_name, resolved) = config.resolve(&ctx.overrides)?;
        log::debug!("using context '{context_name}'");

        let http = resolved.server.clone().map(|server| {
            let mut http = HttpConfig::new(server, resolved.namespace());
            http.token.clone_from(&resolved.token);
            http
        });

        Ok(Self { context_name, http })
    }

    /// Build the HTTP client
    pub fn connect(&self) -> reconcile::Result<HttpBackend> {
        let config = self.http.clone().ok_or_else(|| {
            reconcile::Error::Config(format!(
                "no server configured for context '{}' (use --server or 'dashsync config set-context')",
                self.context_name
            ))
        })?;
        HttpBackend::new(config)
    }

    /// Discover the server's kinds and add the synthetic ones
    pub fn registry(&self, backend: &HttpBackend) -> Result<Registry> {
        let pb = progress::spinner("Discovering resource kinds...");
        match backend.discover() {
            Ok(discovered) => {
                pb.finish_and_clear();
                log::info!("{} kinds discovered on {}", discovered.len(), backend.base_url());
                Ok(Registry::new(append_synthetic_descriptors(&discovered)))
            }
            Err(e) => {
                progress::finish_error(&pb, "Discovery failed");
                Err(e.into())
            }
        }
    }
}

/// Print the outcome of one operation and pass its counts on.
///
/// An aborted operation still reports the counts it reached before the
/// error is returned.
pub fn report(
    verb: &str,
    what: &str,
    result: std::result::Result<Summary, Aborted>,
    dry_run: bool,
) -> Result<Summary> {
    let prefix = ui::dry_run_label(dry_run);
    match result {
        Ok(summary) if summary.failed == 0 => {
            ui::success(&format!("{prefix}{verb} {} {what}", summary.succeeded));
            Ok(summary)
        }
        Ok(summary) => {
            ui::warn(&format!(
                "{prefix}{verb} {} {what}, {} failed",
                summary.succeeded, summary.failed
            ));
            Ok(summary)
        }
        Err(aborted) => {
            ui::error(&format!(
                "{prefix}{verb} {} {what} before stopping ({} failed)",
                aborted.summary.succeeded, aborted.summary.failed
            ));
            Err(aborted.into())
        }
    }
}

/// Turn remaining failures into a non-zero exit
pub fn finish(total: &Summary) -> Result<()> {
    if total.failed > 0 {
        bail!("{} operations failed", total.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_passes_counts() {
        let summary = report("Pushed", "resources", Ok(Summary::new(2, 1)), false).unwrap();
        assert_eq!(summary, Summary::new(2, 1));
    }

    #[test]
    fn test_report_keeps_aborted_error() {
        let aborted = Aborted::new(Summary::new(1, 1), reconcile::Error::MissingUid);
        let err = report("Pushed", "alert rules", Err(aborted), false).unwrap_err();
        let aborted = err.downcast_ref::<Aborted>().unwrap();
        assert_eq!(aborted.summary, Summary::new(1, 1));
    }

    #[test]
    fn test_finish() {
        assert!(finish(&Summary::new(3, 0)).is_ok());
        assert!(finish(&Summary::new(3, 1)).is_err());
    }
}
