// src/patrol.rs

//! The `Patrol` definition: what an embedding program hands to patrol.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::WatchPoint;
use crate::engine::{Outcome, Supervisor, SupervisorOptions};
use crate::errors::{PatrolError, Result};
use crate::inspect::{Bootstrap, Inspection};
use crate::watch::{FileEventSource, NotifyEventSource};

/// A named routine subscribed to the watch points listed in its watch file.
///
/// Build one with [`Patrol::builder`].
#[derive(Clone)]
pub struct Patrol {
    name: String,
    help: String,
    file_name: String,
    bootstrap: Option<Arc<dyn Bootstrap>>,
    inspection: Arc<dyn Inspection>,
    debug: bool,
}

impl fmt::Debug for Patrol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patrol")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("bootstrap", &self.bootstrap.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Patrol {
    pub fn builder(name: impl Into<String>) -> PatrolBuilder {
        PatrolBuilder::new(name)
    }

    /// Name of the CLI command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shown by `--help`.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Name of the watch file, looked up in the working directory.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Location of the watch file when running from `base_dir`.
    pub fn config_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.file_name)
    }

    /// The clap command for this patrol, named after it.
    pub fn command(&self) -> clap::Command {
        CliArgs::command()
            .name(self.name.clone())
            .about(self.help.clone())
    }

    /// Parse the process arguments, exiting with usage on error.
    pub fn parse_args(&self) -> CliArgs {
        let matches = self.command().get_matches();
        CliArgs::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Parse an explicit argument list (first item is the binary name).
    pub fn try_parse_from<I, T>(&self, args: I) -> std::result::Result<CliArgs, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;
        CliArgs::from_arg_matches(&matches)
    }

    /// Supervisor options for a given command line.
    pub fn options(&self, args: &CliArgs) -> SupervisorOptions {
        SupervisorOptions {
            run_once: args.run_once,
            dry_run: args.dry_run,
            debug: self.debug || args.debug,
            run_once_timeout: args.run_once_timeout,
        }
    }

    /// Make sure the watch file exists, bootstrapping it if possible.
    pub fn ensure_config(&self, config_path: &Path) -> Result<()> {
        if config_path.exists() {
            return Ok(());
        }

        let Some(bootstrap) = &self.bootstrap else {
            return Err(PatrolError::ConfigMissing(config_path.to_path_buf()));
        };

        info!(config = ?config_path, "bootstrapping watch file");
        if !bootstrap.bootstrap(config_path) {
            return Err(PatrolError::ConfigMissing(config_path.to_path_buf()));
        }
        if !config_path.exists() {
            warn!(config = ?config_path, "bootstrap reported success but created nothing");
            return Err(PatrolError::ConfigMissing(config_path.to_path_buf()));
        }

        Ok(())
    }

    /// High-level entry point used by binaries.
    ///
    /// Watches `<cwd>/<file_name>` with the platform watcher and stops on
    /// Ctrl-C.
    pub async fn run(&self, args: CliArgs) -> Result<Outcome> {
        let base_dir = std::env::current_dir()?;
        let shutdown = CancellationToken::new();

        // Ctrl-C → graceful shutdown.
        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                shutdown.cancel();
            });
        }

        let outcome = self
            .run_with(NotifyEventSource::new(), &base_dir, &args, shutdown)
            .await?;
        info!(?outcome, "{} finished", self.name);
        Ok(outcome)
    }

    /// Run against an explicit event source, base directory and shutdown
    /// token.
    pub async fn run_with<S: FileEventSource>(
        &self,
        source: S,
        base_dir: &Path,
        args: &CliArgs,
        shutdown: CancellationToken,
    ) -> Result<Outcome> {
        let config_path = self.config_path(base_dir);
        self.ensure_config(&config_path)?;

        let supervisor = self.supervisor(source, base_dir, args);
        supervisor.run(shutdown).await
    }

    /// Build the supervisor without running it (e.g. to follow its status).
    pub fn supervisor<S: FileEventSource>(
        &self,
        source: S,
        base_dir: &Path,
        args: &CliArgs,
    ) -> Supervisor<S> {
        Supervisor::new(
            source,
            self.config_path(base_dir),
            base_dir,
            Arc::clone(&self.inspection),
            self.options(args),
        )
    }
}

/// Builder for [`Patrol`]. Checked eagerly by [`PatrolBuilder::build`].
#[derive(Default)]
pub struct PatrolBuilder {
    name: String,
    help: Option<String>,
    file_name: Option<String>,
    bootstrap: Option<Arc<dyn Bootstrap>>,
    inspection: Option<Arc<dyn Inspection>>,
    debug: bool,
}

impl PatrolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Defaults to `<name>.yaml`.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Called once at startup if the watch file does not exist.
    pub fn bootstrap<F>(mut self, bootstrap: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.bootstrap = Some(Arc::new(bootstrap));
        self
    }

    /// Called whenever a watch point changes.
    pub fn on_inspection<F>(mut self, inspection: F) -> Self
    where
        F: Fn(&WatchPoint, bool) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inspection = Some(Arc::new(inspection));
        self
    }

    /// Like [`PatrolBuilder::on_inspection`], for `Inspection` implementors.
    pub fn inspector(mut self, inspection: impl Inspection) -> Self {
        self.inspection = Some(Arc::new(inspection));
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> Result<Patrol> {
        if self.name.trim().is_empty() {
            return Err(PatrolError::Invalid("name not set".to_string()));
        }
        let help = self
            .help
            .ok_or_else(|| PatrolError::Invalid("help not set".to_string()))?;
        let inspection = self
            .inspection
            .ok_or_else(|| PatrolError::Invalid("on_inspection missing".to_string()))?;

        let file_name = match self.file_name {
            Some(file_name) if file_name.trim().is_empty() => {
                return Err(PatrolError::Invalid("file name is blank".to_string()));
            }
            Some(file_name) => file_name,
            None => format!("{}.yaml", self.name),
        };

        Ok(Patrol {
            name: self.name,
            help,
            file_name,
            bootstrap: self.bootstrap,
            inspection,
            debug: self.debug,
        })
    }
}
