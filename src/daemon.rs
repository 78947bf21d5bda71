//! Daemon - the announcer service
//!
//! Wires the contact directory, speech lifecycle, pipeline, and control API
//! together and runs until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::{ApiServer, IngestTracker};
use crate::config::Config;
use crate::directory::{ContactResolver, NullDirectory, SqliteDirectory, StaticDirectory};
use crate::pipeline::PipelineController;
use crate::speech::{RemoteEngineProvider, SpeechEngineLifecycle};
use crate::Result;

/// The herald daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from loaded configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if startup wiring fails; runtime failures inside the
    /// pipeline are logged, never fatal.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            port = self.config.api_port,
            provider = %self.config.speech.provider,
            "daemon starting"
        );

        let directory = self.build_directory();

        let provider = Arc::new(RemoteEngineProvider::new(self.config.speech.clone()));
        let speech = Arc::new(SpeechEngineLifecycle::new(
            provider,
            Duration::from_secs(self.config.speech.start_timeout_secs),
        ));

        let ingest = Arc::new(IngestTracker::new());
        let controller = Arc::new(PipelineController::new(
            speech,
            directory,
            self.config.announce.clone(),
            Arc::clone(&ingest) as Arc<dyn crate::pipeline::CompletionSink>,
        ));

        if self.config.enable_on_start {
            tracing::info!("enabling speech at startup");
            controller.enable().await;
        }

        let api = ApiServer::new(Arc::clone(&controller), ingest, self.config.api_port);
        let _api_handle = api.spawn();

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        tracing::info!("herald ready");
        shutdown_rx.recv().await;

        tracing::info!("shutting down");
        controller.stop().await;
        tracing::info!("daemon stopped");

        Ok(())
    }

    /// Pick the contact directory backend
    ///
    /// SQLite wins when configured; the contacts file is next; with neither,
    /// raw addresses are spoken.
    fn build_directory(&self) -> Arc<dyn ContactResolver> {
        if let Some(db_path) = &self.config.directory.contacts_db {
            match SqliteDirectory::open(db_path) {
                Ok(dir) => {
                    tracing::info!(path = %db_path.display(), "using SQLite contact directory");
                    return Arc::new(dir);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %db_path.display(),
                        error = %e,
                        "failed to open contacts database, trying contacts file"
                    );
                }
            }
        }

        let contacts = self.config.load_contacts();
        if contacts.is_empty() {
            tracing::info!("no contact directory configured, raw addresses will be spoken");
            Arc::new(NullDirectory)
        } else {
            Arc::new(StaticDirectory::new(&contacts))
        }
    }
}
