//! Group of advisory listeners, one per account configuration file.

use crate::config::{AdvisoryConfig, ConfigError, ConnectionOptions};
use crate::listener::{AdvisoryListener, ListenerError};
use crate::metrics::JetStreamMetrics;
use crate::observability::events;
use crate::transport::{AdvisoryTransport, TransportStatus};
use futures::future::join_all;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "listener_group";
const CONFIG_EXTENSION: &str = "json";

pub enum GroupError {
    ReadDir { path: String, source: io::Error },
    Config(ConfigError),
    DuplicateId { id: String, source_id: String },
    Connect { source_id: String, status: TransportStatus },
}

impl Debug for GroupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::ReadDir { path, source } => write!(f, "ReadDir({path:?}, {source:?})"),
            GroupError::Config(err) => write!(f, "Config({err:?})"),
            GroupError::DuplicateId { id, source_id } => {
                write!(f, "DuplicateId({id:?}, {source_id:?})")
            }
            GroupError::Connect { source_id, status } => {
                write!(f, "Connect({source_id:?}, {status:?})")
            }
        }
    }
}

impl Display for GroupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::ReadDir { path, source } => write!(f, "open {path}: {source}"),
            GroupError::Config(err) => Display::fmt(err, f),
            GroupError::DuplicateId { id, source_id } => write!(
                f,
                "invalid JetStream advisory configuration: {source_id}: duplicate id {id}"
            ),
            GroupError::Connect { source_id, status } => {
                write!(f, "unable to connect for {source_id}: {status}")
            }
        }
    }
}

impl Error for GroupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GroupError::ReadDir { source, .. } => Some(source),
            GroupError::Config(err) => Some(err),
            GroupError::Connect { status, .. } => Some(status),
            GroupError::DuplicateId { .. } => None,
        }
    }
}

impl From<ConfigError> for GroupError {
    fn from(err: ConfigError) -> Self {
        GroupError::Config(err)
    }
}

/// Listeners sharing one set of metric families, each subscribed on a
/// transport connected with its own account's credentials.
#[derive(Debug)]
pub struct AdvisoryListenerGroup {
    listeners: Vec<AdvisoryListener>,
}

fn config_files(dir: &Path) -> Result<Vec<PathBuf>, GroupError> {
    let read_dir_err = |source| GroupError::ReadDir {
        path: dir.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION) {
            paths.push(path);
        } else {
            debug!(
                event = events::GROUP_CONFIG_SKIPPED,
                component = COMPONENT,
                path = %path.display(),
                "skipping non-configuration entry"
            );
        }
    }

    paths.sort();
    Ok(paths)
}

impl AdvisoryListenerGroup {
    /// Builds one listener per `*.json` file in `dir`, in file-name order.
    ///
    /// `connect` is called once per listener with `options` overlaid by that
    /// account's credentials, and returns the transport the listener
    /// subscribes on.
    pub fn from_dir<F>(
        dir: impl AsRef<Path>,
        options: &ConnectionOptions,
        mut connect: F,
        metrics: Arc<JetStreamMetrics>,
    ) -> Result<Self, GroupError>
    where
        F: FnMut(&ConnectionOptions) -> Result<Arc<dyn AdvisoryTransport>, TransportStatus>,
    {
        let mut seen = HashSet::new();
        let mut listeners = Vec::new();

        for path in config_files(dir.as_ref())? {
            let source_id = path.display().to_string();
            let config = AdvisoryConfig::load(&path)?;

            if !seen.insert(config.id().to_string()) {
                return Err(GroupError::DuplicateId {
                    id: config.id().to_string(),
                    source_id,
                });
            }

            let transport = connect(&options.for_account(&config)).map_err(|status| {
                GroupError::Connect {
                    source_id: source_id.clone(),
                    status,
                }
            })?;

            listeners.push(AdvisoryListener::from_config(
                &source_id,
                config,
                options,
                transport,
                metrics.clone(),
            ));
        }

        Ok(Self { listeners })
    }

    pub fn listeners(&self) -> &[AdvisoryListener] {
        &self.listeners
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Starts every listener. If one fails, the listeners started before it
    /// are stopped and the error is returned.
    pub async fn start_all(&self) -> Result<(), ListenerError> {
        for (started, listener) in self.listeners.iter().enumerate() {
            if let Err(err) = listener.start().await {
                warn!(
                    event = events::GROUP_START_ROLLBACK,
                    component = COMPONENT,
                    account = listener.account(),
                    started,
                    err = %err,
                    "listener failed to start, stopping the others"
                );
                join_all(self.listeners[..started].iter().map(|listener| listener.stop())).await;
                return Err(err);
            }
        }

        Ok(())
    }

    pub async fn stop_all(&self) {
        join_all(self.listeners.iter().map(|listener| listener.stop())).await;
    }
}
