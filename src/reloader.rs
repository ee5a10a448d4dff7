//! Policy file reloader
//!
//! Loads a file once up front, then polls its modification time and feeds
//! new contents to a callback whenever it changes. The initial load must
//! succeed; later failures are reported and the last good state stays.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::LoadError;

/// Background watcher for a single file. Stops when dropped.
pub struct Reloader {
    path: PathBuf,
    handle: JoinHandle<()>,
}

impl Reloader {
    /// Read `path`, hand it to `on_load`, and start polling for changes.
    /// Must be called from within a tokio runtime.
    pub fn new<L, E>(
        path: impl Into<PathBuf>,
        interval: Duration,
        on_load: L,
        on_error: E,
    ) -> Result<Self, LoadError>
    where
        L: Fn(&[u8]) -> Result<(), LoadError> + Send + Sync + 'static,
        E: Fn(LoadError) + Send + Sync + 'static,
    {
        let path = path.into();
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LoadError::NoRuntime(e.to_string()))?;

        let modified = std::fs::metadata(&path)?.modified()?;
        let contents = std::fs::read(&path)?;
        on_load(&contents)?;

        let handle = runtime.spawn(watch(path.clone(), interval, modified, on_load, on_error));
        Ok(Self { path, handle })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Reloader {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn watch<L, E>(
    path: PathBuf,
    interval: Duration,
    mut last_modified: SystemTime,
    on_load: L,
    on_error: E,
) where
    L: Fn(&[u8]) -> Result<(), LoadError>,
    E: Fn(LoadError),
{
    let mut ticker = tokio::time::interval(interval);
    // First tick fires immediately; the file was just loaded.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                on_error(e.into());
                continue;
            }
        };
        if modified <= last_modified {
            continue;
        }

        debug!("Detected change in {}", path.display());
        // A failed read is retried on the next tick
        match tokio::fs::read(&path).await {
            Ok(contents) => {
                last_modified = modified;
                if let Err(e) = on_load(&contents) {
                    on_error(e);
                }
            }
            Err(e) => on_error(e.into()),
        }
    }
}
