//! Artifact sinks for captured pages

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors raised while persisting an artifact
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error writing '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid artifact name '{0}'")]
    InvalidName(String),
}

/// Destination for captured HTML
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persists `content` under `name`, replacing any previous artifact
    async fn save_html(&self, name: &str, content: &str) -> Result<(), SinkError>;
}

/// Writes artifacts as files under one directory
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Rejects names that would escape the sink directory
fn check_name(name: &str) -> Result<(), SinkError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name.contains("..")
    {
        return Err(SinkError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn save_html(&self, name: &str, content: &str) -> Result<(), SinkError> {
        check_name(name)?;

        let io_err = |source| SinkError::Io {
            name: name.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;

        let path = self.root.join(name);
        tokio::fs::write(&path, content).await.map_err(io_err)?;

        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }
}
