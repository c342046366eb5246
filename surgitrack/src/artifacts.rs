//! Instrument label artifact boundary.
//!
//! Every inserted instrument gets a scannable label image keyed by its
//! assigned id. This module defines the `ArtifactGenerator` trait which
//! abstracts where those blobs end up; callers only care that the blob
//! exists, never about its format.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::ArtifactsConfig;
use crate::types::InstrumentId;

/// Create an artifact generator from configuration
///
/// This is the single point where we convert config into generator instances.
/// Adding a new backend requires adding a match arm here.
pub fn create_generator(config: &ArtifactsConfig) -> Arc<dyn ArtifactGenerator> {
    match config {
        ArtifactsConfig::Filesystem { directory } => Arc::new(FsArtifacts::new(directory.clone())),
        ArtifactsConfig::Disabled => Arc::new(NoopArtifacts),
    }
}

/// Result type for artifact generation
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Errors that can occur while producing or persisting a label blob
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to persist label artifact: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ArtifactError> for crate::errors::Error {
    fn from(err: ArtifactError) -> Self {
        crate::errors::Error::Other(anyhow::Error::from(err))
    }
}

/// Abstract label generator interface
///
/// Implementors persist an identifier-keyed image blob somewhere retrievable
/// (local disk, object storage, a label printer spooler).
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    /// Produce and persist the label blob for an instrument id.
    async fn generate(&self, id: InstrumentId) -> Result<()>;
}

/// Local filesystem backend - writes one SVG label per instrument under a
/// directory. Useful for development and single-node deployments.
pub struct FsArtifacts {
    directory: PathBuf,
}

impl FsArtifacts {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn label_path(&self, id: InstrumentId) -> PathBuf {
        self.directory.join(format!("instrument-{id}.svg"))
    }
}

#[async_trait]
impl ArtifactGenerator for FsArtifacts {
    async fn generate(&self, id: InstrumentId) -> Result<()> {
        fs::create_dir_all(&self.directory).await?;

        let path = self.label_path(id);
        let mut file = fs::File::create(&path).await?;
        file.write_all(render_label(id).as_bytes()).await?;
        file.sync_all().await?;

        tracing::debug!(instrument_id = id, path = %path.display(), "Wrote instrument label artifact");
        Ok(())
    }
}

/// Discards label artifacts. Used in tests and in deployments where labels
/// are produced by an external system.
pub struct NoopArtifacts;

#[async_trait]
impl ArtifactGenerator for NoopArtifacts {
    async fn generate(&self, _id: InstrumentId) -> Result<()> {
        Ok(())
    }
}

/// Minimal SVG label carrying the instrument id in machine-readable text.
fn render_label(id: InstrumentId) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="144" height="48">
<rect width="144" height="48" fill="white" stroke="black"/>
<text x="12" y="31" font-family="monospace" font-size="18">INSTR-{id:06}</text>
</svg>
"#
    )
}
