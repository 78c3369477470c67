//! Collaborator contracts
//!
//! The engine depends on these capabilities but never on their
//! implementations: metadata extraction, video probing, thumbnail and
//! poster rendering, proxy encoding, and reverse geocoding all live behind
//! trait objects. The default bundle wires in stubs that fail with
//! `Unavailable`, which sends the corresponding jobs to the dead-letter
//! queue instead of blocking ingest.

use crate::domain::address::RawAddress;
use crate::library::Library;
use crate::shared::fingerprint::Fingerprint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extractor output for still images and documents
#[derive(Debug, Clone)]
pub struct ExtractedMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub date_taken: Option<DateTime<Utc>>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub gps: Option<(f64, f64)>,
    pub raw: JsonValue,
}

/// Prober output for videos
#[derive(Debug, Clone)]
pub struct ProbedVideo {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
    pub fps: Option<f64>,
    pub gps: Option<(f64, f64)>,
    pub raw: JsonValue,
}

/// Encoder output for video proxies
#[derive(Debug, Clone)]
pub struct EncodedProxy {
    pub proxy_path: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<ExtractedMetadata, CollaboratorError>;
}

#[async_trait]
pub trait VideoProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbedVideo, CollaboratorError>;
}

#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    /// Render a JPEG of the given pixel edge and return where it landed
    async fn render(
        &self,
        path: &Path,
        size: u32,
        fingerprint: &Fingerprint,
    ) -> Result<PathBuf, CollaboratorError>;
}

#[async_trait]
pub trait ProxyEncoder: Send + Sync {
    async fn encode(
        &self,
        path: &Path,
        fingerprint: &Fingerprint,
    ) -> Result<EncodedProxy, CollaboratorError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<RawAddress>, CollaboratorError>;
}

/// Stub that reports every capability as unavailable
struct Unavailable;

#[async_trait]
impl MetadataExtractor for Unavailable {
    async fn extract(&self, _path: &Path) -> Result<ExtractedMetadata, CollaboratorError> {
        Err(CollaboratorError::Unavailable("metadata extractor"))
    }
}

#[async_trait]
impl VideoProber for Unavailable {
    async fn probe(&self, _path: &Path) -> Result<ProbedVideo, CollaboratorError> {
        Err(CollaboratorError::Unavailable("video prober"))
    }
}

#[async_trait]
impl ThumbnailRenderer for Unavailable {
    async fn render(
        &self,
        _path: &Path,
        _size: u32,
        _fingerprint: &Fingerprint,
    ) -> Result<PathBuf, CollaboratorError> {
        Err(CollaboratorError::Unavailable("thumbnail renderer"))
    }
}

#[async_trait]
impl ProxyEncoder for Unavailable {
    async fn encode(
        &self,
        _path: &Path,
        _fingerprint: &Fingerprint,
    ) -> Result<EncodedProxy, CollaboratorError> {
        Err(CollaboratorError::Unavailable("proxy encoder"))
    }
}

#[async_trait]
impl ReverseGeocoder for Unavailable {
    async fn reverse(&self, _lat: f64, _lng: f64) -> Result<Option<RawAddress>, CollaboratorError> {
        Ok(None)
    }
}

/// Everything a job handler may touch
#[derive(Clone)]
pub struct Services {
    pub library: Arc<Library>,
    pub metadata: Arc<dyn MetadataExtractor>,
    pub prober: Arc<dyn VideoProber>,
    pub thumbs: Arc<dyn ThumbnailRenderer>,
    pub proxy: Arc<dyn ProxyEncoder>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
}

impl Services {
    /// A bundle with all collaborators stubbed out
    pub fn new(library: Arc<Library>) -> Self {
        Self {
            library,
            metadata: Arc::new(Unavailable),
            prober: Arc::new(Unavailable),
            thumbs: Arc::new(Unavailable),
            proxy: Arc::new(Unavailable),
            geocoder: Arc::new(Unavailable),
        }
    }

    pub fn with_metadata(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.metadata = extractor;
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn VideoProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_thumbs(mut self, thumbs: Arc<dyn ThumbnailRenderer>) -> Self {
        self.thumbs = thumbs;
        self
    }

    pub fn with_proxy(mut self, proxy: Arc<dyn ProxyEncoder>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }
}
