//! Services: the bag writer and the collaborator seams

pub mod bagit;
pub mod collaborators;

pub use bagit::{BagSummary, BagValidation, BagitService};
pub use collaborators::{
    CollaboratorError, EncodedProxy, ExtractedMetadata, MetadataExtractor, ProbedVideo,
    ProxyEncoder, ReverseGeocoder, Services, ThumbnailRenderer, VideoProber,
};
