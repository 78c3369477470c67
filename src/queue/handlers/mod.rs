//! Background job handlers, one per named queue

mod bag_refresh;
mod live_photo;
mod location_stats;
mod metadata;
mod probe;
mod proxy;
mod thumbnail;

pub use bag_refresh::BagRefreshPayload;
pub use live_photo::LivePhotoPayload;
pub use location_stats::LocationStatsPayload;
pub use metadata::MetadataPayload;
pub use probe::ProbePayload;
pub use proxy::ProxyPayload;
pub use thumbnail::{ThumbVariant, ThumbnailPayload};

use super::types::queues;
use super::worker::JobHandler;
use std::sync::Arc;

/// Resolve the handler implementation for a named queue
pub fn handler_for(queue: &str) -> Option<Arc<dyn JobHandler>> {
    match queue {
        queues::EXIFTOOL => Some(Arc::new(metadata::MetadataHandler)),
        queues::FFPROBE => Some(Arc::new(probe::ProbeHandler)),
        queues::THUMBNAIL => Some(Arc::new(thumbnail::ThumbnailHandler)),
        queues::VIDEO_PROXY => Some(Arc::new(proxy::ProxyHandler)),
        queues::LIVE_PHOTO => Some(Arc::new(live_photo::LivePhotoHandler)),
        queues::BAGIT => Some(Arc::new(bag_refresh::BagRefreshHandler)),
        queues::LOCATION_STATS => Some(Arc::new(location_stats::LocationStatsHandler)),
        _ => None,
    }
}
