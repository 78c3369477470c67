//! Weighted stage progress
//!
//! Overall progress is the sum of completed stage weights plus the current
//! stage's fraction of its own weight: scan 5, hash 35, copy 40,
//! validate 15, finalize 5. Emission is clamped monotone.

use super::types::{IngestStage, ProgressFn, ProgressUpdate};
use std::sync::Mutex;

fn weight(stage: IngestStage) -> f32 {
    match stage {
        IngestStage::Scan => 5.0,
        IngestStage::Hash => 35.0,
        IngestStage::Copy => 40.0,
        IngestStage::Validate => 15.0,
        IngestStage::Finalize => 5.0,
    }
}

fn base(stage: IngestStage) -> f32 {
    match stage {
        IngestStage::Scan => 0.0,
        IngestStage::Hash => 5.0,
        IngestStage::Copy => 40.0,
        IngestStage::Validate => 80.0,
        IngestStage::Finalize => 95.0,
    }
}

pub(crate) struct ProgressTracker {
    session_id: String,
    on_progress: Option<ProgressFn>,
    last_emitted: Mutex<f32>,
}

impl ProgressTracker {
    pub fn new(session_id: String, on_progress: Option<ProgressFn>) -> Self {
        Self {
            session_id,
            on_progress,
            last_emitted: Mutex::new(0.0),
        }
    }

    /// Report in-stage progress; `fraction` in [0, 1]
    pub fn emit(&self, stage: IngestStage, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let overall = base(stage) + fraction * weight(stage);

        let overall = {
            let mut last = self.last_emitted.lock().unwrap_or_else(|e| e.into_inner());
            if overall < *last {
                *last
            } else {
                *last = overall;
                overall
            }
        };

        if let Some(on_progress) = &self.on_progress {
            on_progress(ProgressUpdate {
                session_id: self.session_id.clone(),
                stage,
                stage_fraction: fraction,
                overall_percent: overall.min(100.0),
            });
        }
    }

    pub fn stage_done(&self, stage: IngestStage) {
        self.emit(stage, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn bands_line_up_with_weights() {
        assert_eq!(base(IngestStage::Hash), 5.0);
        assert_eq!(base(IngestStage::Copy), 40.0);
        assert_eq!(base(IngestStage::Validate), 80.0);
        assert_eq!(base(IngestStage::Finalize) + weight(IngestStage::Finalize), 100.0);
    }

    #[test]
    fn progress_is_monotone() {
        let max_seen = Arc::new(AtomicU32::new(0));
        let seen = max_seen.clone();
        let tracker = ProgressTracker::new(
            "s".to_string(),
            Some(Arc::new(move |update: crate::ingest::types::ProgressUpdate| {
                let scaled = (update.overall_percent * 100.0) as u32;
                let prev = seen.fetch_max(scaled, Ordering::SeqCst);
                assert!(scaled >= prev);
            })),
        );

        tracker.emit(IngestStage::Scan, 0.5);
        tracker.emit(IngestStage::Hash, 0.2);
        // A stale lower report must not regress the emitted percentage
        tracker.emit(IngestStage::Scan, 0.1);
        tracker.emit(IngestStage::Copy, 1.0);
        assert!(max_seen.load(Ordering::SeqCst) >= 8_000);
    }
}
