//! Ingest orchestrator
//!
//! Five strictly ordered stages: scan → hash → copy → validate → finalize.
//! The plan is a sum type carrying each stage's inputs, so resuming is a
//! fold from the persisted checkpoint instead of a switch over partial
//! state. After every stage the session row records the stage index and
//! result blob; a resume restarts at `last_step + 1` and never re-hashes
//! or re-copies work recorded in those blobs.

pub mod copier;
pub mod finalizer;
pub mod fingerprinter;
mod progress;
pub mod scanner;
pub mod types;
pub mod validator;

pub use types::{
    CopiedFile, CopyResult, CopyStrategy, FileCompleteEvent, FileCompleteFn, HashResult,
    HashedFile, IngestOptions, IngestReport, IngestStage, ProgressFn, ProgressUpdate, ScanResult,
    ScannedFile, SessionStatus, ValidateResult, ValidatedFile,
};

use crate::domain::location::Location;
use crate::error::{CoreError, CoreResult};
use crate::infrastructure::database::entities::import_session;
use crate::library::settings::SCAN_BYTES_PER_SEC;
use crate::library::Library;
use crate::shared::cancel::CancelToken;
use progress::ProgressTracker;
use scanner::ScanFilters;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Stage plan: each variant carries everything its stage needs, which
/// makes "which blobs must exist to resume here" explicit.
enum StagePlan {
    Scan,
    Hash(ScanResult),
    Copy(ScanResult, HashResult),
    Validate(ScanResult, HashResult, CopyResult),
    Finalize(ScanResult, HashResult, CopyResult, ValidateResult),
}

pub struct IngestEngine {
    library: Arc<Library>,
    running: Mutex<HashMap<String, CancelToken>>,
}

impl IngestEngine {
    pub fn new(library: Arc<Library>) -> Self {
        Self {
            library,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Start a new import session
    pub async fn import(
        &self,
        sources: Vec<PathBuf>,
        location_id: Uuid,
        options: IngestOptions,
    ) -> CoreResult<IngestReport> {
        let location = self.library.require_location(&location_id).await?;
        let session = self.library.create_session(&location_id, &sources).await?;
        info!("import session {} for {}", session.id, location.name);
        self.drive(session, location, StagePlan::Scan, options).await
    }

    /// Resume an interrupted session at its next stage. A missing stage
    /// blob is recoverable: the session restarts from scan.
    pub async fn resume(&self, session_id: &str, options: IngestOptions) -> CoreResult<IngestReport> {
        let session = self.library.require_session(session_id).await?;
        if !session.can_resume {
            return Err(CoreError::invalid_state(format!(
                "session {session_id} is not resumable"
            )));
        }
        let location_id = Uuid::parse_str(&session.location_id)
            .map_err(|e| CoreError::Invalid(format!("session location id: {e}")))?;
        let location = self.library.require_location(&location_id).await?;

        let plan = match plan_from_checkpoint(&session) {
            Ok(plan) => plan,
            Err(CoreError::ResumeMissingBlob { stage, .. }) => {
                warn!(
                    "session {session_id} lost its stage-{stage} blob, restarting from scan"
                );
                StagePlan::Scan
            }
            Err(e) => return Err(e),
        };

        info!("resuming session {} at step {}", session.id, session.last_step + 1);
        self.drive(session, location, plan, options).await
    }

    /// Cancel a session. Running sessions are cancelled cooperatively;
    /// a dormant non-terminal session row is marked cancelled directly.
    pub async fn cancel(&self, session_id: &str) -> CoreResult<bool> {
        if let Some(token) = self.running.lock().await.get(session_id) {
            token.cancel();
            return Ok(true);
        }
        let session = self.library.require_session(session_id).await?;
        let status = SessionStatus::parse(&session.status)
            .unwrap_or(SessionStatus::Failed);
        if status.is_terminal() {
            return Ok(false);
        }
        self.library
            .set_session_status(session_id, SessionStatus::Cancelled, None)
            .await?;
        Ok(true)
    }

    pub async fn list_resumable(&self) -> CoreResult<Vec<import_session::Model>> {
        self.library.list_resumable().await
    }

    async fn drive(
        &self,
        session: import_session::Model,
        location: Location,
        plan: StagePlan,
        options: IngestOptions,
    ) -> CoreResult<IngestReport> {
        // Merge the operator's token with the engine's own controller:
        // a child token observes both.
        let token = options
            .cancel
            .as_ref()
            .map(CancelToken::child)
            .unwrap_or_default();
        self.running
            .lock()
            .await
            .insert(session.id.clone(), token.clone());

        let result = self
            .run_stages(&session, &location, plan, &options, &token)
            .await;
        self.running.lock().await.remove(&session.id);

        match result {
            Ok(report) => Ok(report),
            Err(e) if e.is_cancelled() => {
                self.library
                    .set_session_status(&session.id, SessionStatus::Cancelled, None)
                    .await?;
                info!("session {} cancelled", session.id);
                Err(CoreError::Cancelled)
            }
            Err(e) => {
                self.library
                    .set_session_status(&session.id, SessionStatus::Failed, Some(e.to_string()))
                    .await?;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        session: &import_session::Model,
        location: &Location,
        mut plan: StagePlan,
        options: &IngestOptions,
        token: &CancelToken,
    ) -> CoreResult<IngestReport> {
        let library = &self.library;
        let session_id = session.id.as_str();
        let tracker = ProgressTracker::new(session_id.to_string(), options.on_progress.clone());
        let mut cached_strategy = session
            .copy_strategy
            .as_deref()
            .and_then(CopyStrategy::parse);
        let mut copy_throughput: Option<f64> = None;

        loop {
            token.check()?;
            plan = match plan {
                StagePlan::Scan => {
                    library
                        .set_session_status(session_id, SessionStatus::Scanning, None)
                        .await?;
                    let sources: Vec<PathBuf> = serde_json::from_str(&session.source_paths)?;
                    let filters = ScanFilters::from_patterns(&options.include, &options.exclude)?;
                    let scan = scanner::scan(library, &sources, &filters, token, &tracker).await?;
                    library
                        .set_session_totals(
                            session_id,
                            scan.total_files as i64,
                            scan.total_bytes as i64,
                        )
                        .await?;
                    library
                        .save_stage_result(session_id, 1, Some(serde_json::to_string(&scan)?))
                        .await?;
                    StagePlan::Hash(scan)
                }

                StagePlan::Hash(scan) => {
                    library
                        .set_session_status(session_id, SessionStatus::Hashing, None)
                        .await?;
                    let hashes = fingerprinter::fingerprint(
                        library,
                        &scan,
                        library.config().hash_concurrency(),
                        token,
                        &tracker,
                        options.on_file_complete.as_ref(),
                    )
                    .await?;
                    library
                        .save_stage_result(session_id, 2, Some(serde_json::to_string(&hashes)?))
                        .await?;
                    StagePlan::Copy(scan, hashes)
                }

                StagePlan::Copy(scan, hashes) => {
                    library
                        .set_session_status(session_id, SessionStatus::Copying, None)
                        .await?;

                    let strategy = match cached_strategy {
                        Some(strategy) => strategy,
                        None => {
                            let sample = scan
                                .files
                                .iter()
                                .find(|f| !f.should_skip)
                                .map(|f| f.original_path.clone());
                            let strategy = copier::select_strategy(
                                library.paths().root(),
                                sample.as_deref(),
                                options.force_strategy,
                            )
                            .await?;
                            library
                                .set_session_strategy(session_id, &strategy.to_string())
                                .await?;
                            cached_strategy = Some(strategy);
                            strategy
                        }
                    };

                    let copy_started = Instant::now();
                    let copies = copier::copy_files(
                        library,
                        location,
                        &scan,
                        &hashes,
                        strategy,
                        token,
                        &tracker,
                        options.on_file_complete.as_ref(),
                    )
                    .await?;

                    let copied_bytes: u64 = copies.files.iter().map(|c| c.bytes_copied).sum();
                    let elapsed = copy_started.elapsed().as_secs_f64();
                    if copied_bytes > 0 && elapsed > 0.0 {
                        copy_throughput = Some(copied_bytes as f64 / elapsed);
                    }

                    let files_copied = copies.files.iter().filter(|c| c.succeeded()).count() as i64;
                    let duplicates = copies
                        .files
                        .iter()
                        .filter(|c| c.copy_error.as_deref() == Some("Duplicate"))
                        .count() as i64;
                    let errors = copies
                        .files
                        .iter()
                        .filter(|c| {
                            c.copy_error.is_some() && c.copy_error.as_deref() != Some("Duplicate")
                        })
                        .count() as i64;
                    library
                        .set_session_counters(session_id, files_copied, duplicates, errors)
                        .await?;
                    library
                        .save_stage_result(session_id, 3, Some(serde_json::to_string(&copies)?))
                        .await?;
                    StagePlan::Validate(scan, hashes, copies)
                }

                StagePlan::Validate(scan, hashes, copies) => {
                    library
                        .set_session_status(session_id, SessionStatus::Validating, None)
                        .await?;
                    let validations = validator::validate_copies(
                        &scan,
                        &copies,
                        options.auto_rollback(),
                        token,
                        &tracker,
                    )
                    .await?;
                    library
                        .save_stage_result(session_id, 4, Some(serde_json::to_string(&validations)?))
                        .await?;
                    StagePlan::Finalize(scan, hashes, copies, validations)
                }

                StagePlan::Finalize(scan, hashes, copies, validations) => {
                    library
                        .set_session_status(session_id, SessionStatus::Finalizing, None)
                        .await?;
                    let outcome = finalizer::finalize(
                        library,
                        location,
                        session_id,
                        &scan,
                        &hashes,
                        &copies,
                        &validations,
                        options,
                        &tracker,
                    )
                    .await?;
                    library.save_stage_result(session_id, 5, None).await?;
                    library
                        .set_session_status(session_id, SessionStatus::Completed, None)
                        .await?;

                    if let Some(bytes_per_sec) = copy_throughput {
                        library
                            .set_setting(SCAN_BYTES_PER_SEC, &format!("{bytes_per_sec:.0}"))
                            .await?;
                    }

                    if options.delete_originals {
                        delete_originals(&scan, &copies, &validations).await;
                    }

                    let files_copied = copies.files.iter().filter(|c| c.succeeded()).count() as u64;
                    return Ok(IngestReport {
                        session_id: session_id.to_string(),
                        status: SessionStatus::Completed,
                        strategy: Some(copies.strategy),
                        total_files: scan.total_files,
                        total_bytes: scan.total_bytes,
                        files_copied,
                        duplicates: outcome.summary.duplicates as u64,
                        errors: outcome.summary.errors as u64,
                        import_id: Some(outcome.import_id),
                    });
                }
            };
        }
    }
}

/// Build the resume plan from the persisted checkpoint. Requires every
/// blob the target stage consumes; a gap surfaces as `ResumeMissingBlob`.
fn plan_from_checkpoint(session: &import_session::Model) -> CoreResult<StagePlan> {
    fn blob<T: serde::de::DeserializeOwned>(
        session: &import_session::Model,
        stage: u8,
        raw: &Option<String>,
    ) -> CoreResult<T> {
        let raw = raw.as_deref().ok_or(CoreError::ResumeMissingBlob {
            session_id: session.id.clone(),
            stage,
        })?;
        Ok(serde_json::from_str(raw)?)
    }

    Ok(match session.last_step {
        0 => StagePlan::Scan,
        1 => StagePlan::Hash(blob(session, 1, &session.scan_result)?),
        2 => StagePlan::Copy(
            blob(session, 1, &session.scan_result)?,
            blob(session, 2, &session.hash_result)?,
        ),
        3 => StagePlan::Validate(
            blob(session, 1, &session.scan_result)?,
            blob(session, 2, &session.hash_result)?,
            blob(session, 3, &session.copy_result)?,
        ),
        4 => StagePlan::Finalize(
            blob(session, 1, &session.scan_result)?,
            blob(session, 2, &session.hash_result)?,
            blob(session, 3, &session.copy_result)?,
            blob(session, 4, &session.validate_result)?,
        ),
        step => {
            return Err(CoreError::invalid_state(format!(
                "session {} already finalized (step {step})",
                session.id
            )))
        }
    })
}

/// Best-effort removal of source files whose copies validated
async fn delete_originals(scan: &ScanResult, copies: &CopyResult, validations: &ValidateResult) {
    let valid: std::collections::HashSet<u64> = validations
        .files
        .iter()
        .filter(|v| v.valid)
        .map(|v| v.file_id)
        .collect();
    let path_of: HashMap<u64, &PathBuf> =
        scan.files.iter().map(|f| (f.id, &f.original_path)).collect();

    for copied in &copies.files {
        if !copied.succeeded() || !valid.contains(&copied.file_id) {
            continue;
        }
        if let Some(path) = path_of.get(&copied.file_id) {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("could not delete original {}: {}", path.display(), e);
            }
        }
    }
}
