//! Durable priority job queue
//!
//! One `jobs` table drives all background work. Claiming is a
//! compare-and-set: a single `UPDATE ... WHERE status = 'pending' AND
//! locked_by IS NULL`; zero rows updated means another worker won the race.
//! Jobs that exhaust their retry budget land in `job_dead_letter`.

use super::error::{QueueError, QueueResult};
use super::types::{JobStatus, NewJob};
use crate::infrastructure::database::entities::{dead_letter, job};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Ceiling for the exponential retry backoff
const MAX_BACKOFF_MS: i64 = 60_000;

/// Retry delay before the next attempt. `attempts` is the number of
/// attempts already made: 1_000, 2_000, 4_000, ... capped at 60_000.
pub fn backoff_ms(attempts: i32) -> i64 {
    let exponent = attempts.saturating_sub(1).clamp(0, 10) as u32;
    (1_000i64 << exponent).min(MAX_BACKOFF_MS)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Aggregate counters for one named queue
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub dead: u64,
}

#[derive(Clone)]
pub struct JobQueue {
    conn: DatabaseConnection,
    stale_timeout: Duration,
}

impl JobQueue {
    pub fn new(conn: DatabaseConnection, stale_timeout: Duration) -> Self {
        Self { conn, stale_timeout }
    }

    /// Enqueue a single job
    pub async fn enqueue(&self, new_job: NewJob) -> QueueResult<String> {
        let id = Uuid::new_v4().to_string();
        self.insert_model(&self.conn, &id, &new_job).await?;
        debug!("enqueued {} on {}", id, new_job.queue);
        Ok(id)
    }

    /// Enqueue a batch in one transaction; ids return in input order
    pub async fn enqueue_many(&self, new_jobs: Vec<NewJob>) -> QueueResult<Vec<String>> {
        let txn = self.conn.begin().await?;
        let mut ids = Vec::with_capacity(new_jobs.len());
        for new_job in &new_jobs {
            let id = Uuid::new_v4().to_string();
            self.insert_model(&txn, &id, new_job).await?;
            ids.push(id);
        }
        txn.commit().await?;
        Ok(ids)
    }

    async fn insert_model<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        new_job: &NewJob,
    ) -> QueueResult<()> {
        job::ActiveModel {
            id: Set(id.to_string()),
            queue: Set(new_job.queue.clone()),
            priority: Set(new_job.priority.0),
            status: Set(JobStatus::Pending.to_string()),
            payload: Set(serde_json::to_string(&new_job.payload)?),
            depends_on: Set(new_job.depends_on.clone()),
            attempts: Set(0),
            max_attempts: Set(new_job.max_attempts),
            error: Set(None),
            last_error: Set(None),
            result: Set(None),
            retry_after: Set(None),
            locked_by: Set(None),
            locked_at: Set(None),
            created_at: Set(now_ms()),
            started_at: Set(None),
            completed_at: Set(None),
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// Claim the next eligible job for a worker, or return `None` when the
    /// queue has nothing runnable (including when a rival worker wins the
    /// claim race).
    pub async fn get_next(&self, queue: &str, worker_id: &str) -> QueueResult<Option<job::Model>> {
        self.release_stale_leases().await?;

        let now = now_ms();
        let candidate = job::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                r#"
                SELECT * FROM jobs
                WHERE queue = ?
                  AND status = 'pending'
                  AND locked_by IS NULL
                  AND (retry_after IS NULL OR retry_after <= ?)
                  AND (depends_on IS NULL OR EXISTS (
                      SELECT 1 FROM jobs AS dep
                      WHERE dep.id = jobs.depends_on AND dep.status = 'completed'
                  ))
                ORDER BY priority DESC, created_at ASC, rowid ASC
                LIMIT 1
                "#,
                [queue.into(), now.into()],
            ))
            .one(&self.conn)
            .await?;

        let Some(candidate) = candidate else {
            return Ok(None);
        };

        // Compare-and-set claim; losing the race is not an error
        let claimed = self
            .conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                r#"
                UPDATE jobs
                SET status = 'processing',
                    locked_by = ?,
                    locked_at = ?,
                    started_at = ?,
                    attempts = attempts + 1
                WHERE id = ? AND status = 'pending' AND locked_by IS NULL
                "#,
                [worker_id.into(), now.into(), now.into(), candidate.id.clone().into()],
            ))
            .await?;

        if claimed.rows_affected() == 0 {
            debug!("lost claim race for {}", candidate.id);
            return Ok(None);
        }

        let claimed_job = job::Entity::find_by_id(&candidate.id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| QueueError::NotFound(candidate.id.clone()))?;
        Ok(Some(claimed_job))
    }

    /// Return leases held longer than the stale timeout to `pending`
    pub async fn release_stale_leases(&self) -> QueueResult<u64> {
        let cutoff = now_ms() - self.stale_timeout.as_millis() as i64;
        let released = self
            .conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                r#"
                UPDATE jobs
                SET status = 'pending', locked_by = NULL, locked_at = NULL
                WHERE status = 'processing' AND locked_at < ?
                "#,
                [cutoff.into()],
            ))
            .await?;
        if released.rows_affected() > 0 {
            warn!("released {} stale job leases", released.rows_affected());
        }
        Ok(released.rows_affected())
    }

    /// Mark a job done and record its result
    pub async fn complete(&self, id: &str, result: Option<JsonValue>) -> QueueResult<()> {
        let result_json = result.map(|r| serde_json::to_string(&r)).transpose()?;
        job::ActiveModel {
            id: Set(id.to_string()),
            status: Set(JobStatus::Completed.to_string()),
            result: Set(result_json),
            completed_at: Set(Some(now_ms())),
            locked_by: Set(None),
            locked_at: Set(None),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;
        Ok(())
    }

    /// Record a failure: schedule a retry with exponential backoff, or move
    /// the job to the dead-letter queue once its attempts are spent.
    pub async fn fail(&self, id: &str, error: &str) -> QueueResult<()> {
        let current = job::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        if current.attempts >= current.max_attempts {
            let txn = self.conn.begin().await?;
            dead_letter::ActiveModel {
                job_id: Set(current.id.clone()),
                queue: Set(current.queue.clone()),
                payload: Set(current.payload.clone()),
                error: Set(error.to_string()),
                attempts: Set(current.attempts),
                failed_at: Set(now_ms()),
                acknowledged: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            job::ActiveModel {
                id: Set(current.id.clone()),
                status: Set(JobStatus::Dead.to_string()),
                error: Set(Some(error.to_string())),
                last_error: Set(Some(error.to_string())),
                locked_by: Set(None),
                locked_at: Set(None),
                completed_at: Set(Some(now_ms())),
                ..Default::default()
            }
            .update(&txn)
            .await?;
            txn.commit().await?;

            info!("job {} is dead after {} attempts: {}", id, current.attempts, error);
        } else {
            let delay = backoff_ms(current.attempts);
            job::ActiveModel {
                id: Set(current.id.clone()),
                status: Set(JobStatus::Pending.to_string()),
                error: Set(None),
                last_error: Set(Some(error.to_string())),
                retry_after: Set(Some(now_ms() + delay)),
                locked_by: Set(None),
                locked_at: Set(None),
                ..Default::default()
            }
            .update(&self.conn)
            .await?;

            debug!(
                "job {} failed (attempt {}/{}), retrying in {}ms",
                id, current.attempts, current.max_attempts, delay
            );
        }
        Ok(())
    }

    pub async fn get_job(&self, id: &str) -> QueueResult<Option<job::Model>> {
        Ok(job::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Most recent pending/processing job on a queue with an identical
    /// payload. Used to chain per-location bag refreshes so only one runs
    /// at a time.
    pub async fn find_active(&self, queue: &str, payload: &JsonValue) -> QueueResult<Option<String>> {
        let payload_json = serde_json::to_string(payload)?;
        Ok(job::Entity::find()
            .filter(job::Column::Queue.eq(queue))
            .filter(job::Column::Payload.eq(payload_json))
            .filter(
                job::Column::Status.is_in([
                    JobStatus::Pending.to_string(),
                    JobStatus::Processing.to_string(),
                ]),
            )
            .order_by_desc(job::Column::CreatedAt)
            .one(&self.conn)
            .await?
            .map(|m| m.id))
    }

    pub async fn stats(&self, queue: &str) -> QueueResult<QueueStats> {
        let mut stats = QueueStats::default();
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Dead,
        ] {
            let count = job::Entity::find()
                .filter(job::Column::Queue.eq(queue))
                .filter(job::Column::Status.eq(status.to_string()))
                .count(&self.conn)
                .await?;
            match status {
                JobStatus::Pending => stats.pending = count,
                JobStatus::Processing => stats.processing = count,
                JobStatus::Completed => stats.completed = count,
                JobStatus::Dead => stats.dead = count,
                JobStatus::Failed => {}
            }
        }
        Ok(stats)
    }

    /// Dead-letter entries, unacknowledged first unless asked for all
    pub async fn list_dead(&self, include_acknowledged: bool) -> QueueResult<Vec<dead_letter::Model>> {
        let mut query = dead_letter::Entity::find();
        if !include_acknowledged {
            query = query.filter(dead_letter::Column::Acknowledged.eq(false));
        }
        Ok(query
            .order_by_asc(dead_letter::Column::FailedAt)
            .all(&self.conn)
            .await?)
    }

    /// Clear the operator-facing backlog flag; the row stays for audit
    pub async fn acknowledge_dead(&self, dlq_id: i32) -> QueueResult<()> {
        dead_letter::ActiveModel {
            id: Set(dlq_id),
            acknowledged: Set(true),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;
        Ok(())
    }

    /// Re-submit a dead job as a fresh one and acknowledge the dead entry
    pub async fn retry_dead(&self, dlq_id: i32) -> QueueResult<String> {
        let entry = dead_letter::Entity::find_by_id(dlq_id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| QueueError::NotFound(format!("dead-letter {dlq_id}")))?;

        let payload: JsonValue = serde_json::from_str(&entry.payload)?;
        let new_id = self.enqueue(NewJob::new(entry.queue.clone(), payload)).await?;
        self.acknowledge_dead(dlq_id).await?;
        info!("retried dead job {} as {}", entry.job_id, new_id);
        Ok(new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_doubles_to_a_minute() {
        assert_eq!(backoff_ms(1), 1_000);
        assert_eq!(backoff_ms(2), 2_000);
        assert_eq!(backoff_ms(3), 4_000);
        assert_eq!(backoff_ms(6), 32_000);
        assert_eq!(backoff_ms(7), 60_000);
        assert_eq!(backoff_ms(50), 60_000);
    }
}
