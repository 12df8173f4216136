use std::time::Duration;
use sqlx::{PgPool, types::Json};
use tracing::debug;
use shared::models::{VoteEvent, VOTE_EXCHANGE, VOTE_QUEUE};
use crate::queue::{Delivery, QueueError, VoteQueue};

fn db_error(e: sqlx::Error) -> QueueError {
    QueueError::Database(e.to_string())
}

/// Every claim bumps `attempts`, so a stale delivery no longer matches the row.
fn claim_token(delivery: &Delivery) -> i32 {
    i32::try_from(delivery.attempts).unwrap_or(i32::MAX)
}

/// Durable queue on top of the `compute_vote` schema.
///
/// Consumers claim rows with `FOR UPDATE SKIP LOCKED` and stamp
/// `locked_until`; a row whose claim has lapsed is claimable again.
#[derive(Clone)]
pub struct PgVoteQueue {
    pool: PgPool,
    visibility_timeout: Duration,
}

impl PgVoteQueue {
    pub fn new(pool: PgPool, visibility_timeout: Duration) -> Self {
        Self { pool, visibility_timeout }
    }
}

#[rocket::async_trait]
impl VoteQueue for PgVoteQueue {
    async fn publish(&self, event: &VoteEvent) -> Result<(), QueueError> {
        let tag: i64 = sqlx::query_scalar(
            "INSERT INTO compute_vote.messages (exchange, queue, payload)
             VALUES ($1, $2, $3)
             RETURNING id"
        )
        .bind(VOTE_EXCHANGE)
        .bind(VOTE_QUEUE)
        .bind(Json(event))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(tag, candidate_id = event.candidate_id, "vote event enqueued");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let row: Option<(i64, String, i32)> = sqlx::query_as(
            "UPDATE compute_vote.messages
             SET attempts = attempts + 1,
                 locked_until = NOW() + make_interval(secs => $2)
             WHERE id = (
                 SELECT id FROM compute_vote.messages
                 WHERE queue = $1 AND (locked_until IS NULL OR locked_until < NOW())
                 ORDER BY id
                 FOR UPDATE SKIP LOCKED
                 LIMIT 1
             )
             RETURNING id, payload::text, attempts"
        )
        .bind(VOTE_QUEUE)
        .bind(self.visibility_timeout.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(|(tag, payload, attempts)| Delivery {
            tag,
            body: payload.into_bytes(),
            attempts: attempts.max(0) as u32,
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let result = sqlx::query("DELETE FROM compute_vote.messages WHERE id = $1 AND attempts = $2")
            .bind(delivery.tag)
            .bind(claim_token(delivery))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownDelivery(delivery.tag));
        }
        Ok(())
    }

    async fn requeue(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let result = sqlx::query(
            "UPDATE compute_vote.messages SET locked_until = NULL WHERE id = $1 AND attempts = $2"
        )
        .bind(delivery.tag)
        .bind(claim_token(delivery))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownDelivery(delivery.tag));
        }
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let moved = sqlx::query(
            "INSERT INTO compute_vote.dead_letters
                 (id, exchange, queue, payload, attempts, reason, published_at)
             SELECT id, exchange, queue, payload, attempts, $2, published_at
             FROM compute_vote.messages WHERE id = $1 AND attempts = $3"
        )
        .bind(delivery.tag)
        .bind(reason)
        .bind(claim_token(delivery))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if moved.rows_affected() == 0 {
            return Err(QueueError::UnknownDelivery(delivery.tag));
        }

        sqlx::query("DELETE FROM compute_vote.messages WHERE id = $1")
            .bind(delivery.tag)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }
}
