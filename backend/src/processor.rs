use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::timeout};
use tracing::{error, info, warn};
use shared::models::*;
use crate::{
    config::AppConfig,
    queue::{Delivery, QueueError, VoteQueue},
    store::{CandidateStore, StoreError, VoteStore},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("Malformed vote event: {0}")]
    Malformed(String),
    #[error("Candidate {0} not found")]
    NotFound(CandidateId),
    #[error("Vote store unavailable: {0}")]
    Store(StoreError),
    #[error("Processing timed out after {0:?}")]
    TimedOut(Duration),
}

impl PersistError {
    /// Whether another delivery could succeed.
    fn is_transient(&self) -> bool {
        matches!(self, PersistError::Store(_) | PersistError::TimedOut(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Idle,
    Persisted(Vote),
    Requeued { reason: String },
    DeadLettered { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub processing_timeout: Duration,
    pub max_delivery_attempts: u32,
    pub poll_interval: Duration,
}

impl From<&AppConfig> for WorkerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            processing_timeout: config.processing_timeout,
            max_delivery_attempts: config.max_delivery_attempts,
            poll_interval: config.poll_interval,
        }
    }
}

/// Consumes vote events and writes one vote record per successfully handled
/// delivery. Redelivered events are not deduplicated.
pub struct VoteProcessor {
    candidates: Arc<dyn CandidateStore>,
    votes: Arc<dyn VoteStore>,
    queue: Arc<dyn VoteQueue>,
    settings: WorkerSettings,
}

impl VoteProcessor {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        votes: Arc<dyn VoteStore>,
        queue: Arc<dyn VoteQueue>,
        settings: WorkerSettings,
    ) -> Self {
        Self { candidates, votes, queue, settings }
    }

    /// Re-checks the candidate and writes the vote.
    pub async fn persist_event(&self, event: &VoteEvent) -> Result<Vote, PersistError> {
        self.candidates
            .find_by_id(event.candidate_id)
            .await
            .map_err(PersistError::Store)?
            .ok_or(PersistError::NotFound(event.candidate_id))?;

        self.votes
            .save(&NewVote::from(event))
            .await
            .map_err(|e| match e {
                StoreError::UnknownCandidate(id) => PersistError::NotFound(id),
                other => PersistError::Store(other),
            })
    }

    async fn handle(&self, delivery: &Delivery) -> Result<Vote, PersistError> {
        let event = delivery.decode().map_err(|e| PersistError::Malformed(e.to_string()))?;
        self.persist_event(&event).await
    }

    /// Takes at most one message off the queue and settles it.
    pub async fn process_next(&self) -> Result<ProcessOutcome, QueueError> {
        let Some(delivery) = self.queue.receive().await? else {
            return Ok(ProcessOutcome::Idle);
        };

        let limit = self.settings.processing_timeout;
        let result = timeout(limit, self.handle(&delivery))
            .await
            .unwrap_or(Err(PersistError::TimedOut(limit)));

        match result {
            Ok(vote) => {
                if let Err(e) = self.queue.ack(&delivery).await {
                    warn!(tag = delivery.tag, error = %e, "ack failed, vote may be counted again on redelivery");
                }
                info!(vote_id = vote.id, candidate_id = vote.candidate_id, "vote persisted");
                Ok(ProcessOutcome::Persisted(vote))
            }
            Err(e) if e.is_transient() && delivery.attempts < self.settings.max_delivery_attempts => {
                warn!(tag = delivery.tag, attempts = delivery.attempts, error = %e, "requeueing vote event");
                self.queue.requeue(&delivery).await?;
                Ok(ProcessOutcome::Requeued { reason: e.to_string() })
            }
            Err(e) => {
                let reason = e.to_string();
                if e.is_transient() {
                    error!(tag = delivery.tag, attempts = delivery.attempts, error = %e, "giving up on vote event");
                } else {
                    warn!(tag = delivery.tag, error = %e, "rejecting vote event");
                }
                self.queue.dead_letter(&delivery, &reason).await?;
                Ok(ProcessOutcome::DeadLettered { reason })
            }
        }
    }

    /// Processes messages until none are ready.
    pub async fn drain(&self) -> Result<Vec<ProcessOutcome>, QueueError> {
        let mut outcomes = Vec::new();
        loop {
            match self.process_next().await? {
                ProcessOutcome::Idle => return Ok(outcomes),
                outcome => outcomes.push(outcome),
            }
        }
    }

    /// Polls the queue until `shutdown` turns true or its sender is dropped.
    /// A message already claimed is settled before returning.
    pub async fn run(&self, worker: usize, mut shutdown: watch::Receiver<bool>) {
        info!(worker, "vote processor started");

        while !*shutdown.borrow() {
            let idle = match self.process_next().await {
                Ok(ProcessOutcome::Idle) => true,
                Ok(_) => false,
                Err(e) => {
                    error!(worker, error = %e, "vote queue error");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!(worker, "vote processor stopped");
    }
}

pub fn spawn_workers(
    processor: Arc<VoteProcessor>,
    count: usize,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            let processor = Arc::clone(&processor);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { processor.run(worker, shutdown).await })
        })
        .collect()
}
