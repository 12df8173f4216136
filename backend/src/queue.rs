use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use shared::models::VoteEvent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Queue lock poisoned")]
    LockFailed,
    #[error("Failed to encode vote event: {0}")]
    Serialize(String),
    #[error("Queue database error: {0}")]
    Database(String),
    #[error("Unknown delivery {0}")]
    UnknownDelivery(i64),
}

/// A claimed message. `attempts` counts this delivery and identifies the
/// claim: settling a delivery whose claim was superseded fails with
/// [`QueueError::UnknownDelivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: i64,
    pub body: Vec<u8>,
    pub attempts: u32,
}

impl Delivery {
    pub fn decode(&self) -> Result<VoteEvent, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// At-least-once channel between vote intake and the persistence workers.
///
/// A received message stays claimed by its consumer until it is acked,
/// requeued or dead-lettered. A claim that is never settled expires after
/// the queue's visibility timeout and the message is delivered again.
#[rocket::async_trait]
pub trait VoteQueue: Send + Sync {
    async fn publish(&self, event: &VoteEvent) -> Result<(), QueueError>;

    /// Claims the oldest ready message, or `None` if nothing is ready.
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    async fn requeue(&self, delivery: &Delivery) -> Result<(), QueueError>;

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError>;
}

pub(crate) fn encode(event: &VoteEvent) -> Result<Vec<u8>, QueueError> {
    serde_json::to_vec(event).map_err(|e| QueueError::Serialize(e.to_string()))
}

#[derive(Debug, Clone)]
struct Message {
    tag: i64,
    body: Vec<u8>,
    attempts: u32,
}

#[derive(Debug)]
struct Claim {
    message: Message,
    visible_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub tag: i64,
    pub body: Vec<u8>,
    pub attempts: u32,
    pub reason: String,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<Message>,
    claimed: HashMap<i64, Claim>,
    dead_letters: Vec<DeadLetter>,
    next_tag: i64,
}

impl QueueState {
    fn reclaim_expired(&mut self, now: Instant) {
        let mut expired: Vec<i64> = self.claimed
            .iter()
            .filter(|(_, claim)| claim.visible_at <= now)
            .map(|(tag, _)| *tag)
            .collect();
        expired.sort_unstable();

        for tag in expired.into_iter().rev() {
            if let Some(claim) = self.claimed.remove(&tag) {
                debug!(tag, "claim expired, message is ready again");
                self.ready.push_front(claim.message);
            }
        }
    }

    /// Removes the message if `delivery` is still the latest claim on it.
    /// A message whose claim lapsed but was not yet handed out again still
    /// belongs to that delivery.
    fn take(&mut self, delivery: &Delivery) -> Option<Message> {
        if let Some(claim) = self.claimed.get(&delivery.tag) {
            if claim.message.attempts != delivery.attempts {
                return None;
            }
            return self.claimed.remove(&delivery.tag).map(|claim| claim.message);
        }
        let index = self.ready
            .iter()
            .position(|m| m.tag == delivery.tag && m.attempts == delivery.attempts)?;
        self.ready.remove(index)
    }
}

/// In-process queue with the same claim/redelivery rules as the durable one.
/// Messages do not survive a restart.
#[derive(Debug)]
pub struct MemoryVoteQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl MemoryVoteQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }

    /// Enqueues an arbitrary body, bypassing event encoding.
    pub fn publish_raw(&self, body: Vec<u8>) -> Result<i64, QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        state.next_tag += 1;
        let tag = state.next_tag;
        state.ready.push_back(Message { tag, body, attempts: 0 });
        Ok(tag)
    }

    pub fn ready_len(&self) -> Result<usize, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        Ok(state.ready.len())
    }

    pub fn claimed_len(&self) -> Result<usize, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        Ok(state.claimed.len())
    }

    pub fn dead_letters(&self) -> Result<Vec<DeadLetter>, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        Ok(state.dead_letters.clone())
    }
}

#[rocket::async_trait]
impl VoteQueue for MemoryVoteQueue {
    async fn publish(&self, event: &VoteEvent) -> Result<(), QueueError> {
        let tag = self.publish_raw(encode(event)?)?;
        debug!(tag, candidate_id = event.candidate_id, "vote event enqueued");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        let now = Instant::now();
        state.reclaim_expired(now);

        let Some(mut message) = state.ready.pop_front() else { return Ok(None) };
        message.attempts += 1;
        let delivery = Delivery {
            tag: message.tag,
            body: message.body.clone(),
            attempts: message.attempts,
        };
        state.claimed.insert(message.tag, Claim {
            message,
            visible_at: now + self.visibility_timeout,
        });
        Ok(Some(delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        state.take(delivery)
            .map(|_| ())
            .ok_or(QueueError::UnknownDelivery(delivery.tag))
    }

    async fn requeue(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        let current = state.claimed
            .get(&delivery.tag)
            .is_some_and(|claim| claim.message.attempts == delivery.attempts);
        if !current {
            return Err(QueueError::UnknownDelivery(delivery.tag));
        }
        if let Some(claim) = state.claimed.remove(&delivery.tag) {
            state.ready.push_back(claim.message);
        }
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::LockFailed)?;
        let message = state.take(delivery)
            .ok_or(QueueError::UnknownDelivery(delivery.tag))?;
        state.dead_letters.push(DeadLetter {
            tag: message.tag,
            body: message.body,
            attempts: message.attempts,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
