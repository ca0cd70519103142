//! crates/scoping_core/src/completion_worker.rs
//!
//! The background half of the answer-submission pipeline: a bounded job queue
//! drained by a fixed pool of workers. Each job asks the completion service for a
//! recommendation and overwrites the job's placeholder message with the result,
//! or with a failure notice once every retry has failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::{ChatCompletion, Message, MessageStatus};
use crate::ports::{CompletionService, MessageRepository, PortError, PortResult};

/// The persona and course catalogue the completion service answers under.
pub const RECOMMENDATION_CONTEXT: &str = r#"You are a training consultant helping an organisation choose the right technical training.

You will receive a list of scoping questions and the answers a customer gave to them. Use the answers to understand the customer's current skills, goals, team size and preferred delivery format, then recommend a learning plan.

Training formats you can offer:

    Instructor-led classroom: 1 to 5 day courses delivered at a training centre, best for teams that want hands-on labs and direct access to an instructor.
    Virtual instructor-led: the same courses delivered live online, best for distributed teams.
    Private onsite delivery: a course run exclusively for one organisation at their premises, available for groups of 8 or more, with optional customisation of the outline.
    Self-paced learning: on-demand videos and labs with 12 months of access, best for individuals fitting study around work.
    Certification bootcamp: an intensive course followed by an exam voucher, best for learners targeting a specific vendor certification.

Your recommendation must:
    1. Name the technology track and the level (foundational, associate, professional or specialist) that fits the answers.
    2. Recommend a training format from the list above and explain briefly why it fits.
    3. Outline a sequence of 2 to 4 courses or milestones, from where the customer is today to their stated goal.
    4. Mention any prerequisite knowledge the customer appears to be missing.

Keep the recommendation concise and practical. Do not ask the customer for any additional feedback or clarification."#;

/// Written to a placeholder when no recommendation could be produced.
pub const FAILED_NOTICE: &str =
    "Sorry, the AI Engine could not generate a response. Please submit your answers again.";

/// One placeholder message waiting for its recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionJob {
    pub message_id: String,
    pub user_id: String,
    pub prompt: String,
}

/// Sizing and retry policy for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// Maximum number of attempts per call, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on a single call to an external service.
    pub request_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Exponential backoff before retrying after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Handle for submitting jobs to the worker pool. Cheap to clone.
#[derive(Clone)]
pub struct CompletionQueue {
    sender: mpsc::Sender<CompletionJob>,
}

impl CompletionQueue {
    /// Spawns the worker pool and returns the queue feeding it, plus the worker
    /// handles. Workers stop when `shutdown` is cancelled, abandoning whatever
    /// they were doing.
    pub fn start(
        config: WorkerConfig,
        messages: Arc<dyn MessageRepository>,
        completion: Arc<dyn CompletionService>,
        shutdown: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let worker_count = config.workers.max(1);
        let worker = Arc::new(Worker {
            config,
            messages,
            completion,
        });

        let handles = (0..worker_count)
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    worker.clone(),
                    receiver.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!("Started {} completion workers.", worker_count);
        (Self { sender }, handles)
    }

    /// Queues a job, waiting for capacity when the queue is full.
    pub async fn enqueue(&self, job: CompletionJob) -> PortResult<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| PortError::Unexpected("completion queue is closed".to_string()))
    }
}

async fn run_worker(
    index: usize,
    worker: Arc<Worker>,
    receiver: Arc<Mutex<mpsc::Receiver<CompletionJob>>>,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => None,
            job = async { receiver.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };

        let message_id = job.message_id.clone();
        tokio::select! {
            _ = shutdown.cancelled() => {
                warn!("Shutdown during completion for message {}; it stays pending.", message_id);
                break;
            }
            _ = worker.process(job) => {}
        }
    }
    debug!("Completion worker {} stopped.", index);
}

struct Worker {
    config: WorkerConfig,
    messages: Arc<dyn MessageRepository>,
    completion: Arc<dyn CompletionService>,
}

impl Worker {
    async fn process(&self, job: CompletionJob) {
        info!("Requesting recommendation for message {}.", job.message_id);

        let completion = self
            .with_retry("completion request", || {
                self.completion.complete(RECOMMENDATION_CONTEXT, &job.prompt)
            })
            .await;

        let finalized = match completion.and_then(|c| Self::serialize(&c)) {
            Ok(text) => Self::finalized(&job, text, MessageStatus::Completed),
            Err(e) => {
                error!(
                    "No recommendation for message {} of user {}: {}",
                    job.message_id, job.user_id, e
                );
                Self::finalized(&job, FAILED_NOTICE.to_string(), MessageStatus::Failed)
            }
        };
        let status = finalized.status;

        // The update merges, so a placeholder deleted meanwhile would come back.
        match self.messages.get_message(&job.user_id, &job.message_id).await {
            Err(PortError::NotFound(_)) => {
                info!("Message {} was deleted before it was finalized.", job.message_id);
                return;
            }
            Err(e) => warn!("Could not re-read message {}: {}", job.message_id, e),
            Ok(_) => {}
        }

        match self
            .with_retry("message update", || self.messages.update_message(finalized.clone()))
            .await
        {
            Ok(_) => info!("Message {} finalized as {:?}.", job.message_id, status),
            Err(e) => error!(
                "Failed to finalize message {} of user {}: {}",
                job.message_id, job.user_id, e
            ),
        }
    }

    fn serialize(completion: &ChatCompletion) -> PortResult<String> {
        serde_json::to_string(completion).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn finalized(job: &CompletionJob, text: String, status: MessageStatus) -> Message {
        Message {
            id: job.message_id.clone(),
            user_id: Some(job.user_id.clone()),
            message_text: Some(text),
            status: Some(status),
            ..Default::default()
        }
    }

    /// Runs `operation` up to `max_attempts` times, bounding each attempt by the
    /// request timeout and backing off between attempts.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut operation: F) -> PortResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.config.request_timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(PortError::Unexpected(format!(
                    "{what} timed out after {:?}",
                    self.config.request_timeout
                ))),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what, attempt, max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backoff_doubles_and_is_capped() {
        let config = WorkerConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            ..Default::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(350));
        assert_eq!(config.backoff(40), Duration::from_millis(350));
    }
}
