//! crates/scoping_core/src/services/message.rs
//!
//! Message CRUD plus the synchronous half of the answer-submission pipeline:
//! persist the batch, persist a placeholder, queue the recommendation request.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{log_failure, new_id, require_id};
use crate::completion_worker::{CompletionJob, CompletionQueue, FAILED_NOTICE};
use crate::domain::{Message, MessageStatus, Page};
use crate::ports::{MessageRepository, PortError, PortResult};

/// Text of the placeholder returned while a recommendation is being generated.
pub const PENDING_NOTICE: &str =
    "Thank you for your message. Please wait for the AI Engine to generate a response.";

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    completions: CompletionQueue,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepository>, completions: CompletionQueue) -> Self {
        Self {
            messages,
            completions,
        }
    }

    /// Stores one message under a freshly generated id.
    pub async fn post_message(&self, mut message: Message) -> PortResult<Message> {
        message.id = new_id();
        message.validate()?;

        self.messages
            .create_message(message)
            .await
            .map_err(log_failure("create message", "<new>"))
    }

    /// Stores a batch of answers for one user and returns a pending placeholder
    /// that a completion worker later overwrites with the recommendation.
    ///
    /// Answers that fail to store are logged and skipped. Only a failure to
    /// store the placeholder, or to queue its job, fails the call.
    pub async fn submit_answers(&self, batch: Vec<Message>) -> PortResult<Message> {
        let user_id = batch_owner(&batch)?;
        info!("Received {} answers from user {}.", batch.len(), user_id);

        let mut stored = Vec::with_capacity(batch.len());
        for message in batch {
            match self.post_message(message).await {
                Ok(message) => stored.push(message),
                Err(e) => warn!("Skipping an answer from user {}: {}", user_id, e),
            }
        }
        debug!("Stored {} answers for user {}.", stored.len(), user_id);

        let placeholder = self
            .post_message(Message {
                user_id: Some(user_id.clone()),
                message_text: Some(PENDING_NOTICE.to_string()),
                status: Some(MessageStatus::Pending),
                ..Default::default()
            })
            .await?;

        let job = CompletionJob {
            message_id: placeholder.id.clone(),
            user_id: user_id.clone(),
            prompt: build_prompt(&stored),
        };
        if let Err(e) = self.completions.enqueue(job).await {
            error!("Could not queue recommendation for message {}: {}", placeholder.id, e);
            self.mark_failed(&placeholder).await;
            return Err(e);
        }

        Ok(placeholder)
    }

    async fn mark_failed(&self, placeholder: &Message) {
        let failed = Message {
            id: placeholder.id.clone(),
            user_id: placeholder.user_id.clone(),
            message_text: Some(FAILED_NOTICE.to_string()),
            status: Some(MessageStatus::Failed),
            ..Default::default()
        };
        if let Err(e) = self.messages.update_message(failed).await {
            error!("Failed to mark message {} as failed: {}", placeholder.id, e);
        }
    }

    pub async fn get_message(&self, user_id: &str, message_id: &str) -> PortResult<Message> {
        self.messages
            .get_message(user_id, message_id)
            .await
            .map_err(log_failure("get message", message_id))
    }

    pub async fn list_messages(&self, user_id: &str, page: Page) -> PortResult<Vec<Message>> {
        self.messages
            .list_messages(user_id, page)
            .await
            .map_err(log_failure("list messages of user", user_id))
    }

    /// Merges the supplied fields into the stored message.
    pub async fn update_message(
        &self,
        user_id: &str,
        message_id: &str,
        mut message: Message,
    ) -> PortResult<Message> {
        require_id(message_id, "message")?;
        message.id = message_id.to_string();
        message.user_id = Some(user_id.to_string());
        message.validate()?;

        self.messages
            .update_message(message)
            .await
            .map_err(log_failure("update message", message_id))
    }

    pub async fn delete_message(&self, user_id: &str, message_id: &str) -> PortResult<()> {
        self.messages
            .delete_message(user_id, message_id)
            .await
            .map_err(log_failure("delete message", message_id))
    }
}

/// The single user every message of a non-empty batch belongs to.
fn batch_owner(batch: &[Message]) -> PortResult<String> {
    let first = batch
        .first()
        .ok_or_else(|| PortError::InvalidInput("answer batch is empty".to_string()))?;
    let owner = first
        .user_id
        .as_deref()
        .ok_or_else(|| PortError::InvalidInput("every answer requires a user_id".to_string()))?;

    if batch.iter().any(|m| m.user_id.as_deref() != Some(owner)) {
        return Err(PortError::InvalidInput(
            "all answers in a batch must belong to the same user".to_string(),
        ));
    }
    Ok(owner.to_string())
}

/// Renders the question/answer pairs of a batch as the completion prompt.
/// Messages lacking either text are left out.
pub fn build_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        match message.question_and_answer() {
            Some((question, answer)) => {
                let _ = write!(prompt, "Question: {question}\nAnswer: {answer}\n\n");
            }
            None => debug!("Message {} has no complete question and answer.", message.id),
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion_worker::WorkerConfig;
    use crate::domain::{Answer, Question};
    use crate::memory_store::InMemoryDocumentStore;
    use crate::repositories::DocumentMessageRepository;
    use crate::ports::CompletionService;
    use crate::test_support::{
        completion_fixture, wait_for_status, FlakyMessages, GatedCompletion, ScriptedCompletion,
    };
    use tokio::task::JoinHandle;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn answer(user_id: &str, question: &str, text: &str) -> Message {
        Message {
            id: format!("client-{question}"),
            user_id: Some(user_id.to_string()),
            answer: Some(Answer {
                technology_name: Some("AWS".to_string()),
                question: Some(Question {
                    category: Some("Experience".to_string()),
                    text: Some(question.to_string()),
                    options: None,
                }),
                answer: Some(text.to_string()),
            }),
            ..Default::default()
        }
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            workers: 2,
            queue_capacity: 8,
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            request_timeout: Duration::from_secs(1),
        }
    }

    fn service_with(
        messages: Arc<dyn MessageRepository>,
        completion: Arc<ScriptedCompletion>,
        shutdown: &CancellationToken,
    ) -> MessageService {
        let (queue, _workers) =
            CompletionQueue::start(fast_config(), messages.clone(), completion, shutdown.clone());
        MessageService::new(messages, queue)
    }

    fn start_with(
        config: WorkerConfig,
        messages: Arc<dyn MessageRepository>,
        completion: Arc<dyn CompletionService>,
        shutdown: &CancellationToken,
    ) -> (MessageService, Vec<JoinHandle<()>>) {
        let (queue, workers) = CompletionQueue::start(config, messages.clone(), completion, shutdown.clone());
        (MessageService::new(messages, queue), workers)
    }

    async fn stop(shutdown: &CancellationToken, workers: Vec<JoinHandle<()>>) {
        shutdown.cancel();
        for worker in workers {
            worker.await.unwrap();
        }
    }

    #[test]
    fn prompt_skips_incomplete_pairs() {
        let mut incomplete = answer("u1", "Team size?", "5");
        if let Some(a) = incomplete.answer.as_mut() {
            a.answer = None;
        }
        let prompt = build_prompt(&[
            answer("u1", "Which cloud?", "AWS"),
            incomplete,
            answer("u1", "Format?", "Online"),
        ]);
        assert_eq!(
            prompt,
            "Question: Which cloud?\nAnswer: AWS\n\nQuestion: Format?\nAnswer: Online\n\n"
        );
    }

    #[tokio::test]
    async fn batch_must_be_non_empty_and_single_owner() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let service = service_with(messages, Arc::new(ScriptedCompletion::succeeding()), &shutdown);

        assert!(matches!(
            service.submit_answers(Vec::new()).await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(matches!(
            service
                .submit_answers(vec![answer("u1", "a", "b"), answer("u2", "c", "d")])
                .await,
            Err(PortError::InvalidInput(_))
        ));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn submission_returns_placeholder_and_finalizes_with_completion() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(ScriptedCompletion::succeeding());
        let service = service_with(messages.clone(), completion.clone(), &shutdown);

        let batch = vec![answer("u1", "Which cloud?", "AWS"), answer("u1", "Format?", "Online")];
        let input_ids: Vec<_> = batch.iter().map(|m| m.id.clone()).collect();

        let placeholder = service.submit_answers(batch).await.unwrap();
        assert_eq!(placeholder.message_text.as_deref(), Some(PENDING_NOTICE));
        assert_eq!(placeholder.status, Some(MessageStatus::Pending));
        assert!(!input_ids.contains(&placeholder.id));

        let finalized = wait_for_status(messages.as_ref(), "u1", &placeholder.id).await;
        assert_eq!(finalized.status, Some(MessageStatus::Completed));
        let expected = serde_json::to_string(&completion_fixture()).unwrap();
        assert_eq!(finalized.message_text, Some(expected));
        assert_eq!(finalized.created_at, placeholder.created_at);

        assert_eq!(
            completion.prompts(),
            vec!["Question: Which cloud?\nAnswer: AWS\n\nQuestion: Format?\nAnswer: Online\n\n".to_string()]
        );
        let all = messages.list_messages("u1", Page::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn failed_answers_are_skipped_and_placeholder_still_created() {
        let shutdown = CancellationToken::new();
        let inner = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let messages = Arc::new(FlakyMessages::failing_on_answer(inner.clone(), "boom"));
        let service = service_with(messages, Arc::new(ScriptedCompletion::succeeding()), &shutdown);

        let batch = vec![
            answer("u1", "q1", "ok"),
            answer("u1", "q2", "boom"),
            answer("u1", "q3", "ok"),
            answer("u1", "q4", "boom"),
        ];
        let placeholder = service.submit_answers(batch).await.unwrap();

        let stored = inner.list_messages("u1", Page::default()).await.unwrap();
        let answers = stored.iter().filter(|m| m.answer.is_some()).count();
        assert_eq!(answers, 2);
        assert!(stored.iter().any(|m| m.id == placeholder.id));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn exhausted_retries_mark_placeholder_failed() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(ScriptedCompletion::failing());
        let service = service_with(messages.clone(), completion.clone(), &shutdown);

        let placeholder = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await
            .unwrap();

        let finalized = wait_for_status(messages.as_ref(), "u1", &placeholder.id).await;
        assert_eq!(finalized.status, Some(MessageStatus::Failed));
        assert_eq!(finalized.message_text.as_deref(), Some(FAILED_NOTICE));
        assert_eq!(completion.calls(), 3);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(ScriptedCompletion::failing_first(2));
        let service = service_with(messages.clone(), completion.clone(), &shutdown);

        let placeholder = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await
            .unwrap();

        let finalized = wait_for_status(messages.as_ref(), "u1", &placeholder.id).await;
        assert_eq!(finalized.status, Some(MessageStatus::Completed));
        assert_eq!(completion.calls(), 3);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn update_merges_into_owned_message() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let service = service_with(messages, Arc::new(ScriptedCompletion::succeeding()), &shutdown);

        let created = service.post_message(answer("u1", "Which cloud?", "AWS")).await.unwrap();
        let updated = service
            .update_message(
                "u1",
                &created.id,
                Message {
                    message_text: Some("edited".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.message_text.as_deref(), Some("edited"));
        assert_eq!(updated.answer, created.answer);

        service.delete_message("u1", &created.id).await.unwrap();
        service.delete_message("u1", &created.id).await.unwrap();
        shutdown.cancel();
    }

    #[tokio::test]
    async fn unresponsive_completion_times_out_and_marks_placeholder_failed() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(GatedCompletion::closed());
        let config = WorkerConfig {
            request_timeout: Duration::from_millis(20),
            ..fast_config()
        };
        let (service, workers) = start_with(config, messages.clone(), completion.clone(), &shutdown);

        let placeholder = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await
            .unwrap();

        let finalized = wait_for_status(messages.as_ref(), "u1", &placeholder.id).await;
        assert_eq!(finalized.status, Some(MessageStatus::Failed));
        assert_eq!(finalized.message_text.as_deref(), Some(FAILED_NOTICE));
        assert_eq!(completion.calls(), 3);
        stop(&shutdown, workers).await;
    }

    #[tokio::test]
    async fn shutdown_leaves_in_flight_and_queued_placeholders_pending() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(GatedCompletion::closed());
        let config = WorkerConfig {
            workers: 1,
            request_timeout: Duration::from_secs(60),
            ..fast_config()
        };
        let (service, workers) = start_with(config, messages.clone(), completion.clone(), &shutdown);

        let in_flight = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await
            .unwrap();
        completion.wait_for_calls(1).await;
        let queued = service
            .submit_answers(vec![answer("u1", "Format?", "Online")])
            .await
            .unwrap();

        stop(&shutdown, workers).await;

        for id in [&in_flight.id, &queued.id] {
            let stored = messages.get_message("u1", id).await.unwrap();
            assert_eq!(stored.status, Some(MessageStatus::Pending));
            assert_eq!(stored.message_text.as_deref(), Some(PENDING_NOTICE));
        }
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn submission_after_shutdown_fails_and_marks_placeholder_failed() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let (service, workers) = start_with(
            fast_config(),
            messages.clone(),
            Arc::new(ScriptedCompletion::succeeding()),
            &shutdown,
        );
        stop(&shutdown, workers).await;

        let result = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));

        let stored = messages.list_messages("u1", Page::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        let placeholder = stored
            .iter()
            .find(|m| m.answer.is_none())
            .expect("placeholder is stored");
        assert_eq!(placeholder.status, Some(MessageStatus::Failed));
        assert_eq!(placeholder.message_text.as_deref(), Some(FAILED_NOTICE));
    }

    #[tokio::test]
    async fn deleted_placeholder_is_not_recreated_by_the_worker() {
        let shutdown = CancellationToken::new();
        let messages = Arc::new(DocumentMessageRepository::new(Arc::new(InMemoryDocumentStore::new())));
        let completion = Arc::new(GatedCompletion::closed());
        let config = WorkerConfig {
            workers: 1,
            request_timeout: Duration::from_secs(60),
            ..fast_config()
        };
        let (service, workers) = start_with(config, messages.clone(), completion.clone(), &shutdown);

        let deleted = service
            .submit_answers(vec![answer("u1", "Which cloud?", "AWS")])
            .await
            .unwrap();
        completion.wait_for_calls(1).await;
        service.delete_message("u1", &deleted.id).await.unwrap();

        // A single worker finishes the first job before it starts the second.
        completion.open();
        let kept = service
            .submit_answers(vec![answer("u1", "Format?", "Online")])
            .await
            .unwrap();
        let finalized = wait_for_status(messages.as_ref(), "u1", &kept.id).await;
        assert_eq!(finalized.status, Some(MessageStatus::Completed));

        assert!(matches!(
            messages.get_message("u1", &deleted.id).await,
            Err(PortError::NotFound(_))
        ));
        stop(&shutdown, workers).await;
    }
}
