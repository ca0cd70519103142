//! crates/scoping_core/src/test_support.rs
//!
//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{ChatCompletion, Choice, CompletionMessage, Message, MessageStatus, Page, Usage};
use crate::ports::{CompletionService, MessageRepository, PortError, PortResult};

pub fn completion_fixture() -> ChatCompletion {
    ChatCompletion {
        id: "chatcmpl-1".to_string(),
        object: "chat.completion".to_string(),
        created: 1_700_000_000,
        model: "gpt-4".to_string(),
        choices: vec![Choice {
            index: 0,
            message: CompletionMessage {
                role: "assistant".to_string(),
                content: "Start with the associate track.".to_string(),
            },
            finish_reason: "stop".to_string(),
        }],
        usage: Usage {
            prompt_tokens: 42,
            completion_tokens: 7,
            total_tokens: 49,
        },
    }
}

/// A completion service that fails a fixed number of times before answering
/// with [`completion_fixture`].
pub struct ScriptedCompletion {
    failures: u32,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn succeeding() -> Self {
        Self::failing_first(0)
    }

    pub fn failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, _system_context: &str, prompt: &str) -> PortResult<ChatCompletion> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if call < self.failures {
            return Err(PortError::Unexpected("completion service unavailable".to_string()));
        }
        Ok(completion_fixture())
    }
}

/// A completion service whose calls block until [`GatedCompletion::open`] is
/// called. Left closed, it never answers.
pub struct GatedCompletion {
    gate: Semaphore,
    calls: AtomicU32,
}

impl GatedCompletion {
    pub fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Polls until at least `count` calls have started.
    pub async fn wait_for_calls(&self, count: u32) {
        for _ in 0..300 {
            if self.calls() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} completion calls, saw {}", self.calls());
    }
}

#[async_trait]
impl CompletionService for GatedCompletion {
    async fn complete(&self, _system_context: &str, _prompt: &str) -> PortResult<ChatCompletion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(completion_fixture())
    }
}

/// Wraps a message repository and refuses to create answers with a given text.
pub struct FlakyMessages {
    inner: Arc<dyn MessageRepository>,
    rejected_answer: String,
}

impl FlakyMessages {
    pub fn failing_on_answer(inner: Arc<dyn MessageRepository>, rejected_answer: &str) -> Self {
        Self {
            inner,
            rejected_answer: rejected_answer.to_string(),
        }
    }
}

#[async_trait]
impl MessageRepository for FlakyMessages {
    async fn get_message(&self, user_id: &str, message_id: &str) -> PortResult<Message> {
        self.inner.get_message(user_id, message_id).await
    }

    async fn list_messages(&self, user_id: &str, page: Page) -> PortResult<Vec<Message>> {
        self.inner.list_messages(user_id, page).await
    }

    async fn create_message(&self, message: Message) -> PortResult<Message> {
        let rejected = message
            .answer
            .as_ref()
            .and_then(|a| a.answer.as_deref())
            .is_some_and(|a| a == self.rejected_answer);
        if rejected {
            return Err(PortError::Unexpected("store write failed".to_string()));
        }
        self.inner.create_message(message).await
    }

    async fn update_message(&self, message: Message) -> PortResult<Message> {
        self.inner.update_message(message).await
    }

    async fn delete_message(&self, user_id: &str, message_id: &str) -> PortResult<()> {
        self.inner.delete_message(user_id, message_id).await
    }
}

/// Polls until the message leaves the pending state, giving up after a few seconds.
pub async fn wait_for_status(messages: &dyn MessageRepository, user_id: &str, message_id: &str) -> Message {
    for _ in 0..300 {
        if let Ok(message) = messages.get_message(user_id, message_id).await {
            if message.status != Some(MessageStatus::Pending) {
                return message;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("message {message_id} never left the pending state");
}
