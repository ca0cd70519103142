//! crates/scoping_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//!
//! Every optional field is an `Option<T>` that is omitted from JSON when absent,
//! so a field that was never provided stays distinguishable from one that was
//! explicitly set to an empty value, both over HTTP and in stored documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ports::{PortError, PortResult};

//=========================================================================================
// Users
//=========================================================================================

/// A person (or corporate account) taking the scoping questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default)]
    pub corporate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl User {
    /// Name and email address must both be present before a user is persisted.
    pub fn validate(&self) -> PortResult<()> {
        if self.name.is_none() || self.email_address.is_none() {
            return Err(PortError::InvalidInput(
                "user requires both name and email_address".to_string(),
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Question Sets
//=========================================================================================

/// How a multiple-choice question should be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Options {
    #[serde(default)]
    pub multi_answer: bool,
    #[serde(default)]
    pub possible_options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

/// A named collection of scoping questions for one technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionSet {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_name: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn validate(&self) -> PortResult<()> {
        if self.technology_name.is_none() {
            return Err(PortError::InvalidInput(
                "question set requires a technology_name".to_string(),
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Course Outlines
//=========================================================================================

/// A catalog record describing one training course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CourseOutline {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
}

impl CourseOutline {
    /// Fields a course outline listing may be filtered on.
    pub const FILTERABLE_FIELDS: [&'static str; 3] =
        ["technology_name", "course_code", "course_name"];

    pub fn validate(&self) -> PortResult<()> {
        if self.technology_name.is_none() {
            return Err(PortError::InvalidInput(
                "course outline requires a technology_name".to_string(),
            ));
        }
        Ok(())
    }
}

//=========================================================================================
// Messages
//=========================================================================================

/// A user's answer to one scoping question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Where a pipeline-generated message is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Completed,
    Failed,
}

/// A message in a user's conversation: either plain text (status updates, AI
/// recommendations) or an answer to a scoping question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// A message needs an owner and some content: either message text, or an
    /// answer that identifies what it answers.
    pub fn validate(&self) -> PortResult<()> {
        if self.user_id.is_none() {
            return Err(PortError::InvalidInput("message requires a user_id".to_string()));
        }
        if self.message_text.is_some() {
            return Ok(());
        }
        let answer_is_identified = self.answer.as_ref().is_some_and(|answer| {
            let question_is_identified = answer
                .question
                .as_ref()
                .is_some_and(|q| q.category.is_some() || q.text.is_some());
            question_is_identified || answer.technology_name.is_some()
        });
        if !answer_is_identified {
            return Err(PortError::InvalidInput(
                "message requires message_text or an answer to an identified question"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The question text and answer text, when both are present.
    pub fn question_and_answer(&self) -> Option<(&str, &str)> {
        let answer = self.answer.as_ref()?;
        let question_text = answer.question.as_ref()?.text.as_deref()?;
        let answer_text = answer.answer.as_deref()?;
        Some((question_text, answer_text))
    }
}

//=========================================================================================
// Chat Completions (external service response)
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Choice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompletionMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

//=========================================================================================
// Pagination
//=========================================================================================

/// A 1-based page request. Out-of-range values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub const DEFAULT_NUMBER: u32 = 1;
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(number: i64, size: i64) -> Self {
        let number = u32::try_from(number)
            .ok()
            .filter(|n| *n >= 1)
            .unwrap_or(Self::DEFAULT_NUMBER);
        let size = u32::try_from(size)
            .ok()
            .filter(|s| *s >= 1)
            .unwrap_or(Self::DEFAULT_SIZE);
        Self { number, size }
    }

    /// Parses raw query-string values, falling back silently on anything invalid.
    pub fn from_query(number: Option<&str>, size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0);
        Self::new(parse(number), parse(size))
    }

    /// Number of records before this page, saturating at `i64::MAX` so it always
    /// fits a SQL `OFFSET`.
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.number.saturating_sub(1)).saturating_mul(u64::from(self.size));
        usize::try_from(skipped.min(i64::MAX as u64)).unwrap_or(usize::MAX)
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: Self::DEFAULT_NUMBER,
            size: Self::DEFAULT_SIZE,
        }
    }
}

//=========================================================================================
// Timestamp encoding
//=========================================================================================

/// Fixed-precision RFC 3339 encoding, so stored timestamps sort lexically in
/// chronological order.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// The current time at the precision timestamps are stored with.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn answer_message(question: Option<&str>, answer: Option<&str>) -> Message {
        Message {
            user_id: Some("u-1".to_string()),
            answer: Some(Answer {
                technology_name: None,
                question: Some(Question {
                    category: Some("Cloud".to_string()),
                    text: question.map(str::to_string),
                    options: None,
                }),
                answer: answer.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn user_requires_name_and_email() {
        let mut user = User {
            name: Some("Ann".to_string()),
            ..Default::default()
        };
        assert!(matches!(user.validate(), Err(PortError::InvalidInput(_))));

        user.email_address = Some("a@x.com".to_string());
        assert!(user.validate().is_ok());
    }

    #[test]
    fn absent_and_empty_fields_survive_json() {
        let user: User = serde_json::from_value(json!({
            "name": "Ann",
            "email_address": "a@x.com",
            "company": ""
        }))
        .unwrap();

        assert_eq!(user.company.as_deref(), Some(""));
        assert!(!user.corporate);

        let encoded = serde_json::to_value(&user).unwrap();
        assert_eq!(
            encoded,
            json!({
                "id": "",
                "name": "Ann",
                "email_address": "a@x.com",
                "corporate": false,
                "company": ""
            })
        );
    }

    #[test]
    fn message_validation_accepts_text_or_identified_answer() {
        let text = Message {
            user_id: Some("u-1".to_string()),
            message_text: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(text.validate().is_ok());
        assert!(answer_message(Some("Which cloud?"), Some("AWS")).validate().is_ok());

        let ownerless = Message {
            message_text: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(ownerless.validate().is_err());

        let empty_answer = Message {
            user_id: Some("u-1".to_string()),
            answer: Some(Answer::default()),
            ..Default::default()
        };
        assert!(empty_answer.validate().is_err());
    }

    #[test]
    fn question_and_answer_requires_both_texts() {
        assert_eq!(
            answer_message(Some("Which cloud?"), Some("AWS")).question_and_answer(),
            Some(("Which cloud?", "AWS"))
        );
        assert_eq!(answer_message(None, Some("AWS")).question_and_answer(), None);
        assert_eq!(answer_message(Some("Which cloud?"), None).question_and_answer(), None);
    }

    #[test]
    fn timestamps_use_fixed_precision() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let message = Message {
            created_at: Some(at),
            ..Default::default()
        };

        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(encoded["created_at"], json!("2024-03-01T10:00:00.000000Z"));

        let decoded: Message = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.created_at, Some(at));
        assert_eq!(decoded.updated_at, None);
    }

    #[test]
    fn page_falls_back_to_defaults() {
        assert_eq!(Page::from_query(None, None), Page::default());
        assert_eq!(Page::from_query(Some("0"), Some("-3")), Page::default());
        assert_eq!(Page::from_query(Some("abc"), Some("2")), Page { number: 1, size: 2 });

        let page = Page::from_query(Some("3"), Some("5"));
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 5);
    }

    #[test]
    fn huge_page_offset_saturates_within_sql_range() {
        let page = Page::from_query(Some("4294967295"), Some("4294967295"));
        assert_eq!(page, Page { number: u32::MAX, size: u32::MAX });

        let offset = page.offset();
        assert!(i64::try_from(offset).is_ok());
        assert_eq!(offset as u64, i64::MAX as u64);
        assert_eq!(Page { number: 65_536, size: 65_536 }.offset(), 65_535 * 65_536);

        let query = crate::ports::ListQuery::ordered_by("created_at", page);
        assert_eq!(query.offset, offset);
    }
}
