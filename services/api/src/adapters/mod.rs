pub mod completion_llm;
pub mod db;
pub mod identity;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use identity::IdentityToolkitVerifier;
