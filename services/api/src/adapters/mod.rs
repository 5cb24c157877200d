pub mod completion_llm;
pub mod court_portal;
pub mod db;
pub mod memory;

pub use completion_llm::{DisabledCompletion, OpenAiCompletionAdapter};
pub use court_portal::HttpCourtPortal;
pub use db::DbAdapter;
pub use memory::MemoryStore;
