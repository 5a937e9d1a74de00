mod key;
mod store;

pub use key::{SessionKey, TEMP_SESSION};
pub use store::{ChatSession, ChatSessionStore, DeleteReport, SessionKeys};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
