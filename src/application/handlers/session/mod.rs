//! Session command handlers.

mod expire_idle_sessions;
mod start_chat_session;

pub use expire_idle_sessions::{ExpireIdleSessionsHandler, ExpireIdleSessionsResult, ExpirySettings};
pub use start_chat_session::{StartChatSessionCommand, StartChatSessionHandler};
