//! Parley application crate.
//!
//! Hosts the listen/process/speak control loop ([`listen_loop`]), the
//! [`assistant`] composition root, and the peripheral glue: configuration
//! persistence, conversation history, and the example handler.

pub mod assistant;
pub mod config;
pub mod handler;
pub mod history;
pub mod listen_loop;

pub use assistant::{VoiceAssistant, VoiceAssistantBuilder};
pub use config::AppConfig;
pub use handler::{Handler, SmallTalkHandler};
pub use history::{ConversationHistory, HistoryEntry, RecordingHandler, Role};
pub use listen_loop::{ListenLoop, ListenLoopConfig};
