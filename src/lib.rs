// Library interface for the language server
// This allows the document store and its collaborators to be tested

pub mod analysis;
pub mod arena_pool;
pub mod config;
pub mod core;
pub mod impls;
pub mod message_handler;
pub mod protocol;
pub mod testing;
pub mod traits;
pub mod uri;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::core::{DocumentStore, Handle};
pub use crate::message_handler::MessageHandler;
pub use crate::protocol::LspConnection;
