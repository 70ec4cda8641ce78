//! On-device notes and scheduled to-dos.
//!
//! This library keeps in-memory collections of notes and todos in sync with
//! a durable key-value backend. Mutations are visible immediately and are
//! persisted in the background as whole-collection overwrites.

mod backend;
mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod persister;
mod record;
mod storage;
mod store;
mod todo;
mod types;
mod workspace;

// Re-export key components
pub use backend::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use persister::*;
pub use record::*;
pub use storage::*;
pub use store::*;
pub use todo::*;
pub use types::*;
pub use workspace::*;
