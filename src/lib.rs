//! Lume Interactions - likes, matches, messaging and blocking for Lume dating app
//!
//! The [`InteractionEngine`] records one-directional likes and dislikes,
//! turns reciprocal likes into matches, gates messaging to matched pairs and
//! lets a block erase every prior interaction between two users. Persistence
//! is injected through the [`RelationshipStore`] trait.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{InteractionEngine, InteractionError, Signal, UserPair};
pub use models::{Block, Dislike, Like, Match, Message};
pub use services::{InMemoryStore, PostgresStore, RelationshipStore, StoreError};
