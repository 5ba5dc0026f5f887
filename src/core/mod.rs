// Interaction rules
pub mod engine;
pub mod error;
pub mod pair;

pub use engine::InteractionEngine;
pub use error::{InteractionError, Signal};
pub use pair::UserPair;
