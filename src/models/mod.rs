// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Block, Dislike, Like, Match, Message};
pub use requests::{BlockRequest, SendMessageRequest, SignalRequest};
pub use responses::{ErrorResponse, ExclusionsResponse, HealthResponse};
