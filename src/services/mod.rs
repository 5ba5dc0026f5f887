// Service exports
pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use store::{PairTransaction, PurgeSummary, RelationshipStore, StoreError};
