pub mod connection;
pub mod detail;
pub mod migration;
pub mod signature;

pub use connection::establish_connection;
pub use detail::{DetailStore, UpsertOutcome};
pub use signature::SignatureStore;
