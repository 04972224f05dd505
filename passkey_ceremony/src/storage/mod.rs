mod errors;
mod session_store;
mod types;

pub use errors::StorageError;
pub use session_store::{InMemorySessionStore, SessionStore};
pub use types::{CeremonyKind, CeremonySession, CorrelationKey};
