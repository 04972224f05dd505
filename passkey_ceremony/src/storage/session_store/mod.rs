mod memory;
mod types;

pub use memory::InMemorySessionStore;
pub use types::SessionStore;
