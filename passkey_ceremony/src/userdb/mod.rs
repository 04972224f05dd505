mod storage;
mod types;

pub use storage::{InMemoryUserStore, UserStore};
pub use types::{RegisteredCredential, User};
