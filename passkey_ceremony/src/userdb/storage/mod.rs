mod memory;
mod store_type;

pub use memory::InMemoryUserStore;
pub use store_type::UserStore;
