//! passkey_ceremony_axum - HTTP surface for passkey ceremonies
//!
//! Mounts the four ceremony steps of a [`passkey_ceremony::Coordinator`] plus
//! a liveness probe on an axum [`axum::Router`].

mod error;
mod passkey;
mod router;

pub use error::{IntoResponseError, status_code};
pub use router::{passkey_ceremony_router, passkey_ceremony_router_no_trace};

pub use passkey_ceremony::{CeremonyConfig, Coordinator};
