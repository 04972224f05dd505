mod authentication;
mod ceremony;
mod errors;
mod reaper;
mod registration;

pub use ceremony::{AuthenticationOutcome, Coordinator, RegistrationOutcome};
pub use errors::CoordinationError;
pub use reaper::spawn_session_reaper;
pub use registration::RegistrationRequestOptions;
