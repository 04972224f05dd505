mod core;
mod none;
mod packed;
mod utils;

pub(crate) use core::{extract_aaguid, verify_attestation};
