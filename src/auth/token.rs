//! Token records returned by fetchers and the secret wrapper they carry.

pub mod record;
pub mod secret;
