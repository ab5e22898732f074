//! Auth-domain models: requested scopes, access tokens, and redacted secrets.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{record::*, secret::*};
