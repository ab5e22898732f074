//! Application default credentials for Rust: locate ambient OAuth 2.0 credential files, wrap
//! them in a uniform token source, and decorate outgoing request metadata with bearer tokens.
//!
//! The entry point is [`resolver::CredentialResolver`]: it checks the
//! `GOOGLE_APPLICATION_CREDENTIALS` variable and the per-OS well-known file, hands the bytes
//! it finds to a [`fetcher::CredentialsFactory`], and returns a
//! [`credentials::Credentials`] facade that fetches tokens and injects
//! `Authorization: Bearer …` metadata.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod credentials;
pub mod env;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod resolver;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
