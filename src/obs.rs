//! Optional observability for credential resolution and token fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `oauth2_adc.credentials` with the `op` and `stage`
//!   fields, plus debug events naming the checked paths (never their contents).
//! - Enable `metrics` to increment the `oauth2_adc_operation_total` counter for every
//!   attempt/success/not-configured/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialOp {
	/// Resolution through the credentials environment variable.
	ResolveEnvironment,
	/// Resolution through the per-OS well-known file.
	ResolveWellKnown,
	/// Chained resolution (environment, then well-known file).
	ResolveApplicationDefault,
	/// Token fetch delegated to the wrapped fetcher.
	FetchToken,
}
impl CredentialOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialOp::ResolveEnvironment => "resolve_environment",
			CredentialOp::ResolveWellKnown => "resolve_well_known",
			CredentialOp::ResolveApplicationDefault => "resolve_application_default",
			CredentialOp::FetchToken => "fetch_token",
		}
	}
}
impl Display for CredentialOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Credentials were found or a token was fetched.
	Success,
	/// The strategy's precondition was absent; callers move on to the next one.
	NotConfigured,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::NotConfigured => "not_configured",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
