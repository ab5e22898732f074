//! Crate-level error types shared by the resolver, factories, and token fetchers.

// std
use std::io::Error as IoError;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (credential files, scopes, endpoints).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Requested scopes exceed what the credential may be granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint rejected the grant (e.g., a revoked refresh token).
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the client credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
}

/// Configuration failures raised while locating or interpreting credentials.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The environment variable names a credentials file that cannot be read.
	#[error("{env_var} points to `{path}`, which cannot be read: {source}.")]
	CredentialsFile {
		/// Environment variable holding the offending path.
		env_var: String,
		/// Path read from the variable.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: IoError,
	},
	/// The well-known credentials file exists but cannot be read.
	#[error("Well-known credentials file `{path}` cannot be read: {source}.")]
	WellKnownFile {
		/// Computed well-known path.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: IoError,
	},
	/// Neither resolution strategy found a credentials file.
	#[error(
		"Could not locate application default credentials; set {env_var} or create `{well_known}`."
	)]
	CredentialsNotFound {
		/// Environment variable consulted first.
		env_var: String,
		/// Well-known path consulted second (empty when its root variable is unset).
		well_known: String,
	},
	/// Credential bytes are not a supported JSON document.
	#[error("Credentials file is not valid JSON.")]
	InvalidCredentialsJson {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Credential file describes a type this factory cannot turn into a fetcher.
	#[error("Credential type `{kind}` is not supported by this factory.")]
	UnsupportedCredentialType {
		/// The `type` field of the credential file.
		kind: String,
	},
	/// Token endpoint URI cannot be used.
	#[error("Token endpoint URI is invalid.")]
	InvalidTokenUri {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Requested or returned scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] IoError),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::io::ErrorKind;
	// self
	use super::*;

	#[test]
	fn credentials_file_error_names_variable_and_cause() {
		let err = ConfigError::CredentialsFile {
			env_var: "GOOGLE_APPLICATION_CREDENTIALS".into(),
			path: PathBuf::from("/nowhere/key.json"),
			source: IoError::new(ErrorKind::NotFound, "No such file or directory"),
		};
		let message = err.to_string();

		assert!(message.contains("GOOGLE_APPLICATION_CREDENTIALS"));
		assert!(message.contains("/nowhere/key.json"));
		assert!(message.contains("No such file or directory"));
		assert!(StdError::source(&err).is_some(), "The I/O cause should stay reachable.");
	}

	#[test]
	fn config_error_converts_transparently() {
		let err: Error =
			ConfigError::UnsupportedCredentialType { kind: "service_account".into() }.into();

		assert!(matches!(err, Error::Config(ConfigError::UnsupportedCredentialType { .. })));
		assert_eq!(
			err.to_string(),
			"Credential type `service_account` is not supported by this factory."
		);
	}

	#[test]
	fn network_errors_keep_their_source() {
		let cause = IoError::new(ErrorKind::ConnectionReset, "reset by peer");
		let err: Error = TransportError::network(cause).into();

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
		assert_eq!(
			StdError::source(&err).map(ToString::to_string).as_deref(),
			Some("reset by peer")
		);
	}
}
