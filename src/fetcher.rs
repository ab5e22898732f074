//! Factories that turn credential bytes into [`TokenFetcher`]s.
//!
//! The resolver only locates bytes; a [`CredentialsFactory`] decides what they mean. The
//! default [`JsonCredentialsFactory`] reads the `type` field of the JSON document and builds an
//! [`AuthorizedUserFetcher`] for `authorized_user` files (the kind `gcloud auth
//! application-default login` writes). Other types are rejected with
//! [`ConfigError::UnsupportedCredentialType`]; install a custom factory to support them.

pub mod authorized_user;

pub use authorized_user::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	credentials::TokenFetcher,
	error::ConfigError,
	http::TransportClient,
	oauth::DEFAULT_TOKEN_URI,
	resolver::CredentialSource,
};

/// Turns a located credential source plus the requested scope into a token fetcher.
///
/// The source is moved in and dropped once the fetcher is built. Failures are returned to the
/// resolver's caller unchanged.
pub trait CredentialsFactory<C>
where
	Self: Send + Sync,
	C: TransportClient,
{
	/// Builds a fetcher for `source`, restricted to `scope`.
	fn make_credentials(
		&self,
		scope: &ScopeSet,
		source: CredentialSource,
	) -> Result<Box<dyn TokenFetcher<C>>>;
}

/// Settings shared by the fetchers a [`JsonCredentialsFactory`] builds.
#[derive(Clone, Debug, Default)]
pub struct FactoryConfig {
	/// Token endpoint used when the credential file does not name one.
	/// `None` selects [`DEFAULT_TOKEN_URI`].
	pub token_uri: Option<Url>,
}
impl FactoryConfig {
	/// Overrides the default token endpoint.
	pub fn with_token_uri(mut self, token_uri: Url) -> Self {
		self.token_uri = Some(token_uri);

		self
	}

	/// Returns the configured token endpoint, falling back to [`DEFAULT_TOKEN_URI`].
	pub fn token_uri(&self) -> Result<Url> {
		match &self.token_uri {
			Some(uri) => Ok(uri.clone()),
			None => Url::parse(DEFAULT_TOKEN_URI)
				.map_err(|source| ConfigError::InvalidTokenUri { source }.into()),
		}
	}
}

/// Default factory understanding JSON credential files.
pub struct JsonCredentialsFactory<C>
where
	C: TransportClient,
{
	http_client: Arc<C>,
	config: FactoryConfig,
}
impl<C> JsonCredentialsFactory<C>
where
	C: TransportClient,
{
	/// Creates a factory whose fetchers default to `http_client`.
	pub fn new(http_client: C) -> Self {
		Self::from_shared(Arc::new(http_client))
	}

	/// Creates a factory sharing an existing transport.
	pub fn from_shared(http_client: Arc<C>) -> Self {
		Self { http_client, config: FactoryConfig::default() }
	}

	/// Replaces the factory configuration.
	pub fn with_config(mut self, config: FactoryConfig) -> Self {
		self.config = config;

		self
	}
}
impl<C> CredentialsFactory<C> for JsonCredentialsFactory<C>
where
	C: TransportClient,
{
	fn make_credentials(
		&self,
		scope: &ScopeSet,
		source: CredentialSource,
	) -> Result<Box<dyn TokenFetcher<C>>> {
		#[derive(Deserialize)]
		struct Header {
			#[serde(rename = "type")]
			kind: String,
		}

		let header: Header = parse_json(source.bytes())?;

		match header.kind.as_str() {
			AUTHORIZED_USER_TYPE => {
				let key: AuthorizedUserKey = parse_json(source.bytes())?;
				let token_uri = match &key.token_uri {
					Some(uri) => uri.clone(),
					None => self.config.token_uri()?,
				};
				let fetcher = AuthorizedUserFetcher::new(
					key,
					scope.clone(),
					&token_uri,
					self.http_client.clone(),
				)?;

				Ok(Box::new(fetcher))
			},
			_ => Err(ConfigError::UnsupportedCredentialType { kind: header.kind }.into()),
		}
	}
}
impl<C> Debug for JsonCredentialsFactory<C>
where
	C: TransportClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JsonCredentialsFactory").field("config", &self.config).finish()
	}
}

fn parse_json<T>(bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ConfigError::InvalidCredentialsJson { source }.into())
}
