//! Refresh-token fetcher for `authorized_user` credential files.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret, scope::fingerprint_of},
	credentials::{CacheKey, FetchFuture, TokenFetcher},
	http::TransportClient,
	oauth::{self, RefreshClient},
};

/// Value of the `type` field in an authorized-user credential file.
pub const AUTHORIZED_USER_TYPE: &str = "authorized_user";

/// Contents of an `authorized_user` credential file.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserKey {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Long-lived refresh token issued to the user.
	pub refresh_token: TokenSecret,
	/// Token endpoint override stored in the file.
	#[serde(default)]
	pub token_uri: Option<Url>,
	/// Project billed for quota, when the file names one.
	#[serde(default)]
	pub quota_project_id: Option<String>,
}
impl Debug for AuthorizedUserKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedUserKey")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("refresh_token", &self.refresh_token)
			.field("token_uri", &self.token_uri)
			.field("quota_project_id", &self.quota_project_id)
			.finish()
	}
}

/// Exchanges an authorized user's refresh token for access tokens.
///
/// Each [`fetch_token`](TokenFetcher::fetch_token) call performs one grant; nothing is cached.
pub struct AuthorizedUserFetcher<C>
where
	C: TransportClient,
{
	oauth_client: RefreshClient,
	refresh_token: TokenSecret,
	scope: ScopeSet,
	quota_project_id: Option<String>,
	http_client: Arc<C>,
	cache_key: CacheKey,
}
impl<C> AuthorizedUserFetcher<C>
where
	C: TransportClient,
{
	/// Builds a fetcher posting to `token_uri` through `http_client` by default.
	pub fn new(
		key: AuthorizedUserKey,
		scope: ScopeSet,
		token_uri: &Url,
		http_client: Arc<C>,
	) -> Result<Self> {
		let oauth_client = oauth::refresh_client(&key.client_id, &key.client_secret, token_uri)?;
		let identity = fingerprint_of(&[&key.client_id, key.refresh_token.expose()]);
		let cache_key =
			CacheKey::new(format!("{AUTHORIZED_USER_TYPE}:{identity}:{}", scope.fingerprint()));

		Ok(Self {
			oauth_client,
			refresh_token: key.refresh_token,
			scope,
			quota_project_id: key.quota_project_id,
			http_client,
			cache_key,
		})
	}

	/// Scope requested on every grant.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}
}
impl<C> TokenFetcher<C> for AuthorizedUserFetcher<C>
where
	C: TransportClient,
{
	fn fetch_token<'a>(&'a self, client: Option<&'a C>) -> FetchFuture<'a> {
		let transport = client.unwrap_or(self.http_client.as_ref());

		Box::pin(oauth::exchange_refresh_token(
			&self.oauth_client,
			transport,
			&self.refresh_token,
			&self.scope,
		))
	}

	fn cache_key(&self) -> CacheKey {
		self.cache_key.clone()
	}

	fn quota_project_id(&self) -> Option<&str> {
		self.quota_project_id.as_deref()
	}
}
impl<C> Debug for AuthorizedUserFetcher<C>
where
	C: TransportClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedUserFetcher")
			.field("scope", &self.scope)
			.field("quota_project_id", &self.quota_project_id)
			.field("cache_key", &self.cache_key)
			.finish_non_exhaustive()
	}
}
