//! Uniform token-source facade and request-metadata decoration.
//!
//! [`Credentials`] hides which concrete [`TokenFetcher`] a resolver produced. Call sites use
//! [`Credentials::fetch_auth_token`] when they want the raw token,
//! [`Credentials::update_metadata`] when they only need headers, and
//! [`Credentials::update_metadata_fn`] when an HTTP client wants "decorate this request" as a
//! value it can store without naming this type.

pub mod metadata;

pub use metadata::*;

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	http::TransportClient,
	obs::{self, CredentialOp, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Boxed future returned by [`TokenFetcher::fetch_token`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Capability that exchanges credential material for access tokens.
///
/// Implementations are produced by a [`CredentialsFactory`](crate::fetcher::CredentialsFactory)
/// and owned by a [`Credentials`] facade afterwards. `fetch_token` may be called concurrently
/// from several tasks and must not rely on exclusive access.
pub trait TokenFetcher<C>
where
	Self: Send + Sync,
	C: TransportClient,
{
	/// Fetches a token, using `client` when supplied and the fetcher's own transport otherwise.
	fn fetch_token<'a>(&'a self, client: Option<&'a C>) -> FetchFuture<'a>;

	/// Stable key identifying the credential identity and requested scope.
	fn cache_key(&self) -> CacheKey;

	/// Project billed for quota, sent as [`QUOTA_PROJECT_KEY`] by metadata decoration.
	fn quota_project_id(&self) -> Option<&str> {
		None
	}
}

/// Deterministic identity of a credential + scope pair, for external token caches.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);
impl CacheKey {
	/// Wraps a precomputed key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CacheKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Facade specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestCredentials = Credentials<ReqwestHttpClient>;

/// Facade over a resolved [`TokenFetcher`].
///
/// The wrapped fetcher is fixed at construction. Clones share it, so every clone (and every
/// decorator returned by [`update_metadata_fn`](Self::update_metadata_fn)) reports the same
/// [`cache_key`](Self::cache_key) and produces the same headers for the same token.
pub struct Credentials<C>
where
	C: TransportClient,
{
	fetcher: Arc<dyn TokenFetcher<C>>,
}
impl<C> Credentials<C>
where
	C: TransportClient,
{
	/// Wraps a fetcher produced by a factory.
	pub fn new(fetcher: Box<dyn TokenFetcher<C>>) -> Self {
		Self { fetcher: Arc::from(fetcher) }
	}

	/// Wraps a concrete fetcher value.
	pub fn from_fetcher<F>(fetcher: F) -> Self
	where
		F: 'static + TokenFetcher<C>,
	{
		Self { fetcher: Arc::new(fetcher) }
	}

	/// Fetches a token through the wrapped fetcher.
	///
	/// Failures are returned exactly as the fetcher produced them; there is no retry here.
	pub async fn fetch_auth_token(&self, client: Option<&C>) -> Result<AccessToken> {
		const OP: CredentialOp = CredentialOp::FetchToken;

		let span = OpSpan::new(OP, "fetch_auth_token");

		obs::record_outcome(OP, OpOutcome::Attempt);

		let result = span.instrument(self.fetcher.fetch_token(client)).await;

		match &result {
			Ok(_) => obs::record_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Returns the wrapped fetcher's cache key.
	pub fn cache_key(&self) -> CacheKey {
		self.fetcher.cache_key()
	}

	/// Returns a copy of `metadata` carrying `Authorization: Bearer <token>`.
	///
	/// When the fetch yields no usable token (absent or empty) the copy is returned unchanged.
	/// An existing [`AUTHORIZATION_KEY`] entry is replaced, never appended to. Fetchers that
	/// name a quota project also set [`QUOTA_PROJECT_KEY`].
	pub async fn update_metadata(
		&self,
		metadata: &MetadataMap,
		client: Option<&C>,
	) -> Result<MetadataMap> {
		let token = self.fetch_auth_token(client).await?;

		Ok(with_bearer(metadata, &token, self.fetcher.quota_project_id()))
	}

	/// Returns the metadata decoration step as a shareable value bound to this facade.
	pub fn update_metadata_fn(&self) -> Arc<dyn MetadataDecorator<C>> {
		Arc::new(self.clone())
	}

	/// Returns `true` if both facades wrap the same fetcher instance.
	pub fn shares_fetcher_with(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.fetcher, &other.fetcher)
	}
}
impl<C> Clone for Credentials<C>
where
	C: TransportClient,
{
	fn clone(&self) -> Self {
		Self { fetcher: self.fetcher.clone() }
	}
}
impl<C> Debug for Credentials<C>
where
	C: TransportClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials").field("cache_key", &self.cache_key()).finish()
	}
}
impl<C> MetadataDecorator<C> for Credentials<C>
where
	C: TransportClient,
{
	fn decorate<'a>(
		&'a self,
		metadata: &'a MetadataMap,
		client: Option<&'a C>,
	) -> MetadataFuture<'a> {
		Box::pin(self.update_metadata(metadata, client))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
	// self
	use super::*;
	use crate::{
		error::TransientError,
		http::{ResponseMetadataSlot, TransportClient},
	};

	#[derive(Debug, ThisError)]
	#[error("Offline transport.")]
	struct Offline;

	type OfflineCredentials = Credentials<OfflineTransport>;

	struct OfflineTransport;
	impl TransportClient for OfflineTransport {
		type Handle = OfflineHandle;
		type TransportError = Offline;

		fn with_metadata(&self, _slot: ResponseMetadataSlot) -> Self::Handle {
			OfflineHandle
		}
	}

	struct OfflineHandle;
	impl<'c> AsyncHttpClient<'c> for OfflineHandle {
		type Error = HttpClientError<Offline>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, _request: HttpRequest) -> Self::Future {
			Box::pin(async { Err(HttpClientError::Reqwest(Box::new(Offline))) })
		}
	}

	struct ScriptedFetcher {
		token: Option<&'static str>,
		calls: AtomicUsize,
	}
	impl ScriptedFetcher {
		fn returning(token: Option<&'static str>) -> Self {
			Self { token, calls: AtomicUsize::new(0) }
		}
	}
	impl TokenFetcher<OfflineTransport> for ScriptedFetcher {
		fn fetch_token<'a>(&'a self, _client: Option<&'a OfflineTransport>) -> FetchFuture<'a> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);

				Ok(self.token.map(AccessToken::new).unwrap_or_default())
			})
		}

		fn cache_key(&self) -> CacheKey {
			CacheKey::new(format!("scripted:{}", self.token.unwrap_or("none")))
		}
	}

	struct FailingFetcher;
	impl TokenFetcher<OfflineTransport> for FailingFetcher {
		fn fetch_token<'a>(&'a self, _client: Option<&'a OfflineTransport>) -> FetchFuture<'a> {
			Box::pin(async {
				Err(TransientError::TokenEndpoint {
					message: "upstream unavailable".into(),
					status: Some(503),
					retry_after: None,
				}
				.into())
			})
		}

		fn cache_key(&self) -> CacheKey {
			CacheKey::new("failing")
		}
	}

	struct QuotaFetcher;
	impl TokenFetcher<OfflineTransport> for QuotaFetcher {
		fn fetch_token<'a>(&'a self, _client: Option<&'a OfflineTransport>) -> FetchFuture<'a> {
			Box::pin(async { Ok(AccessToken::new("abc")) })
		}

		fn cache_key(&self) -> CacheKey {
			CacheKey::new("quota")
		}

		fn quota_project_id(&self) -> Option<&str> {
			Some("billing-project")
		}
	}

	fn metadata(entries: &[(&str, &str)]) -> MetadataMap {
		entries.iter().map(|(k, v)| ((*k).to_owned(), vec![(*v).to_owned()])).collect()
	}

	#[tokio::test]
	async fn update_metadata_adds_bearer_header() {
		let credentials = OfflineCredentials::from_fetcher(ScriptedFetcher::returning(Some("abc")));
		let input = MetadataMap::new();
		let output = credentials
			.update_metadata(&input, Some(&OfflineTransport))
			.await
			.expect("Decoration should succeed when the fetcher returns a token.");

		assert_eq!(output, metadata(&[("Authorization", "Bearer abc")]));
		assert!(input.is_empty(), "The caller's map must not be mutated.");
	}

	#[tokio::test]
	async fn update_metadata_without_token_is_a_no_op() {
		let input = metadata(&[("X", "1")]);

		for token in [None, Some("")] {
			let credentials = OfflineCredentials::from_fetcher(ScriptedFetcher::returning(token));
			let output = credentials
				.update_metadata(&input, None)
				.await
				.expect("Missing tokens must not raise.");

			assert_eq!(output, input);
		}
	}

	#[tokio::test]
	async fn update_metadata_overwrites_existing_authorization() {
		let credentials = OfflineCredentials::from_fetcher(ScriptedFetcher::returning(Some("new")));
		let input = metadata(&[("Authorization", "old"), ("X", "1")]);
		let output = credentials
			.update_metadata(&input, None)
			.await
			.expect("Decoration should succeed when the fetcher returns a token.");

		assert_eq!(output, metadata(&[("Authorization", "Bearer new"), ("X", "1")]));
		assert_eq!(input.get("Authorization"), Some(&vec!["old".to_owned()]));
	}

	#[tokio::test]
	async fn decorators_share_identity_and_output() {
		let credentials = OfflineCredentials::from_fetcher(ScriptedFetcher::returning(Some("abc")));
		let first = credentials.update_metadata_fn();
		let second = credentials.update_metadata_fn();
		let input = metadata(&[("X", "1")]);
		let lhs = first.decorate(&input, None).await.expect("First decorator should succeed.");
		let rhs = second.decorate(&input, None).await.expect("Second decorator should succeed.");

		assert_eq!(lhs, rhs);
		assert!(credentials.shares_fetcher_with(&credentials.clone()));
		assert_eq!(credentials.cache_key(), CacheKey::new("scripted:abc"));
	}

	#[tokio::test]
	async fn fetch_failures_propagate_unchanged() {
		let credentials = OfflineCredentials::from_fetcher(FailingFetcher);
		let err = credentials
			.update_metadata(&MetadataMap::new(), None)
			.await
			.expect_err("Fetcher failures must surface to the caller.");

		assert!(matches!(
			err,
			Error::Transient(TransientError::TokenEndpoint { status: Some(503), .. })
		));
	}

	#[tokio::test]
	async fn update_metadata_adds_quota_project_of_fetcher() {
		let credentials = OfflineCredentials::from_fetcher(QuotaFetcher);
		let output = credentials
			.update_metadata(&MetadataMap::new(), None)
			.await
			.expect("Decoration should succeed when the fetcher returns a token.");

		assert_eq!(
			output,
			metadata(&[("Authorization", "Bearer abc"), ("x-goog-user-project", "billing-project")])
		);
	}

	#[tokio::test]
	async fn every_decoration_fetches_once() {
		let fetcher = Arc::new(ScriptedFetcher::returning(Some("abc")));
		let credentials = OfflineCredentials { fetcher: fetcher.clone() };

		for _ in 0..3 {
			credentials
				.update_metadata(&MetadataMap::new(), None)
				.await
				.expect("Decoration should succeed.");
		}

		assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
	}
}
