//! Refresh-token exchange on top of the `oauth2` crate, plus error classification.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TransportClient},
};

/// Default OAuth 2.0 token endpoint for application default credentials.
pub const DEFAULT_TOKEN_URI: &str = "https://www.googleapis.com/oauth2/v3/token";

/// `oauth2` client configured with only a token endpoint.
pub(crate) type RefreshClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Builds a confidential client that authenticates with HTTP basic auth.
pub(crate) fn refresh_client(
	client_id: &str,
	client_secret: &TokenSecret,
	token_uri: &Url,
) -> Result<RefreshClient> {
	let token_url = TokenUrl::new(token_uri.to_string())
		.map_err(|source| ConfigError::InvalidTokenUri { source })?;

	Ok(BasicClient::new(ClientId::new(client_id.to_owned()))
		.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
		.set_token_uri(token_url))
}

/// Performs one `refresh_token` grant and maps the response into an [`AccessToken`].
pub(crate) async fn exchange_refresh_token<C>(
	client: &RefreshClient,
	transport: &C,
	refresh_token: &TokenSecret,
	scope: &ScopeSet,
) -> Result<AccessToken>
where
	C: ?Sized + TransportClient,
{
	let meta = ResponseMetadataSlot::default();
	let handle = transport.with_metadata(meta.clone());
	let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
	let mut request = client.exchange_refresh_token(&refresh_secret);

	for entry in scope.iter() {
		request = request.add_scope(Scope::new(entry.to_owned()));
	}

	let response =
		request.request_async(&handle).await.map_err(|err| map_request_error(meta.take(), err))?;
	let issued_at = OffsetDateTime::now_utc();
	let mut token = AccessToken::new(response.access_token().secret().to_owned())
		.with_token_type(response.token_type().as_ref());

	if let Some(expires_at) = response
		.expires_in()
		.and_then(|expires_in| Duration::try_from(expires_in).ok())
		.and_then(|expires_in| issued_at.checked_add(expires_in))
	{
		token = token.with_expires_at(expires_at);
	}

	Ok(token.with_scope(granted_scope(response.scopes().map(Vec::as_slice), scope)))
}

/// Scope reported by the endpoint, or `requested` when it reported none or nothing usable.
fn granted_scope(returned: Option<&[Scope]>, requested: &ScopeSet) -> ScopeSet {
	let Some(returned) = returned else {
		return requested.clone();
	};

	match ScopeSet::new(returned.iter().flat_map(|entry| entry.split_whitespace())) {
		Ok(granted) if !granted.is_empty() => granted,
		_ => requested.clone(),
	}
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response(response, meta),
		RequestTokenError::Request(error) => map_transport_error(error, meta),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status: meta_status(meta) }.into(),
		RequestTokenError::Other(message) => transient(message, meta),
	}
}

fn map_server_response(response: BasicErrorResponse, meta: Option<&ResponseMetadata>) -> Error {
	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => Error::InvalidGrant { reason },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason },
		BasicErrorResponseType::InvalidScope => Error::InsufficientScope { reason },
		_ => transient(format!("OAuth error {reason}"), meta),
	}
}

fn map_transport_error<E>(err: HttpClientError<E>, meta: Option<&ResponseMetadata>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => transient(message, meta),
		_ => transient("HTTP client failed", meta),
	}
}

fn transient(message: impl Into<String>, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: message.into(),
		status: meta_status(meta),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
