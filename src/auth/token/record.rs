//! Access-token records produced by token fetchers.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Scheme prepended to access tokens in the authorization header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Result of a single token fetch.
///
/// Only `access_token` matters to metadata decoration; the remaining fields are informational
/// and let callers that wrap a credential in their own cache decide when to fetch again. Some
/// fetchers legitimately have no token to hand out, in which case `access_token` is `None`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Token type reported by the endpoint (usually `bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Expiry instant derived from `expires_in`, when the endpoint reported one.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Scopes granted to the token.
	#[serde(default)]
	pub scope: ScopeSet,
}
impl AccessToken {
	/// Creates a record holding only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: Some(TokenSecret::new(access_token)), ..Default::default() }
	}

	/// Sets the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the granted scope.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Returns the `Bearer <token>` header value, or `None` when there is no usable token.
	///
	/// An empty token string is treated the same as a missing one.
	pub fn bearer_value(&self) -> Option<String> {
		self.access_token
			.as_ref()
			.filter(|secret| !secret.is_empty())
			.map(|secret| format!("{BEARER_PREFIX}{}", secret.expose()))
	}

	/// Returns `true` if the record carries an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}
