//! Request-metadata maps and the decorator contract handed to HTTP call sites.

// self
use crate::{_prelude::*, auth::AccessToken, http::TransportClient};

/// Header carrying the bearer token.
pub const AUTHORIZATION_KEY: &str = "Authorization";
/// Header naming the project billed for quota.
pub const QUOTA_PROJECT_KEY: &str = "x-goog-user-project";

/// Outgoing request metadata: header name to its list of values.
///
/// Keys iterate in sorted order rather than insertion order; decoration only replaces whole
/// entries, so callers that need a specific header order must impose it when sending.
pub type MetadataMap = BTreeMap<String, Vec<String>>;

/// Boxed future returned by [`MetadataDecorator::decorate`].
pub type MetadataFuture<'a> = Pin<Box<dyn Future<Output = Result<MetadataMap>> + 'a + Send>>;

/// "Decorate this request's metadata" as a first-class value.
///
/// HTTP clients store an `Arc<dyn MetadataDecorator<C>>` in their configuration and call it
/// before each request, without depending on the credential type that backs it. Implementations
/// must return a new map and leave the input untouched.
pub trait MetadataDecorator<C>
where
	Self: Send + Sync,
	C: TransportClient,
{
	/// Returns a decorated copy of `metadata`, fetching through `client` when supplied.
	fn decorate<'a>(&'a self, metadata: &'a MetadataMap, client: Option<&'a C>)
	-> MetadataFuture<'a>;
}

/// Returns a copy of `metadata` with the bearer header for `token`, or an unchanged copy when
/// the token carries no usable access token.
///
/// When `quota_project` is set it is written to [`QUOTA_PROJECT_KEY`] alongside the bearer
/// header, replacing any caller-supplied value.
pub fn with_bearer(
	metadata: &MetadataMap,
	token: &AccessToken,
	quota_project: Option<&str>,
) -> MetadataMap {
	let mut decorated = metadata.clone();

	if let Some(value) = token.bearer_value() {
		decorated.insert(AUTHORIZATION_KEY.to_owned(), vec![value]);

		if let Some(project) = quota_project {
			decorated.insert(QUOTA_PROJECT_KEY.to_owned(), vec![project.to_owned()]);
		}
	}

	decorated
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn with_bearer_replaces_and_preserves() {
		let mut input = MetadataMap::new();

		input.insert(AUTHORIZATION_KEY.into(), vec!["old".into(), "older".into()]);
		input.insert("x-goog-user-project".into(), vec!["demo".into()]);

		let decorated = with_bearer(&input, &AccessToken::new("new"), None);

		assert_eq!(decorated[AUTHORIZATION_KEY], vec!["Bearer new".to_owned()]);
		assert_eq!(decorated[QUOTA_PROJECT_KEY], vec!["demo".to_owned()]);
		assert_eq!(input[AUTHORIZATION_KEY].len(), 2);
		assert_eq!(with_bearer(&input, &AccessToken::default(), None), input);
	}

	#[test]
	fn with_bearer_sets_quota_project_only_with_a_token() {
		let mut input = MetadataMap::new();

		input.insert(QUOTA_PROJECT_KEY.into(), vec!["caller".into()]);

		let decorated = with_bearer(&input, &AccessToken::new("abc"), Some("billing"));

		assert_eq!(decorated[QUOTA_PROJECT_KEY], vec!["billing".to_owned()]);
		assert_eq!(with_bearer(&input, &AccessToken::new(""), Some("billing")), input);

		let keys = decorated.keys().map(String::as_str).collect::<Vec<_>>();

		assert_eq!(keys, [AUTHORIZATION_KEY, QUOTA_PROJECT_KEY]);
	}
}
