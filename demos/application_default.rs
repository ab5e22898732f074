//! Resolves application default credentials from an `authorized_user` file and decorates
//! request metadata with the fetched bearer token.
//!
//! A local mock stands in for the token endpoint, so the demo runs offline.

// std
use std::{env, fs, process, str::FromStr};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_adc::{
	auth::ScopeSet,
	credentials::{AUTHORIZATION_KEY, MetadataDecorator, MetadataMap, QUOTA_PROJECT_KEY},
	env::{MapEnvironment, Platform},
	fetcher::JsonCredentialsFactory,
	http::ReqwestHttpClient,
	resolver::{CREDENTIALS_ENV_VAR, CredentialResolver, ReqwestCredentialResolver},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let key_path = env::temp_dir().join(format!("oauth2_adc_demo_{}.json", process::id()));
	let key = serde_json::json!({
		"type": "authorized_user",
		"client_id": "demo-client.apps.googleusercontent.com",
		"client_secret": "demo-secret",
		"refresh_token": "1//demo-refresh",
		"token_uri": server.url("/token"),
	});

	fs::write(&key_path, key.to_string())?;

	let resolver: ReqwestCredentialResolver = CredentialResolver::new(
		MapEnvironment::default().with_var(CREDENTIALS_ENV_VAR, key_path.display().to_string()),
		Platform::current(),
		JsonCredentialsFactory::new(ReqwestHttpClient::default()),
	);
	let scope = ScopeSet::from_str("https://www.googleapis.com/auth/cloud-platform")?;
	let credentials = resolver.application_default(&scope)?;

	println!("Resolved credentials with cache key {}.", credentials.cache_key());

	let decorate = credentials.update_metadata_fn();
	let mut metadata = MetadataMap::new();

	metadata.insert(QUOTA_PROJECT_KEY.into(), vec!["demo-project".into()]);

	let decorated = decorate.decorate(&metadata, None).await?;

	println!("Authorization header: {:?}.", decorated.get(AUTHORIZATION_KEY));

	token_mock.assert_async().await;
	fs::remove_file(&key_path)?;

	Ok(())
}
