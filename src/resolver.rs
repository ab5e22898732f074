//! Locates application default credentials and hands them to a factory.
//!
//! Two strategies are available, each callable on its own:
//!
//! - [`CredentialResolver::from_env`] reads the file named by `GOOGLE_APPLICATION_CREDENTIALS`.
//! - [`CredentialResolver::from_well_known_path`] reads
//!   `<root>/gcloud/application_default_credentials.json`, where `<root>` is `APPDATA` on
//!   Windows and `HOME` elsewhere.
//!
//! A strategy whose precondition is absent yields [`Resolution::NotConfigured`] so callers can
//! move on to the next one; [`CredentialResolver::application_default`] performs that chaining.
//! Anything else that goes wrong is an [`Error`]. Resolution blocks on file I/O.

// std
use std::{fs, io::ErrorKind};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	credentials::Credentials,
	env::{Environment, Platform},
	error::ConfigError,
	fetcher::CredentialsFactory,
	http::TransportClient,
	obs::{self, CredentialOp, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")]
use crate::{env::ProcessEnvironment, fetcher::JsonCredentialsFactory, http::ReqwestHttpClient};

/// Environment variable naming an explicit credentials file.
pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Credentials path relative to the platform root, `/`-delimited.
pub const WELL_KNOWN_PATH: &str = "gcloud/application_default_credentials.json";

/// Where a [`CredentialSource`] was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceOrigin {
	/// Path taken from an environment variable.
	EnvironmentPath {
		/// Variable that held the path.
		env_var: String,
		/// Path read from the variable.
		path: PathBuf,
	},
	/// Per-OS well-known location.
	WellKnownPath {
		/// Computed path.
		path: PathBuf,
	},
}
impl SourceOrigin {
	/// File the bytes were read from.
	pub fn path(&self) -> &Path {
		match self {
			Self::EnvironmentPath { path, .. } | Self::WellKnownPath { path } => path,
		}
	}
}

/// Raw credential bytes plus their origin.
///
/// Produced by the resolver and moved into a [`CredentialsFactory`]; the bytes are never
/// interpreted here.
#[derive(Clone)]
pub struct CredentialSource {
	bytes: Vec<u8>,
	origin: SourceOrigin,
}
impl CredentialSource {
	/// Wraps bytes read from `origin`.
	pub fn new(bytes: Vec<u8>, origin: SourceOrigin) -> Self {
		Self { bytes, origin }
	}

	/// Full file contents.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Where the contents came from.
	pub fn origin(&self) -> &SourceOrigin {
		&self.origin
	}

	/// Consumes the source, returning the raw contents.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}
}
impl Debug for CredentialSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialSource")
			.field("origin", &self.origin)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Result of a single resolution strategy when nothing went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
	/// The strategy located credentials.
	Found(T),
	/// The strategy's precondition (variable or file) is absent.
	NotConfigured,
}
impl<T> Resolution<T> {
	/// Returns `true` for [`Resolution::Found`].
	pub fn is_found(&self) -> bool {
		matches!(self, Self::Found(_))
	}

	/// Returns `true` for [`Resolution::NotConfigured`].
	pub fn is_not_configured(&self) -> bool {
		matches!(self, Self::NotConfigured)
	}

	/// Converts into an [`Option`], dropping the not-configured marker.
	pub fn found(self) -> Option<T> {
		match self {
			Self::Found(value) => Some(value),
			Self::NotConfigured => None,
		}
	}

	/// Maps the found value.
	pub fn map<U, F>(self, f: F) -> Resolution<U>
	where
		F: FnOnce(T) -> U,
	{
		match self {
			Self::Found(value) => Resolution::Found(f(value)),
			Self::NotConfigured => Resolution::NotConfigured,
		}
	}

	fn outcome(&self) -> OpOutcome {
		match self {
			Self::Found(_) => OpOutcome::Success,
			Self::NotConfigured => OpOutcome::NotConfigured,
		}
	}
}

/// Names consulted by [`CredentialResolver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
	/// Variable naming an explicit credentials file.
	pub credentials_env_var: String,
	/// `/`-delimited path appended to the platform root.
	pub well_known_path: String,
}
impl ResolverConfig {
	/// Overrides the credentials variable name.
	pub fn with_credentials_env_var(mut self, name: impl Into<String>) -> Self {
		self.credentials_env_var = name.into();

		self
	}

	/// Overrides the well-known relative path.
	pub fn with_well_known_path(mut self, relative: impl Into<String>) -> Self {
		self.well_known_path = relative.into();

		self
	}
}
impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			credentials_env_var: CREDENTIALS_ENV_VAR.into(),
			well_known_path: WELL_KNOWN_PATH.into(),
		}
	}
}

/// Resolver specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestCredentialResolver = CredentialResolver<ReqwestHttpClient>;

/// Locates credential sources and turns them into [`Credentials`].
pub struct CredentialResolver<C>
where
	C: TransportClient,
{
	env: Arc<dyn Environment>,
	platform: Platform,
	config: ResolverConfig,
	factory: Arc<dyn CredentialsFactory<C>>,
}
impl<C> CredentialResolver<C>
where
	C: TransportClient,
{
	/// Creates a resolver over injected capabilities.
	pub fn new<E, F>(env: E, platform: Platform, factory: F) -> Self
	where
		E: 'static + Environment,
		F: 'static + CredentialsFactory<C>,
	{
		Self {
			env: Arc::new(env),
			platform,
			config: ResolverConfig::default(),
			factory: Arc::new(factory),
		}
	}

	/// Replaces the resolver configuration.
	pub fn with_config(mut self, config: ResolverConfig) -> Self {
		self.config = config;

		self
	}

	/// Active configuration.
	pub fn config(&self) -> &ResolverConfig {
		&self.config
	}

	/// Platform used for the well-known path.
	pub fn platform(&self) -> Platform {
		self.platform
	}

	/// Reads the file named by the credentials variable without invoking the factory.
	pub fn locate_from_env(&self) -> Result<Resolution<CredentialSource>> {
		let env_var = &self.config.credentials_env_var;
		let Some(raw) = self.env.non_empty_var(env_var) else {
			return Ok(Resolution::NotConfigured);
		};
		let path = PathBuf::from(raw);
		let read = fs::read(&path);

		obs::checked_path(CredentialOp::ResolveEnvironment, &path, read.is_ok());

		let bytes = read.map_err(|source| ConfigError::CredentialsFile {
			env_var: env_var.clone(),
			path: path.clone(),
			source,
		})?;

		Ok(Resolution::Found(CredentialSource::new(
			bytes,
			SourceOrigin::EnvironmentPath { env_var: env_var.clone(), path },
		)))
	}

	/// Computes the well-known path, or `None` when the platform root variable is unset.
	pub fn well_known_path(&self) -> Option<PathBuf> {
		let root = self.env.non_empty_var(self.platform.root_env_var())?;

		Some(self.platform.join(&root, &self.config.well_known_path))
	}

	/// Reads the well-known file without invoking the factory.
	pub fn locate_from_well_known_path(&self) -> Result<Resolution<CredentialSource>> {
		let Some(path) = self.well_known_path() else {
			return Ok(Resolution::NotConfigured);
		};

		match fs::read(&path) {
			Ok(bytes) => {
				obs::checked_path(CredentialOp::ResolveWellKnown, &path, true);

				Ok(Resolution::Found(CredentialSource::new(
					bytes,
					SourceOrigin::WellKnownPath { path },
				)))
			},
			Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
				obs::checked_path(CredentialOp::ResolveWellKnown, &path, false);

				Ok(Resolution::NotConfigured)
			},
			Err(source) => Err(ConfigError::WellKnownFile { path, source }.into()),
		}
	}

	/// Builds credentials from the file named by the credentials variable.
	///
	/// An unset or empty variable is [`Resolution::NotConfigured`]; a path that cannot be read
	/// is [`ConfigError::CredentialsFile`]. Factory failures are returned unchanged.
	pub fn from_env(&self, scope: &ScopeSet) -> Result<Resolution<Credentials<C>>> {
		observe(CredentialOp::ResolveEnvironment, "from_env", || {
			self.build(scope, self.locate_from_env()?)
		})
	}

	/// Builds credentials from the per-OS well-known file.
	///
	/// A missing root variable or missing file is [`Resolution::NotConfigured`], including when
	/// the root itself is not a directory; a file that exists but cannot be read is
	/// [`ConfigError::WellKnownFile`].
	pub fn from_well_known_path(&self, scope: &ScopeSet) -> Result<Resolution<Credentials<C>>> {
		observe(CredentialOp::ResolveWellKnown, "from_well_known_path", || {
			self.build(scope, self.locate_from_well_known_path()?)
		})
	}

	/// Tries [`from_env`](Self::from_env), then
	/// [`from_well_known_path`](Self::from_well_known_path).
	///
	/// Errors from the first strategy stop the chain. Fails with
	/// [`ConfigError::CredentialsNotFound`] when neither strategy is configured.
	pub fn application_default(&self, scope: &ScopeSet) -> Result<Credentials<C>> {
		const OP: CredentialOp = CredentialOp::ResolveApplicationDefault;

		let resolved = observe(OP, "application_default", || match self.from_env(scope)? {
			Resolution::Found(credentials) => Ok(Resolution::Found(credentials)),
			Resolution::NotConfigured => self.from_well_known_path(scope),
		})?;

		match resolved {
			Resolution::Found(credentials) => Ok(credentials),
			Resolution::NotConfigured => Err(ConfigError::CredentialsNotFound {
				env_var: self.config.credentials_env_var.clone(),
				well_known: self
					.well_known_path()
					.map(|path| path.display().to_string())
					.unwrap_or_default(),
			}
			.into()),
		}
	}

	fn build(
		&self,
		scope: &ScopeSet,
		located: Resolution<CredentialSource>,
	) -> Result<Resolution<Credentials<C>>> {
		match located {
			Resolution::Found(source) => {
				let fetcher = self.factory.make_credentials(scope, source)?;

				Ok(Resolution::Found(Credentials::new(fetcher)))
			},
			Resolution::NotConfigured => Ok(Resolution::NotConfigured),
		}
	}
}
#[cfg(feature = "reqwest")]
impl CredentialResolver<ReqwestHttpClient> {
	/// Resolver over the real process environment, the compile-target platform, and the
	/// default JSON factory with a fresh reqwest client.
	pub fn from_process() -> Self {
		Self::new(
			ProcessEnvironment,
			Platform::current(),
			JsonCredentialsFactory::new(ReqwestHttpClient::default()),
		)
	}
}
impl<C> Clone for CredentialResolver<C>
where
	C: TransportClient,
{
	fn clone(&self) -> Self {
		Self {
			env: self.env.clone(),
			platform: self.platform,
			config: self.config.clone(),
			factory: self.factory.clone(),
		}
	}
}
impl<C> Debug for CredentialResolver<C>
where
	C: TransportClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialResolver")
			.field("platform", &self.platform)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn observe<T, F>(op: CredentialOp, stage: &'static str, f: F) -> Result<Resolution<T>>
where
	F: FnOnce() -> Result<Resolution<T>>,
{
	let _guard = OpSpan::new(op, stage).entered();

	obs::record_outcome(op, OpOutcome::Attempt);

	let result = f();

	match &result {
		Ok(resolution) => obs::record_outcome(op, resolution.outcome()),
		Err(_) => obs::record_outcome(op, OpOutcome::Failure),
	}

	result
}
