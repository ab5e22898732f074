//! Injected process capabilities: OS family classification and environment lookups.
//!
//! The resolver never reads `std::env` directly. It receives a [`Platform`] classified once at
//! startup and an [`Environment`] implementation, so tests can describe a Windows host or a
//! missing `HOME` without mutating real process state.

// std
use std::ffi::{OsStr, OsString};
// self
use crate::_prelude::*;

/// Variable holding the Windows application-data root.
pub const APPDATA_VAR: &str = "APPDATA";
/// Variable holding the user's home directory on every other OS.
pub const HOME_VAR: &str = "HOME";

/// OS family used to choose the well-known credentials root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
	/// Windows-family hosts (`APPDATA` root, `\` separator).
	Windows,
	/// Every other host (`HOME` root, `/` separator).
	Unix,
}
impl Platform {
	/// Classifies a raw system name; any name starting with `win` (case-insensitive) is Windows.
	pub fn from_system_name(name: &str) -> Self {
		match name.get(..3) {
			Some(prefix) if prefix.eq_ignore_ascii_case("win") => Self::Windows,
			_ => Self::Unix,
		}
	}

	/// Classifies the compile target of the running process.
	pub fn current() -> Self {
		Self::from_system_name(std::env::consts::OS)
	}

	/// Variable naming the root directory of the well-known credentials file.
	pub const fn root_env_var(self) -> &'static str {
		match self {
			Self::Windows => APPDATA_VAR,
			Self::Unix => HOME_VAR,
		}
	}

	/// Path separator used when joining the well-known path.
	pub const fn separator(self) -> char {
		match self {
			Self::Windows => '\\',
			Self::Unix => '/',
		}
	}

	/// Joins `root` with a `/`-delimited relative path using this platform's separator.
	///
	/// Trailing separators are trimmed from Unicode roots; other roots are used verbatim.
	pub fn join(self, root: &OsStr, relative: &str) -> PathBuf {
		let sep = self.separator();
		let mut sep_buf = [0; 4];
		let sep_str = sep.encode_utf8(&mut sep_buf);
		let mut joined = match root.to_str() {
			Some(root) => OsString::from(root.trim_end_matches(['/', sep])),
			None => root.to_owned(),
		};

		for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
			joined.push(&*sep_str);
			joined.push(segment);
		}

		PathBuf::from(joined)
	}
}
impl Display for Platform {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Windows => f.write_str("windows"),
			Self::Unix => f.write_str("unix"),
		}
	}
}

/// Read-only view of environment variables.
pub trait Environment
where
	Self: Send + Sync,
{
	/// Returns the raw value of `key`, or `None` when it is unset.
	///
	/// Values need not be valid Unicode; paths are built from them as-is.
	fn var(&self, key: &str) -> Option<OsString>;

	/// Like [`var`](Self::var), but treats an empty value as unset.
	fn non_empty_var(&self, key: &str) -> Option<OsString> {
		self.var(key).filter(|value| !value.is_empty())
	}
}

/// [`Environment`] backed by the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;
impl Environment for ProcessEnvironment {
	fn var(&self, key: &str) -> Option<OsString> {
		std::env::var_os(key)
	}
}

/// In-memory [`Environment`] for tests and embedders that assemble their own configuration.
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment(BTreeMap<String, OsString>);
impl MapEnvironment {
	/// Returns a copy of the environment with `key` set to `value`.
	pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Sets `key` to `value` in place.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<OsString>) {
		self.0.insert(key.into(), value.into());
	}

	/// Removes `key`, returning its previous value.
	pub fn remove(&mut self, key: &str) -> Option<OsString> {
		self.0.remove(key)
	}
}
impl Environment for MapEnvironment {
	fn var(&self, key: &str) -> Option<OsString> {
		self.0.get(key).cloned()
	}
}
impl<K, V> FromIterator<(K, V)> for MapEnvironment
where
	K: Into<String>,
	V: Into<OsString>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classifies_system_names_by_win_prefix() {
		assert_eq!(Platform::from_system_name("Windows_NT"), Platform::Windows);
		assert_eq!(Platform::from_system_name("WIN32"), Platform::Windows);
		assert_eq!(Platform::from_system_name("windows"), Platform::Windows);
		assert_eq!(Platform::from_system_name("Linux"), Platform::Unix);
		assert_eq!(Platform::from_system_name("Darwin"), Platform::Unix);
		assert_eq!(Platform::from_system_name("wi"), Platform::Unix);
		assert_eq!(Platform::from_system_name(""), Platform::Unix);
	}

	#[test]
	fn root_variable_follows_platform() {
		assert_eq!(Platform::Windows.root_env_var(), "APPDATA");
		assert_eq!(Platform::Unix.root_env_var(), "HOME");
	}

	#[test]
	fn join_uses_platform_separator() {
		let relative = "gcloud/application_default_credentials.json";

		assert_eq!(
			Platform::Unix.join(OsStr::new("/home/dev/"), relative),
			PathBuf::from("/home/dev/gcloud/application_default_credentials.json")
		);
		assert_eq!(
			Platform::Windows.join(OsStr::new(r"C:\Users\dev\AppData\Roaming"), relative),
			PathBuf::from(
				r"C:\Users\dev\AppData\Roaming\gcloud\application_default_credentials.json"
			)
		);
	}

	#[test]
	fn map_environment_treats_empty_as_unset() {
		let env = MapEnvironment::default().with_var("EMPTY", "").with_var("SET", "value");

		assert_eq!(env.var("EMPTY").as_deref(), Some(OsStr::new("")));
		assert_eq!(env.non_empty_var("EMPTY"), None);
		assert_eq!(env.non_empty_var("SET").as_deref(), Some(OsStr::new("value")));
		assert_eq!(env.non_empty_var("MISSING"), None);
	}

	#[cfg(unix)]
	#[test]
	fn non_unicode_values_survive_lookup_and_join() {
		// std
		use std::os::unix::ffi::{OsStrExt, OsStringExt};

		let raw = OsString::from_vec(b"/home/d\xffv".to_vec());
		let env = MapEnvironment::default().with_var(HOME_VAR, raw.clone());

		assert_eq!(env.non_empty_var(HOME_VAR), Some(raw.clone()));
		assert_eq!(
			Platform::Unix.join(&raw, "gcloud/adc.json").as_os_str().as_bytes(),
			b"/home/d\xffv/gcloud/adc.json"
		);
	}
}
