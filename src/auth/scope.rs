//! Requested-scope modeling shared by the resolver, factories, and cache keys.

// std
use std::{collections::BTreeSet, sync::OnceLock};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// A single entry cannot contain embedded whitespace.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Canonical set of requested OAuth scopes.
///
/// Callers may describe scopes either as one space-delimited string (via [`FromStr`]) or as a
/// list of entries (via [`ScopeSet::new`]); both collapse into the same deduplicated, sorted
/// form so that factories and cache keys never see two spellings of the same request. An empty
/// set is valid and means "no scope restriction requested".
#[derive(Default)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
	fingerprint: OnceLock<String>,
}
impl ScopeSet {
	/// Builds a canonical scope set from a list of entries.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut canonical = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			canonical.insert(owned);
		}

		Ok(Self { scopes: canonical.into_iter().collect(), fingerprint: OnceLock::new() })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true when no scope restriction was requested.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over canonical scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(String::as_str)
	}

	/// Space-delimited canonical representation, as sent to token endpoints.
	pub fn normalized(&self) -> String {
		self.scopes.join(" ")
	}

	/// Stable, cached base64 (no padding) SHA-256 digest of [`normalized`](Self::normalized).
	pub fn fingerprint(&self) -> String {
		self.fingerprint.get_or_init(|| fingerprint_of(&[self.normalized().as_str()])).clone()
	}
}
impl Clone for ScopeSet {
	fn clone(&self) -> Self {
		Self { scopes: self.scopes.clone(), fingerprint: self.fingerprint.clone() }
	}
}
impl PartialEq for ScopeSet {
	fn eq(&self, other: &Self) -> bool {
		self.scopes == other.scopes
	}
}
impl Eq for ScopeSet {}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl TryFrom<&str> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl TryFrom<&[&str]> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: &[&str]) -> Result<Self, Self::Error> {
		Self::new(value.iter().copied())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Delimited(String),
			List(Vec<String>),
		}

		let parsed = match Raw::deserialize(deserializer)? {
			Raw::Delimited(value) => value.parse(),
			Raw::List(values) => ScopeSet::new(values),
		};

		parsed.map_err(DeError::custom)
	}
}

/// Base64 (no padding) SHA-256 digest over newline-joined parts.
pub(crate) fn fingerprint_of(parts: &[&str]) -> String {
	let mut hasher = Sha256::new();

	for (idx, part) in parts.iter().enumerate() {
		if idx > 0 {
			hasher.update(b"\n");
		}

		hasher.update(part.as_bytes());
	}

	STANDARD_NO_PAD.encode(hasher.finalize())
}
