//! Keyword tables that separate deployment data from deployment prose.
//!
//! The built-in entries come from telecom deployment templates. Every table
//! can be extended from the `whitelists` section of the config file.

use serde::Deserialize;

/// Substrings marking a row as prose or embedded code the preprocessor must
/// pass through untouched.
pub const KNOWN_PROSE: &[&str] = &[
	"Version: 1.0, Date:",
	"JAVA_OPTS",
	"-XX:",
	"-Xlog:",
	"\"kty\":\"",
	"\"kid\":\"",
	"\"crv\":\"",
	"\"x\":\"",
	"\"y\":\"",
	"jwks: '{",
];

/// Whole rows (after trimming) that are fragments of embedded JSON.
pub const PROSE_ROWS: &[&str] = &["{", "}", "]}'"];

/// Mapping keys that start uppercase but are still data. A trailing `*`
/// matches any suffix.
pub const UPPERCASE_KEYS: &[&str] = &[
	"IPv4",
	"IPv6",
	"ETCD_*",
	"ENABLE_*",
	"PREFIX-*",
	"JAVA_*",
	"LOG_*",
	"TZ",
	"HTTP_PROXY",
	"HTTPS_PROXY",
	"NO_PROXY",
];

/// Single-key mappings whose unquoted value may contain spaces. An entry of
/// the form `key: prefix` only matches values starting with `prefix`.
pub const LONG_VALUE_KEYS: &[&str] = &[
	"cleanupSchedule",
	"filter: ruby",
	"supportedGps",
	"proxy.istio.io/config",
];

/// Text that appears in real templates without being YAML. Rows containing
/// one of these never abort the run.
pub const ALLOWED_TEXT: &[&str] = &[
	"dced.excluded.paths",
	"Important legal notice",
	"IF YOU ARE NOT AN AUTHORIZED USER STOP",
];

/// The editable keyword tables used by the preprocessor and the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelists {
	pub known_prose: Vec<String>,
	pub uppercase_keys: Vec<String>,
	pub long_value_keys: Vec<String>,
	pub allowed_text: Vec<String>,
}

impl Default for Whitelists {
	fn default() -> Self {
		let owned = |table: &[&str]| -> Vec<String> {
			table.iter().map(ToString::to_string).collect()
		};
		Self {
			known_prose: owned(KNOWN_PROSE),
			uppercase_keys: owned(UPPERCASE_KEYS),
			long_value_keys: owned(LONG_VALUE_KEYS),
			allowed_text: owned(ALLOWED_TEXT),
		}
	}
}

/// Additional entries from the config file, appended to the built-ins.
///
/// ```yaml
/// whitelists:
///   uppercase_keys: [MY_KEY, "ACME_*"]
///   allowed_text: ["Company confidential"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WhitelistsConfig {
	pub known_prose: Vec<String>,
	pub uppercase_keys: Vec<String>,
	pub long_value_keys: Vec<String>,
	pub allowed_text: Vec<String>,
}

impl Whitelists {
	pub fn with_extensions(extra: &WhitelistsConfig) -> Self {
		let mut tables = Self::default();
		tables.known_prose.extend(extra.known_prose.iter().cloned());
		tables
			.uppercase_keys
			.extend(extra.uppercase_keys.iter().cloned());
		tables
			.long_value_keys
			.extend(extra.long_value_keys.iter().cloned());
		tables.allowed_text.extend(extra.allowed_text.iter().cloned());
		tables
	}

	pub fn is_known_prose(&self, row: &str) -> bool {
		self.known_prose
			.iter()
			.any(|needle| row.contains(needle.as_str()))
	}

	pub fn is_allowed_text(&self, row: &str) -> bool {
		self.allowed_text
			.iter()
			.any(|needle| row.contains(needle.as_str()))
	}

	pub fn is_uppercase_key_allowed(&self, key: &str) -> bool {
		self.uppercase_keys.iter().any(|entry| {
			match entry.strip_suffix('*') {
				Some(prefix) => key.starts_with(prefix),
				None => key == entry,
			}
		})
	}

	pub fn is_long_value_allowed(&self, key: &str, value: &str) -> bool {
		self.long_value_keys.iter().any(|entry| {
			match entry.split_once(": ") {
				Some((entry_key, prefix)) => key == entry_key && value.starts_with(prefix),
				None => key == entry,
			}
		})
	}
}
