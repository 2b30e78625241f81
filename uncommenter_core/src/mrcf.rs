use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::UncommentError;
use crate::UncommentResult;
use crate::path::catalogue_key;

/// Deployment profile that selects among per-flavor defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
	SmallSystem,
	#[default]
	StandardSystem,
	LargeSystem,
}

impl Flavor {
	pub const ALL: [Self; 3] = [Self::SmallSystem, Self::StandardSystem, Self::LargeSystem];

	/// Position in a `small|standard|large` split.
	pub fn index(self) -> usize {
		match self {
			Self::SmallSystem => 0,
			Self::StandardSystem => 1,
			Self::LargeSystem => 2,
		}
	}

	/// Catalogue field holding this flavor's default.
	pub fn catalogue_field(self) -> &'static str {
		match self {
			Self::SmallSystem => "default_small_system_profile",
			Self::StandardSystem => "default_standard_system_profile",
			Self::LargeSystem => "default_large_system_profile",
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::SmallSystem => "small-system",
			Self::StandardSystem => "standard-system",
			Self::LargeSystem => "large-system",
		}
	}
}

impl fmt::Display for Flavor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Flavor {
	type Err = UncommentError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|flavor| flavor.as_str() == s)
			.ok_or_else(|| UncommentError::UnknownFlavor(s.to_string()))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mandatory {
	Yes,
	No,
	Conditional,
}

impl Mandatory {
	pub fn parse(text: &str) -> Option<Self> {
		match text.trim().to_ascii_lowercase().as_str() {
			"mandatory" | "required" | "req" => Some(Self::Yes),
			"optional" | "opt" => Some(Self::No),
			"conditional" => Some(Self::Conditional),
			_ => None,
		}
	}
}

/// Value type declared by a catalogue entry's `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclaredType {
	String,
	Integer,
	Number,
	Boolean,
	Object,
	Array,
}

impl DeclaredType {
	pub fn parse(text: &str) -> Option<Self> {
		match text.trim().to_ascii_lowercase().as_str() {
			"string" => Some(Self::String),
			"integer" => Some(Self::Integer),
			"number" => Some(Self::Number),
			"boolean" => Some(Self::Boolean),
			"object" => Some(Self::Object),
			"array" => Some(Self::Array),
			_ => None,
		}
	}
}

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
	/// Path as written in the catalogue, e.g. `/svc/ports[0]/name`.
	pub path: String,
	/// Normalized key, e.g. `/svc/ports/name`.
	pub key: String,
	pub format: Option<DeclaredType>,
	pub mandatory: Option<Mandatory>,
	pub description: Option<String>,
	pub default: Option<JsonValue>,
	pub recommended_value: Option<JsonValue>,
	pub defaults_per_flavor: BTreeMap<Flavor, JsonValue>,
	pub example: Option<JsonValue>,
}

impl ParameterRecord {
	fn from_json(path: &str, entry: &serde_json::Map<String, JsonValue>) -> Self {
		let present = |field: &str| entry.get(field).filter(|value| !value.is_null()).cloned();
		let text = |field: &str| entry.get(field).and_then(JsonValue::as_str);

		Self {
			path: path.to_string(),
			key: catalogue_key(path),
			format: text("format").and_then(DeclaredType::parse),
			mandatory: text("mandatory").and_then(Mandatory::parse),
			description: text("description").map(ToString::to_string),
			default: present("default"),
			recommended_value: present("recommended_value"),
			defaults_per_flavor: Flavor::ALL
				.into_iter()
				.filter_map(|flavor| present(flavor.catalogue_field()).map(|value| (flavor, value)))
				.collect(),
			example: present("example"),
		}
	}
}

/// The parameter catalogue (MRCF), keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
	records: Vec<ParameterRecord>,
	by_key: HashMap<String, usize>,
	/// Entries skipped while loading.
	warnings: Vec<String>,
}

impl Catalogue {
	pub fn load(path: &Path) -> UncommentResult<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			UncommentError::Catalogue {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		Self::from_json(&content).map_err(|e| {
			match e {
				UncommentError::Catalogue { reason, .. } => {
					UncommentError::Catalogue {
						path: path.display().to_string(),
						reason,
					}
				}
				other => other,
			}
		})
	}

	pub fn from_json(content: &str) -> UncommentResult<Self> {
		let invalid = |reason: String| {
			UncommentError::Catalogue {
				path: "<inline>".to_string(),
				reason,
			}
		};

		let root: JsonValue = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
		let parameters = root
			.get("parameters")
			.and_then(JsonValue::as_array)
			.ok_or_else(|| invalid("missing top-level `parameters` array".to_string()))?;

		let mut catalogue = Self::default();
		for (index, entry) in parameters.iter().enumerate() {
			let Some(entry) = entry.as_object() else {
				catalogue.skip(format!("parameter #{index} is not an object"));
				continue;
			};
			match entry.get("path") {
				Some(JsonValue::String(path)) if !path.trim().is_empty() => {
					catalogue.insert(ParameterRecord::from_json(path, entry));
				}
				Some(other) => {
					catalogue.skip(format!("parameter #{index} has a non-string path `{other}`"));
				}
				None => catalogue.skip(format!("parameter #{index} has no path")),
			}
		}

		tracing::info!(
			parameters = catalogue.records.len(),
			skipped = catalogue.warnings.len(),
			"loaded parameter catalogue"
		);
		Ok(catalogue)
	}

	fn skip(&mut self, reason: String) {
		tracing::warn!("skipping catalogue entry: {reason}");
		self.warnings.push(reason);
	}

	/// Add a record. The first record wins for a normalized key, so sibling
	/// array entries (`[0]`, `[1]`) share the first one's metadata.
	pub fn insert(&mut self, record: ParameterRecord) {
		if self.by_key.contains_key(&record.key) {
			return;
		}
		self.by_key.insert(record.key.clone(), self.records.len());
		self.records.push(record);
	}

	pub fn get(&self, key: &str) -> Option<&ParameterRecord> {
		self.by_key.get(key).map(|index| &self.records[*index])
	}

	pub fn records(&self) -> &[ParameterRecord] {
		&self.records
	}

	pub fn warnings(&self) -> &[String] {
		&self.warnings
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
