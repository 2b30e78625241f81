use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use serde_yaml_ng::Value as YamlValue;

use crate::UncommentError;
use crate::UncommentResult;
use crate::path::catalogue_key;

pub const VALUES_FILE_NAME: &str = "values.yaml";
pub const HELM_TAG: &str = "# [HELM_TAG]";

static TEMPLATE_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{.*?\}\}").expect("valid regex"));

/// Flattened Helm chart values.
#[derive(Debug, Clone, Default)]
pub struct HelmValues {
	/// `/a/b[0]/c` → leaf value, in path order.
	flattened: BTreeMap<String, JsonValue>,
	/// Normalized key (array indices dropped) → first value seen.
	by_key: HashMap<String, JsonValue>,
	warnings: Vec<String>,
}

impl HelmValues {
	/// Load every `values.yaml` under `path`, including those packed in
	/// `.tgz` chart archives. `path` may also name a single values file or
	/// archive.
	pub fn load(path: &Path) -> UncommentResult<Self> {
		let mut values = Self::default();
		let mut sources = Vec::new();

		if path.is_dir() {
			let mut visited_dirs = HashSet::new();
			walk_dir(path, &mut sources, &mut visited_dirs)?;
			sources.sort();
		} else if path.is_file() {
			sources.push(path.to_path_buf());
		} else {
			return Err(UncommentError::HelmValues {
				path: path.display().to_string(),
				reason: "no such file or directory".to_string(),
			});
		}

		for source in &sources {
			if is_archive(source) {
				for (name, content) in read_archive(source)? {
					values.add_document(&format!("{}!{name}", source.display()), &content);
				}
			} else {
				let content = std::fs::read_to_string(source).map_err(|e| {
					UncommentError::HelmValues {
						path: source.display().to_string(),
						reason: e.to_string(),
					}
				})?;
				values.add_document(&source.display().to_string(), &content);
			}
		}

		tracing::info!(
			sources = sources.len(),
			values = values.flattened.len(),
			"loaded helm values"
		);
		Ok(values)
	}

	/// Parse one `values.yaml` document and merge its leaves. Earlier
	/// documents win on conflicting paths.
	pub fn add_document(&mut self, origin: &str, content: &str) {
		let content = TEMPLATE_TAG.replace_all(content, HELM_TAG);
		let document: YamlValue = match serde_yaml_ng::from_str(&content) {
			Ok(document) => document,
			Err(e) => {
				let reason = format!("skipping unparseable helm values `{origin}`: {e}");
				tracing::warn!("{reason}");
				self.warnings.push(reason);
				return;
			}
		};

		let mut leaves = Vec::new();
		flatten(&document, String::new(), &mut leaves);
		for (path, value) in leaves {
			self.by_key
				.entry(catalogue_key(&path))
				.or_insert_with(|| value.clone());
			self.flattened.entry(path).or_insert(value);
		}
	}

	/// Value for a normalized key such as `/svc/ports/name`.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.by_key.get(key)
	}

	pub fn flattened(&self) -> &BTreeMap<String, JsonValue> {
		&self.flattened
	}

	pub fn warnings(&self) -> &[String] {
		&self.warnings
	}

	pub fn len(&self) -> usize {
		self.flattened.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flattened.is_empty()
	}
}

fn flatten(value: &YamlValue, prefix: String, leaves: &mut Vec<(String, JsonValue)>) {
	match value {
		YamlValue::Mapping(mapping) if !mapping.is_empty() => {
			for (key, child) in mapping {
				let Some(key) = scalar_key(key) else {
					continue;
				};
				flatten(child, format!("{prefix}/{key}"), leaves);
			}
		}
		YamlValue::Sequence(items) if !items.is_empty() => {
			for (index, child) in items.iter().enumerate() {
				flatten(child, format!("{prefix}[{index}]"), leaves);
			}
		}
		YamlValue::Tagged(tagged) => flatten(&tagged.value, prefix, leaves),
		leaf if !prefix.is_empty() => leaves.push((prefix, to_json(leaf))),
		_ => {}
	}
}

fn scalar_key(key: &YamlValue) -> Option<String> {
	match key {
		YamlValue::String(s) => Some(s.clone()),
		YamlValue::Bool(b) => Some(b.to_string()),
		YamlValue::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn to_json(value: &YamlValue) -> JsonValue {
	match value {
		YamlValue::Null => JsonValue::Null,
		YamlValue::Bool(b) => JsonValue::Bool(*b),
		YamlValue::Number(n) => {
			if let Some(i) = n.as_i64() {
				JsonValue::from(i)
			} else if let Some(u) = n.as_u64() {
				JsonValue::from(u)
			} else {
				n.as_f64().map_or(JsonValue::Null, JsonValue::from)
			}
		}
		YamlValue::String(s) => JsonValue::String(s.clone()),
		YamlValue::Sequence(_) => JsonValue::Array(Vec::new()),
		YamlValue::Mapping(_) => JsonValue::Object(serde_json::Map::new()),
		YamlValue::Tagged(tagged) => to_json(&tagged.value),
	}
}

fn is_archive(path: &Path) -> bool {
	path.extension().is_some_and(|extension| extension == "tgz")
}

fn is_values_file(path: &Path) -> bool {
	path.file_name().is_some_and(|name| name == VALUES_FILE_NAME)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "templates" || name == "node_modules"
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, visited_dirs: &mut HashSet<PathBuf>) -> UncommentResult<()> {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(UncommentError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_dir() {
			if path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(is_ignored_directory_name)
			{
				continue;
			}
			walk_dir(&path, files, visited_dirs)?;
		} else if is_values_file(&path) || is_archive(&path) {
			files.push(path);
		}
	}

	Ok(())
}

/// `values.yaml` entries of a gzipped chart archive, as `(entry path, text)`.
fn read_archive(path: &Path) -> UncommentResult<Vec<(String, String)>> {
	let invalid = |e: std::io::Error| {
		UncommentError::HelmValues {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	};

	let file = std::fs::File::open(path).map_err(invalid)?;
	let gz = flate2::read::GzDecoder::new(file);
	let mut archive = tar::Archive::new(gz);
	let mut documents = Vec::new();

	for entry in archive.entries().map_err(invalid)? {
		let mut entry = entry.map_err(invalid)?;
		let entry_path = entry.path().map_err(invalid)?.into_owned();
		if !is_values_file(&entry_path) {
			continue;
		}
		let mut content = String::new();
		entry.read_to_string(&mut content).map_err(invalid)?;
		documents.push((entry_path.display().to_string(), content));
	}

	Ok(documents)
}
