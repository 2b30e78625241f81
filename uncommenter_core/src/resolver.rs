use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::UncommentError;
use crate::helm::HelmValues;
use crate::line::DocLine;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::key_value;
use crate::line::leading_columns;
use crate::mrcf::Catalogue;
use crate::mrcf::Flavor;
use crate::mrcf::ParameterRecord;
use crate::path::Path;
use crate::path::PathToken;
use crate::path::reference_key;
use crate::structure::NodeId;
use crate::structure::Source;
use crate::structure::StructureTree;
use crate::trace::DecisionKind;
use crate::trace::Trace;

static PLACEHOLDER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*\{\{\s*(.*?)\s*\}\}\s*$").expect("valid regex"));

/// Minimum score for an ancestor frame to adopt a key.
const MIN_SCORE: f64 = 0.5;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueSource {
	#[serde(rename = "mrcf.recommended_value")]
	MrcfRecommendedValue,
	#[serde(rename = "mrcf.defaults_per_flavor")]
	MrcfDefaultsPerFlavor,
	#[serde(rename = "mrcf.default")]
	MrcfDefault,
	#[serde(rename = "yaml.defaults_per_flavor")]
	YamlDefaultsPerFlavor,
	#[serde(rename = "helm.default")]
	HelmDefault,
	#[serde(rename = "mrcf.example")]
	MrcfExample,
}

impl ValueSource {
	/// Default consultation order.
	pub const DEFAULT_PRIORITY: [Self; 6] = [
		Self::MrcfRecommendedValue,
		Self::MrcfDefaultsPerFlavor,
		Self::MrcfDefault,
		Self::YamlDefaultsPerFlavor,
		Self::HelmDefault,
		Self::MrcfExample,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::MrcfRecommendedValue => "mrcf.recommended_value",
			Self::MrcfDefaultsPerFlavor => "mrcf.defaults_per_flavor",
			Self::MrcfDefault => "mrcf.default",
			Self::YamlDefaultsPerFlavor => "yaml.defaults_per_flavor",
			Self::HelmDefault => "helm.default",
			Self::MrcfExample => "mrcf.example",
		}
	}
}

impl fmt::Display for ValueSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ValueSource {
	type Err = UncommentError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// `mrcf.defaults_per_flavor[flavor]` is accepted as an alias.
		let name = s.trim().trim_end_matches("[flavor]");
		Self::DEFAULT_PRIORITY
			.into_iter()
			.find(|source| source.as_str() == name)
			.ok_or_else(|| UncommentError::UnknownSource(s.to_string()))
	}
}

/// Counts for a resolver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
	pub resolved: usize,
	pub unresolved: usize,
}

/// A level of the context stack.
#[derive(Debug, Clone)]
struct Frame {
	/// Key column; `None` for the root frame.
	indent: Option<usize>,
	path: Path,
	node: NodeId,
}

/// Stage 5: replace `{{ … }}` placeholders with values from the catalogue,
/// the Helm values, or the placeholder's own per-flavor defaults.
pub struct ValueResolver<'a> {
	tree: StructureTree,
	catalogue: Option<&'a Catalogue>,
	helm: Option<&'a HelmValues>,
	flavor: Flavor,
	priority: &'a [ValueSource],
}

impl<'a> ValueResolver<'a> {
	pub fn new(
		catalogue: Option<&'a Catalogue>,
		helm: Option<&'a HelmValues>,
		flavor: Flavor,
		priority: &'a [ValueSource],
	) -> Self {
		Self {
			tree: StructureTree::from_sources(catalogue, helm),
			catalogue,
			helm,
			flavor,
			priority,
		}
	}

	/// The structure tree, including dynamic nodes added while resolving.
	pub fn tree(&self) -> &StructureTree {
		&self.tree
	}

	pub fn resolve(&mut self, lines: &mut [DocLine], trace: &mut Trace) -> ResolveSummary {
		let mut summary = ResolveSummary::default();
		let mut frames = vec![Frame {
			indent: None,
			path: Path::root(),
			node: self.tree.root(),
		}];
		let mut block_scalar_owner: Option<usize> = None;

		for (index, line) in lines.iter_mut().enumerate() {
			if line.origin.opaque || is_blank(&line.text) || is_comment(&line.text) {
				continue;
			}

			let columns = leading_columns(&line.text);
			if let Some(owner) = block_scalar_owner {
				if columns > owner {
					continue;
				}
				block_scalar_owner = None;
			}

			let Some(entry) = key_value(&line.text) else {
				continue;
			};

			if entry.dash > 0 {
				self.push_array_element(&mut frames, columns);
			}

			let key_indent = columns + entry.dash;
			let frame = self.resolve_path(&mut frames, key_indent, entry.key);
			let path = frame.path.clone();
			let node = frame.node;
			frames.push(frame);

			let Some(value) = entry.value else {
				continue;
			};
			if value.starts_with(['|', '>']) {
				block_scalar_owner = Some(columns);
				continue;
			}
			let (value, comment) = split_trailing_comment(value);
			let Some(captures) = PLACEHOLDER.captures(value) else {
				continue;
			};

			let body = captures.get(1).map_or("", |body| body.as_str());
			let line_no = index + 1;
			match self.choose_value(body, &path, line_no, trace) {
				Some((source, chosen)) => {
					let original = value.to_string();
					let rendered = render_scalar(&chosen);
					line.text = format!("{}{rendered}{comment}", &line.text[..entry.value_offset]);
					self.tree.touch(node);
					trace.record(
						line_no,
						DecisionKind::ValueResolved {
							path: path.to_string(),
							source,
							rendered,
						},
						original,
					);
					summary.resolved += 1;
				}
				None => {
					trace.warn(
						line_no,
						format!("no value found for `{path}`; placeholder `{value}` left in place"),
					);
					summary.unresolved += 1;
				}
			}
		}

		tracing::info!(
			resolved = summary.resolved,
			unresolved = summary.unresolved,
			"resolved placeholders"
		);
		summary
	}

	/// A `- ` marker opens an array element under the frame that owns the
	/// list.
	fn push_array_element(&mut self, frames: &mut Vec<Frame>, dash_column: usize) {
		frames.truncate(retained_frames(frames, dash_column));
		let Some(parent) = frames.last() else {
			return;
		};

		let element = self.tree.insert_child(parent.node, PathToken::AnyIndex, None);
		let path = parent.path.child(PathToken::AnyIndex);
		frames.push(Frame {
			indent: Some(dash_column),
			path,
			node: element,
		});
	}

	/// Backtracking path resolution: pick the ancestor frame that best explains
	/// `key`, drop the frames below it and return the new frame for `key`.
	fn resolve_path(&mut self, frames: &mut Vec<Frame>, indent: usize, key: &str) -> Frame {
		frames.truncate(retained_frames(frames, indent));

		let mut best: Option<(usize, f64, Path, NodeId)> = None;
		for (position, frame) in frames.iter().enumerate().rev() {
			let direct = self.tree.child_key(frame.node, key);
			let through_array = self
				.tree
				.array_child(frame.node)
				.and_then(|element| self.tree.child_key(element, key));

			let (path, node) = match (direct, through_array) {
				(Some(node), _) => (frame.path.child(PathToken::key(key)), node),
				(None, Some(node)) => {
					(
						frame
							.path
							.child(PathToken::AnyIndex)
							.child(PathToken::key(key)),
						node,
					)
				}
				(None, None) => continue,
			};

			let score = self.score(frame.node, node, direct.is_some(), through_array.is_some());
			if score >= MIN_SCORE && best.as_ref().is_none_or(|(_, best_score, ..)| score > *best_score) {
				best = Some((position, score, path, node));
			}
		}

		if let Some((position, score, path, node)) = best {
			tracing::trace!(%path, score, "matched known key");
			frames.truncate(position + 1);
			self.tree.touch(node);
			return Frame {
				indent: Some(indent),
				path,
				node,
			};
		}

		// Unknown key: it belongs to the innermost frame.
		let parent = frames
			.last()
			.cloned()
			.unwrap_or_else(|| {
				Frame {
					indent: None,
					path: Path::root(),
					node: self.tree.root(),
				}
			});
		let node = self.tree.insert_child(parent.node, PathToken::key(key), None);
		Frame {
			indent: Some(indent),
			path: parent.path.child(PathToken::key(key)),
			node,
		}
	}

	fn score(&self, parent: NodeId, child: NodeId, direct: bool, array: bool) -> f64 {
		let parent_node = self.tree.node(parent);
		let child_node = self.tree.node(child);
		let consistent = parent == self.tree.root()
			|| child_node.source == Some(Source::Both)
			|| child_node.source == parent_node.source;

		MIN_SCORE
			+ if direct { 0.4 } else { 0.0 }
			+ if array { 0.3 } else { 0.0 }
			+ if consistent { 0.1 } else { 0.0 }
			+ (f64::from(child_node.usage_count) * 0.02).min(0.2)
	}

	fn choose_value(
		&self,
		body: &str,
		path: &Path,
		line_no: usize,
		trace: &mut Trace,
	) -> Option<(ValueSource, JsonValue)> {
		let key = reference_key(body).unwrap_or_else(|| path.catalogue_key());
		let record = self.catalogue.and_then(|catalogue| catalogue.get(&key));

		if self.catalogue.is_some() && record.is_none() {
			trace.warn(line_no, format!("Cannot find path {key}, please check manually"));
		}

		self.priority.iter().find_map(|source| {
			self.lookup(*source, record, &key, body)
				.map(|value| (*source, value))
		})
	}

	fn lookup(
		&self,
		source: ValueSource,
		record: Option<&ParameterRecord>,
		key: &str,
		body: &str,
	) -> Option<JsonValue> {
		match source {
			ValueSource::MrcfRecommendedValue => record?.recommended_value.clone(),
			ValueSource::MrcfDefaultsPerFlavor => {
				record?.defaults_per_flavor.get(&self.flavor).cloned()
			}
			ValueSource::MrcfDefault => record?.default.clone(),
			ValueSource::YamlDefaultsPerFlavor => flavor_default(body, self.flavor),
			ValueSource::HelmDefault => {
				self.helm?
					.get(key)
					.filter(|value| !value.is_null())
					.cloned()
			}
			ValueSource::MrcfExample => record?.example.clone(),
		}
	}
}

/// How many frames survive a row at `indent`: those with a smaller indent.
fn retained_frames(frames: &[Frame], indent: usize) -> usize {
	frames
		.iter()
		.position(|frame| frame.indent.is_some_and(|frame_indent| frame_indent >= indent))
		.unwrap_or(frames.len())
}

/// Pick the flavor's segment of a `small|standard|large` placeholder body.
/// Bodies without `|` have no per-flavor defaults.
pub fn flavor_default(body: &str, flavor: Flavor) -> Option<JsonValue> {
	if !body.contains('|') {
		return None;
	}

	let segments: Vec<&str> = body.splitn(3, '|').collect();
	let segment = segments
		.get(flavor.index())
		.or_else(|| segments.get(Flavor::StandardSystem.index()))
		.or_else(|| segments.first())?;

	coerce_scalar(segment)
}

/// Interpret placeholder text as a YAML scalar. Quoted text stays a string;
/// empty text yields nothing.
pub fn coerce_scalar(text: &str) -> Option<JsonValue> {
	let text = text.trim();
	if text.is_empty() {
		return None;
	}

	if let Some(inner) = strip_quotes(text) {
		return Some(JsonValue::String(inner.to_string()));
	}

	let value = match text {
		"null" | "Null" | "NULL" | "~" => JsonValue::Null,
		"true" | "True" | "TRUE" => JsonValue::Bool(true),
		"false" | "False" | "FALSE" => JsonValue::Bool(false),
		_ => {
			if let Ok(integer) = text.parse::<i64>() {
				JsonValue::from(integer)
			} else if let Some(number) = text
				.parse::<f64>()
				.ok()
				.filter(|float| float.is_finite() && text.contains(|c: char| c.is_ascii_digit()))
				.and_then(serde_json::Number::from_f64)
			{
				JsonValue::Number(number)
			} else {
				JsonValue::String(text.to_string())
			}
		}
	};

	Some(value)
}

fn strip_quotes(text: &str) -> Option<&str> {
	if text.len() < 2 {
		return None;
	}
	text.strip_prefix('"')
		.and_then(|t| t.strip_suffix('"'))
		.or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
}

/// Split `{{ … }}  # note` into the value and the trailing comment with its
/// leading whitespace. A `#` counts only after the closing braces and after
/// whitespace.
fn split_trailing_comment(value: &str) -> (&str, &str) {
	let search_from = value.rfind("}}").map_or(0, |end| end + 2);
	let hash = value[search_from..]
		.char_indices()
		.find(|(offset, c)| {
			*c == '#'
				&& value[..search_from + offset]
					.chars()
					.next_back()
					.is_some_and(char::is_whitespace)
		})
		.map(|(offset, _)| search_from + offset);

	match hash {
		Some(at) => {
			let kept = value[..at].trim_end().len();
			(&value[..kept], &value[kept..])
		}
		None => (value, ""),
	}
}

/// Render a chosen value as a YAML scalar. Strings are always double-quoted;
/// collections render as JSON flow collections.
pub fn render_scalar(value: &JsonValue) -> String {
	match value {
		JsonValue::Null => "null".to_string(),
		JsonValue::Bool(b) => b.to_string(),
		JsonValue::Number(n) => n.to_string(),
		JsonValue::String(s) => {
			let inner = strip_quotes(s).unwrap_or(s);
			let escaped = inner.replace('\\', "\\\\").replace('"', "\\\"");
			format!("\"{escaped}\"")
		}
		JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
	}
}
