use std::sync::LazyLock;

use regex::Regex;

use crate::line::bracket_delta;
use crate::line::indent_level;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::leading_columns;
use crate::line::normalize_line_endings;
use crate::line::uncomment;
use crate::line::wrap_sentinel;
use crate::whitelist::PROSE_ROWS;
use crate::whitelist::Whitelists;

/// Synthetic first row so the reverse scan always ends on a comment.
pub const HEAD_ROW: &str = "#";

static JSON_OPENER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^#\s*\{$").expect("valid regex"));
static JVM_PROPERTY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?:^|[\s"'])-D[\w.]"#).expect("valid regex"));
static BLOCK_SCALAR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(?:-\s+)?(?:[^#\s][^#]*?:\s+|-\s+)?[|>][-+0-9]*\s*(?:#.*)?$")
		.expect("valid regex")
});

const EMPTY_DEPLOYMENT: &str = "Deployment: {}";

/// What the rows following the current one belong to.
enum Region {
	Yaml,
	/// A commented JSON object being un-commented; `depth` is the open brace
	/// count.
	Json { depth: i32 },
	/// Body of a literal or folded block scalar owned by a key at `indent`.
	BlockScalar { indent: usize },
	/// Continuation of a flow collection left open at end of line.
	Flow { depth: i32 },
}

/// Stage 1: sentinel-tag rows that are not YAML and prepend the head row.
///
/// The output has exactly one more row than the input and always ends with a
/// newline. Row `n` of the output is row `n` of the input (1-indexed).
pub fn preprocess(input: &str, whitelists: &Whitelists) -> String {
	let normalized = normalize_line_endings(input);
	let mut out = String::with_capacity(normalized.len() + normalized.len() / 8 + 4);
	out.push_str(HEAD_ROW);
	out.push('\n');

	let mut region = Region::Yaml;
	for raw in normalized.lines() {
		let line = raw.trim_end();
		let row = preprocess_row(line, &mut region, whitelists);
		out.push_str(&row);
		out.push('\n');
	}

	out
}

fn preprocess_row(line: &str, region: &mut Region, whitelists: &Whitelists) -> String {
	match region {
		Region::Json { depth } => {
			if is_blank(line) || is_comment(line) {
				let text = uncomment_json(line);
				*depth += bracket_delta(&text);
				if *depth <= 0 {
					*region = Region::Yaml;
				}
				return wrap_sentinel(&text);
			}
			// Data before the object closed: the comment block ended early.
			*region = Region::Yaml;
		}
		Region::BlockScalar { indent } => {
			if is_blank(line) || leading_columns(line) > *indent {
				return wrap_sentinel(line);
			}
			*region = Region::Yaml;
		}
		Region::Flow { depth } => {
			*depth += bracket_delta(line);
			if *depth <= 0 {
				*region = Region::Yaml;
			}
			return wrap_sentinel(line);
		}
		Region::Yaml => {}
	}

	let trimmed = line.trim();

	if JSON_OPENER.is_match(trimmed) {
		let text = uncomment_json(line);
		*region = Region::Json {
			depth: bracket_delta(&text).max(1),
		};
		return wrap_sentinel(&text);
	}

	if is_known_prose(line, trimmed, whitelists) {
		open_flow_region(line, region);
		return wrap_sentinel(line);
	}

	if line.contains(EMPTY_DEPLOYMENT) {
		return wrap_sentinel(&line.replacen(": {}", "", 1));
	}

	if !is_comment(line) {
		if BLOCK_SCALAR_HEADER.is_match(line) {
			*region = Region::BlockScalar {
				indent: block_scalar_owner_indent(line),
			};
		} else if open_flow_region(line, region) {
			// An unclosed opener never loads on its own.
			return wrap_sentinel(line);
		}
	}

	line.to_string()
}

fn is_known_prose(line: &str, trimmed: &str, whitelists: &Whitelists) -> bool {
	whitelists.is_known_prose(line)
		|| JVM_PROPERTY.is_match(line)
		|| PROSE_ROWS.contains(&trimmed)
		|| line.matches('"').count() == 1
}

/// Enter a flow region when `line` leaves a collection open. Returns whether
/// one was entered.
fn open_flow_region(line: &str, region: &mut Region) -> bool {
	if is_comment(line) {
		return false;
	}
	let depth = bracket_delta(strip_trailing_comment(line));
	if depth > 0 {
		*region = Region::Flow { depth };
	}
	depth > 0
}

/// Column a block scalar body must exceed: the owning key, or the dash for a
/// bare `- |` item.
fn block_scalar_owner_indent(line: &str) -> usize {
	let trimmed = line.trim_start();
	match trimmed.strip_prefix('-') {
		Some(rest) if !rest.trim_start().starts_with(['|', '>']) => indent_level(line),
		_ => leading_columns(line),
	}
}

fn uncomment_json(line: &str) -> String {
	let text = uncomment(line);
	if leading_columns(&text) % 2 == 1 {
		text.replacen(' ', "", 1)
	} else {
		text
	}
}

fn strip_trailing_comment(line: &str) -> &str {
	line.find(" #").map_or(line, |index| &line[..index])
}
