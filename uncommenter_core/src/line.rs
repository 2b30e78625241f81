use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Marker wrapping rows that stages 2–4 must pass through untouched.
pub const SENTINEL: &str = "@@@";

/// Stand-in shown to the oracle for rows it must not see.
pub const COMMENT_MASK: &str = "#";

static MAPPING_KEY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"^(?P<dash>-\s+)?(?P<key>"[^"]*"|'[^']*'|[^\s#'"\[\]{},&*!|>%@`-][^#]*?|-[^\s#][^#]*?)\s*:(?:\s+(?P<value>.*))?$"#,
	)
	.expect("valid regex")
});

/// Where a stage-3 row came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineOrigin {
	/// The row started with `#` in the input document.
	pub was_commented: bool,
	/// The row was sentinel-wrapped by the preprocessor.
	pub opaque: bool,
}

/// A row of the document after folding, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocLine {
	pub text: String,
	pub origin: LineOrigin,
}

impl DocLine {
	pub fn new(text: impl Into<String>, origin: LineOrigin) -> Self {
		Self {
			text: text.into(),
			origin,
		}
	}
}

/// Render rows back into a newline-terminated document.
pub fn render_lines<S: AsRef<str>>(lines: &[S]) -> String {
	let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
	for line in lines {
		out.push_str(line.as_ref());
		out.push('\n');
	}
	out
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

pub fn wrap_sentinel(text: &str) -> String {
	format!("{SENTINEL}{text}{SENTINEL}")
}

pub fn is_sentinel(row: &str) -> bool {
	row.len() >= SENTINEL.len() * 2 && row.starts_with(SENTINEL) && row.ends_with(SENTINEL)
}

/// Remove one layer of sentinel tags; rows without tags are returned as is.
pub fn strip_sentinel(row: &str) -> &str {
	if is_sentinel(row) {
		&row[SENTINEL.len()..row.len() - SENTINEL.len()]
	} else {
		row
	}
}

/// Count of leading whitespace columns, expanding tabs to two columns.
pub fn leading_columns(text: &str) -> usize {
	text.chars()
		.take_while(|c| *c == ' ' || *c == '\t')
		.map(|c| if c == '\t' { 2 } else { 1 })
		.sum()
}

/// Effective indent: a leading `-` list marker adds two columns.
pub fn indent_level(text: &str) -> usize {
	let columns = leading_columns(text);
	if text.trim_start().starts_with('-') && !text.trim_start().starts_with("---") {
		columns + 2
	} else {
		columns
	}
}

pub fn is_blank(text: &str) -> bool {
	text.trim().is_empty()
}

pub fn is_comment(text: &str) -> bool {
	text.trim_start().starts_with('#')
}

/// A comment made only of `#` characters and whitespace.
pub fn is_comment_only(text: &str) -> bool {
	is_comment(text) && text.chars().all(|c| c == '#' || c.is_whitespace())
}

/// Remove the first run of `#` characters from a commented row.
///
/// When the hashes sat on an even column and their removal leaves the text on
/// an odd one, the separator space after the hashes is dropped (`# key`
/// convention) or, when there is none, a space is prepended.
pub fn uncomment(row: &str) -> String {
	if !is_comment(row) {
		return row.to_string();
	}

	let hash_at = row.len() - row.trim_start().len();
	let prefix = &row[..hash_at];
	let rest = row[hash_at..].trim_start_matches('#');
	let hash_column = leading_columns(prefix);
	let text = format!("{prefix}{rest}");

	if hash_column % 2 == 0 && leading_columns(&text) % 2 == 1 {
		return match rest.strip_prefix(' ') {
			Some(stripped) => format!("{prefix}{stripped}"),
			None => format!(" {text}"),
		};
	}

	text
}

/// Comment a data row out, keeping its indentation, and annotate why.
pub fn comment_out(row: &str, annotation: &str) -> String {
	let content = row.trim_start();
	let indent = &row[..row.len() - content.len()];
	format!("{indent}# {content} # {annotation}")
}

/// Replace the leading whitespace of `text` with `columns` spaces.
pub fn set_leading_columns(text: &str, columns: usize) -> String {
	let content = text.trim_start_matches([' ', '\t']);
	format!("{}{content}", " ".repeat(columns))
}

/// Net count of opening minus closing brackets outside double-quoted strings.
pub fn bracket_delta(text: &str) -> i32 {
	let mut delta = 0;
	let mut in_string = false;
	let mut escaped = false;

	for c in text.chars() {
		if in_string {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {}
			}
			continue;
		}

		match c {
			'"' => in_string = true,
			'{' | '[' => delta += 1,
			'}' | ']' => delta -= 1,
			_ => {}
		}
	}

	delta
}

/// The parts of a `key: value` or `- key: value` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
	/// Width of the `- ` list marker, 0 when absent.
	pub dash: usize,
	/// Key with surrounding quotes removed.
	pub key: &'a str,
	pub value: Option<&'a str>,
	/// Byte offset of `value` in the row.
	pub value_offset: usize,
}

/// Split a mapping row into marker, key and value.
pub fn key_value(text: &str) -> Option<KeyValue<'_>> {
	let body = text.trim_start();
	let offset = text.len() - body.len();
	let captures = MAPPING_KEY.captures(body)?;
	let key = captures.name("key")?.as_str();
	let value = captures.name("value");

	Some(KeyValue {
		dash: captures.name("dash").map_or(0, |dash| dash.as_str().len()),
		key: unquote(key),
		value: value.map(|value| value.as_str()),
		value_offset: value.map_or(text.len(), |value| offset + value.start()),
	})
}

fn unquote(key: &str) -> &str {
	key.strip_prefix('"')
		.and_then(|k| k.strip_suffix('"'))
		.or_else(|| key.strip_prefix('\'').and_then(|k| k.strip_suffix('\'')))
		.unwrap_or(key)
}
