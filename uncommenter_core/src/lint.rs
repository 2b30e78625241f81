use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_yaml_ng::Value;

use crate::UncommentError;
use crate::UncommentResult;
use crate::line::bracket_delta;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::key_value;
use crate::line::leading_columns;
use crate::loader::load;

pub const RULE_SYNTAX: &str = "syntax";
pub const RULE_KEY_DUPLICATES: &str = "key-duplicates";
pub const RULE_INDENTATION: &str = "indentation";
pub const RULE_LINE_LENGTH: &str = "line-length";

/// Lint configuration used when none is supplied.
pub const DEFAULT_LINT_CONFIG: &str = "\
rules:
  indentation: {spaces: 2, indent-sequences: whatever}
  key-duplicates: enable
  line-length: {max: 80}
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
	Warning,
	Error,
}

impl fmt::Display for LintLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// A single linter diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintProblem {
	/// 1-indexed.
	pub line: usize,
	/// 1-indexed.
	pub column: usize,
	pub rule: String,
	pub level: LintLevel,
	pub message: String,
}

impl fmt::Display for LintProblem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{}: [{}] {} ({})",
			self.line, self.column, self.level, self.message, self.rule
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentationRule {
	pub spaces: usize,
	pub level: LintLevel,
}

impl Default for IndentationRule {
	fn default() -> Self {
		Self {
			spaces: 2,
			level: LintLevel::Error,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLengthRule {
	pub max: usize,
	pub allow_non_breakable_words: bool,
	pub level: LintLevel,
}

impl Default for LineLengthRule {
	fn default() -> Self {
		Self {
			max: 80,
			allow_non_breakable_words: true,
			level: LintLevel::Error,
		}
	}
}

/// Enabled rules and their options. `None` means the rule is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
	pub indentation: Option<IndentationRule>,
	pub key_duplicates: Option<LintLevel>,
	pub line_length: Option<LineLengthRule>,
}

impl Default for LintConfig {
	fn default() -> Self {
		Self {
			indentation: Some(IndentationRule::default()),
			key_duplicates: Some(LintLevel::Error),
			line_length: Some(LineLengthRule::default()),
		}
	}
}

impl LintConfig {
	/// Parse yamllint-style configuration text. Rules that are not mentioned
	/// keep their defaults; unknown rules are ignored.
	pub fn parse(text: &str) -> UncommentResult<Self> {
		let root: Value =
			serde_yaml_ng::from_str(text).map_err(|e| UncommentError::LintConfig(e.to_string()))?;
		let mut config = Self::default();

		let rules = match root.get("rules") {
			None | Some(Value::Null) => return Ok(config),
			Some(Value::Mapping(rules)) => rules,
			Some(_) => {
				return Err(UncommentError::LintConfig(
					"`rules` must be a mapping".to_string(),
				));
			}
		};

		for (name, options) in rules {
			let Some(name) = name.as_str() else {
				continue;
			};

			match name {
				RULE_INDENTATION => {
					config.indentation = rule_options(name, options)?.map(|options| {
						let spaces = options
							.and_then(|o| o.get("spaces"))
							.and_then(Value::as_u64)
							.map_or(2, |spaces| spaces as usize);
						IndentationRule {
							spaces: spaces.max(1),
							level: level_of(options),
						}
					});
				}
				RULE_KEY_DUPLICATES => {
					config.key_duplicates = rule_options(name, options)?.map(level_of);
				}
				RULE_LINE_LENGTH => {
					config.line_length = rule_options(name, options)?.map(|options| {
						let defaults = LineLengthRule::default();
						LineLengthRule {
							max: options
								.and_then(|o| o.get("max"))
								.and_then(Value::as_u64)
								.map_or(defaults.max, |max| max as usize),
							allow_non_breakable_words: options
								.and_then(|o| o.get("allow-non-breakable-words"))
								.and_then(Value::as_bool)
								.unwrap_or(defaults.allow_non_breakable_words),
							level: level_of(options),
						}
					});
				}
				_ => {}
			}
		}

		Ok(config)
	}
}

/// `Ok(None)` for a disabled rule, `Ok(Some(None))` for a bare `enable`,
/// `Ok(Some(Some(map)))` for a rule with options.
fn rule_options<'v>(name: &str, options: &'v Value) -> UncommentResult<Option<Option<&'v Value>>> {
	match options {
		Value::String(toggle) if toggle == "disable" => Ok(None),
		Value::String(toggle) if toggle == "enable" => Ok(Some(None)),
		Value::Bool(false) => Ok(None),
		Value::Bool(true) | Value::Null => Ok(Some(None)),
		Value::Mapping(_) => Ok(Some(Some(options))),
		other => {
			Err(UncommentError::LintConfig(format!(
				"rule `{name}` must be `enable`, `disable` or a mapping, found `{other:?}`"
			)))
		}
	}
}

fn level_of(options: Option<&Value>) -> LintLevel {
	match options.and_then(|o| o.get("level")).and_then(Value::as_str) {
		Some("warning") => LintLevel::Warning,
		_ => LintLevel::Error,
	}
}

/// A linter consulted by the repair loop.
pub trait Linter {
	fn run(&self, text: &str, config: &LintConfig) -> Vec<LintProblem>;
}

/// Built-in linter covering the rules the repair loop acts on.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLinter;

impl Linter for YamlLinter {
	fn run(&self, text: &str, config: &LintConfig) -> Vec<LintProblem> {
		let mut problems = Vec::new();

		if let Err(e) = load(text) {
			let (line, column) = e
				.location()
				.map_or((1, 1), |location| (location.line(), location.column()));
			problems.push(LintProblem {
				line,
				column,
				rule: RULE_SYNTAX.to_string(),
				level: LintLevel::Error,
				message: e.to_string(),
			});
		}

		let rows = structural_rows(text);

		if let Some(level) = config.key_duplicates {
			check_key_duplicates(&rows, level, &mut problems);
		}
		if let Some(rule) = &config.indentation {
			check_indentation(&rows, rule, &mut problems);
		}
		if let Some(rule) = &config.line_length {
			check_line_length(text, rule, &mut problems);
		}

		problems.sort_by_key(|problem| (problem.line, problem.column));
		problems
	}
}

/// A data row outside block-scalar bodies and flow continuations.
struct StructuralRow<'a> {
	/// 1-indexed.
	line: usize,
	text: &'a str,
	columns: usize,
}

fn structural_rows(text: &str) -> Vec<StructuralRow<'_>> {
	let mut rows = Vec::new();
	let mut block_scalar_owner: Option<usize> = None;
	let mut flow_depth = 0;

	for (index, text) in text.lines().enumerate() {
		if is_blank(text) {
			continue;
		}
		let columns = leading_columns(text);

		if let Some(owner) = block_scalar_owner {
			if columns > owner {
				continue;
			}
			block_scalar_owner = None;
		}
		if flow_depth > 0 {
			flow_depth += bracket_delta(text);
			continue;
		}
		if is_comment(text) {
			continue;
		}

		let body = strip_trailing_comment(text.trim());
		let value = key_value(body).and_then(|row| row.value).unwrap_or(body);
		if value.starts_with(['|', '>']) {
			block_scalar_owner = Some(columns);
		} else {
			flow_depth = bracket_delta(value).max(0);
		}

		rows.push(StructuralRow {
			line: index + 1,
			text,
			columns,
		});
	}

	rows
}

fn strip_trailing_comment(text: &str) -> &str {
	text.find(" #").map_or(text, |index| text[..index].trim_end())
}

fn check_key_duplicates(rows: &[StructuralRow<'_>], level: LintLevel, problems: &mut Vec<LintProblem>) {
	// Open mappings, innermost last: key column and keys seen so far.
	let mut scopes: Vec<(usize, HashSet<String>)> = Vec::new();

	for row in rows {
		let trimmed = row.text.trim();
		if trimmed == "---" || trimmed == "..." {
			scopes.clear();
			continue;
		}

		let Some(entry) = key_value(strip_trailing_comment(trimmed)) else {
			// Scalar list item or continuation; it closes deeper mappings.
			scopes.retain(|(scope_column, _)| *scope_column <= row.columns);
			continue;
		};

		let key_column = row.columns + entry.dash;
		let key = entry.key;

		// A list marker starts a fresh mapping at its key column.
		scopes.retain(|(scope_column, _)| {
			*scope_column < key_column || (entry.dash == 0 && *scope_column == key_column)
		});

		match scopes.last_mut() {
			Some((scope_column, keys)) if *scope_column == key_column => {
				if !keys.insert(key.to_string()) {
					problems.push(LintProblem {
						line: row.line,
						column: key_column + 1,
						rule: RULE_KEY_DUPLICATES.to_string(),
						level,
						message: format!("duplication of key \"{key}\" in mapping"),
					});
				}
			}
			_ => scopes.push((key_column, HashSet::from([key.to_string()]))),
		}
	}
}

fn check_indentation(rows: &[StructuralRow<'_>], rule: &IndentationRule, problems: &mut Vec<LintProblem>) {
	for row in rows {
		if row.columns % rule.spaces != 0 {
			problems.push(LintProblem {
				line: row.line,
				column: row.columns + 1,
				rule: RULE_INDENTATION.to_string(),
				level: rule.level,
				message: format!(
					"wrong indentation: expected a multiple of {} but found {}",
					rule.spaces, row.columns
				),
			});
		}
	}
}

fn check_line_length(text: &str, rule: &LineLengthRule, problems: &mut Vec<LintProblem>) {
	for (index, line) in text.lines().enumerate() {
		let length = line.chars().count();
		if length <= rule.max {
			continue;
		}

		if rule.allow_non_breakable_words {
			let word = line
				.trim_start()
				.trim_start_matches(['#', '-'])
				.trim_start();
			if !word.contains(char::is_whitespace) {
				continue;
			}
		}

		problems.push(LintProblem {
			line: index + 1,
			column: rule.max + 1,
			rule: RULE_LINE_LENGTH.to_string(),
			level: rule.level,
			message: format!("line too long ({length} > {} characters)", rule.max),
		});
	}
}
