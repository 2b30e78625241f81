use std::sync::LazyLock;

use regex::Regex;

use crate::line::DocLine;
use crate::line::comment_out;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::render_lines;
use crate::lint::LintConfig;
use crate::lint::LintLevel;
use crate::lint::LintProblem;
use crate::lint::Linter;
use crate::lint::RULE_KEY_DUPLICATES;
use crate::lint::RULE_LINE_LENGTH;
use crate::lint::RULE_SYNTAX;
use crate::trace::DecisionKind;
use crate::trace::Trace;

pub const DEFAULT_MAX_PASSES: usize = 2000;
pub const DETECTED_AS_COMMENTED_TEXT: &str = "detected as commented text";
pub const DETECTED_AS_DUPLICATE: &str = "detected as duplicate";

/// Parser messages reporting a child block under a key whose value is
/// already set. PyYAML and libyaml word this differently.
const BLOCK_END_MESSAGES: &[&str] = &[
	"expected <block end>",
	"did not find expected key",
	"did not find expected '-' indicator",
];
const MISSING_COLON_MESSAGE: &str = "could not find expected ':'";
const EMPTY_STUBS: &[&str] = &[": []", ": {}"];

static SIMPLE_KEY_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"while scanning a simple key at line (\d+)").expect("valid regex")
});

/// What a lint problem asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
	/// Drop the `: []` / `: {}` stub from the data line above.
	EmptyStub,
	/// Put a row that was commented in the input back as a comment.
	Recomment(usize),
	/// Comment out a duplicate key.
	Duplicate,
}

fn classify(problem: &LintProblem) -> Option<Repair> {
	if problem.level != LintLevel::Error || problem.rule == RULE_LINE_LENGTH {
		return None;
	}

	if problem.rule == RULE_KEY_DUPLICATES {
		return Some(Repair::Duplicate);
	}
	if problem.rule != RULE_SYNTAX {
		return None;
	}

	if BLOCK_END_MESSAGES
		.iter()
		.any(|message| problem.message.contains(message))
	{
		return Some(Repair::EmptyStub);
	}

	if problem.message.contains(MISSING_COLON_MESSAGE) {
		let origin = SIMPLE_KEY_CONTEXT
			.captures(&problem.message)
			.and_then(|captures| captures[1].parse().ok())
			.unwrap_or(problem.line.saturating_sub(1));
		return Some(Repair::Recomment(origin));
	}

	None
}

/// Result of running the repair loop.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
	pub passes: usize,
	/// A pass made no change before the budget ran out.
	pub converged: bool,
	/// Problems reported by the final lint pass.
	pub remaining: Vec<LintProblem>,
}

/// Stage 4: lint, apply targeted repairs, and repeat to a fixed point.
pub struct RepairLoop<'a> {
	linter: &'a dyn Linter,
	config: &'a LintConfig,
	max_passes: usize,
}

impl<'a> RepairLoop<'a> {
	pub fn new(linter: &'a dyn Linter, config: &'a LintConfig) -> Self {
		Self {
			linter,
			config,
			max_passes: DEFAULT_MAX_PASSES,
		}
	}

	#[must_use]
	pub fn with_max_passes(mut self, max_passes: usize) -> Self {
		self.max_passes = max_passes;
		self
	}

	/// `input` holds the original rows, used when a row has to be put back as
	/// the comment it was.
	pub fn run(&self, lines: &mut [DocLine], input: &[&str], trace: &mut Trace) -> RepairOutcome {
		let mut passes = 0;

		loop {
			let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
			let problems = self.linter.run(&render_lines(&texts), self.config);

			if passes == self.max_passes {
				trace.warn(
					0,
					format!(
						"repair budget of {} passes exhausted; keeping the partially repaired \
						 document",
						self.max_passes
					),
				);
				return RepairOutcome {
					passes,
					converged: false,
					remaining: problems,
				};
			}
			passes += 1;

			let mut changed = false;
			for problem in &problems {
				if let Some(repair) = classify(problem) {
					changed |= apply(repair, problem, lines, input, trace);
				}
			}

			if !changed {
				tracing::info!(passes, remaining = problems.len(), "repair loop reached a fixed point");
				return RepairOutcome {
					passes,
					converged: true,
					remaining: problems,
				};
			}
		}
	}
}

fn is_editable(line: &DocLine) -> bool {
	!line.origin.opaque && !is_blank(&line.text) && !is_comment(&line.text)
}

fn apply(repair: Repair, problem: &LintProblem, lines: &mut [DocLine], input: &[&str], trace: &mut Trace) -> bool {
	match repair {
		Repair::EmptyStub => {
			let end = problem.line.saturating_sub(1).min(lines.len());
			let Some(index) = (0..end).rev().find(|index| is_editable(&lines[*index])) else {
				return false;
			};
			let line = &mut lines[index];
			let trimmed = line.text.trim_end();
			let Some(kept) = EMPTY_STUBS
				.iter()
				.find_map(|stub| trimmed.strip_suffix(stub))
			else {
				return false;
			};
			line.text = format!("{kept}:");
			trace.record(
				index + 1,
				DecisionKind::Repaired {
					rule: problem.rule.clone(),
				},
				format!("dropped empty value before nested block: {}", line.text.trim()),
			);
			true
		}
		Repair::Recomment(line_no) => {
			let Some(index) = line_no.checked_sub(1) else {
				return false;
			};
			let (Some(line), Some(original)) = (lines.get_mut(index), input.get(index)) else {
				return false;
			};
			if !line.origin.was_commented || !is_editable(line) {
				return false;
			}
			line.text = format!("{original} # {DETECTED_AS_COMMENTED_TEXT}");
			trace.record(
				line_no,
				DecisionKind::Repaired {
					rule: problem.rule.clone(),
				},
				DETECTED_AS_COMMENTED_TEXT,
			);
			true
		}
		Repair::Duplicate => {
			let Some(line) = problem.line.checked_sub(1).and_then(|index| lines.get_mut(index)) else {
				return false;
			};
			if !is_editable(line) {
				return false;
			}
			line.text = comment_out(&line.text, DETECTED_AS_DUPLICATE);
			trace.record(
				problem.line,
				DecisionKind::Repaired {
					rule: problem.rule.clone(),
				},
				DETECTED_AS_DUPLICATE,
			);
			true
		}
	}
}
