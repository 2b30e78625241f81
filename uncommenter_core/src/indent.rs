use crate::line::DocLine;
use crate::line::LineOrigin;
use crate::line::indent_level;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::is_sentinel;
use crate::line::leading_columns;
use crate::line::set_leading_columns;
use crate::line::strip_sentinel;
use crate::trace::DecisionKind;
use crate::trace::Trace;

/// Stage 3a: drop the head row, strip sentinel tags and attach provenance.
///
/// `folded` is the stage-2 output including the head row; `input` is the
/// original document. Row `i` of the result corresponds to input row `i`.
pub fn postprocess(folded: &[String], input: &str) -> Vec<DocLine> {
	let mut original = input.lines();
	folded
		.iter()
		.skip(1)
		.map(|row| {
			let was_commented = original.next().is_some_and(is_comment);
			let origin = LineOrigin {
				was_commented,
				opaque: is_sentinel(row),
			};
			DocLine::new(strip_sentinel(row), origin)
		})
		.collect()
}

/// A line the fixer can move: data, and not sentinel-protected.
fn is_fixable(line: &DocLine) -> bool {
	!line.origin.opaque && !is_blank(&line.text) && !is_comment(&line.text)
}

/// Correction chosen by the neighbourhood table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Correction {
	Keep,
	MoveTo(usize),
}

/// Pick a correction for an odd indent `l` given the previous (`p`) and next
/// (`n`) data indents. `None` means no rule matched.
pub(crate) fn correction(l: usize, p: usize, n: usize, previous_opens_block: bool) -> Option<Correction> {
	let (l, p, n) = (l as isize, p as isize, n as isize);
	let split = || {
		if previous_opens_block {
			Correction::MoveTo((l + 1) as usize)
		} else {
			Correction::MoveTo((l - 1) as usize)
		}
	};

	if p + 1 == l && (n + 1 == l || n == l || n == l + 1 || n + 3 < l) {
		return Some(split());
	}
	if (p == l || p == l + 1) && n == l + 1 {
		return Some(Correction::MoveTo((l + 1) as usize));
	}
	if p > l && n > l {
		if p % 2 == l % 2 && n % 2 == l % 2 {
			return Some(Correction::Keep);
		}
		return Some(Correction::MoveTo(p.min(n) as usize));
	}
	if p > l + 1 && (n == l - 1 || n == l + 1) {
		return Some(Correction::MoveTo(n as usize));
	}

	None
}

/// Stage 3b: repair odd indentation using the previous and next data lines.
pub fn fix_indentation(lines: &mut [DocLine], trace: &mut Trace) {
	for index in 0..lines.len() {
		if !is_fixable(&lines[index]) {
			continue;
		}

		let level = indent_level(&lines[index].text);
		if level % 2 == 0 {
			continue;
		}

		let previous = lines[..index].iter().rev().find(|line| is_fixable(line));
		let next = lines[index + 1..].iter().find(|line| is_fixable(line));
		let p = previous.map_or(0, |line| indent_level(&line.text));
		let n = next.map_or(0, |line| indent_level(&line.text));
		let previous_opens_block =
			previous.is_some_and(|line| line.text.trim_end().ends_with(':'));

		match correction(level, p, n, previous_opens_block) {
			Some(Correction::Keep) => {}
			Some(Correction::MoveTo(target)) => {
				let line = &mut lines[index];
				let columns = leading_columns(&line.text);
				let new_columns = (columns + target).saturating_sub(level);
				line.text = set_leading_columns(&line.text, new_columns);
				trace.record(
					index + 1,
					DecisionKind::IndentFixed {
						from: level,
						to: target,
					},
					line.text.trim(),
				);
			}
			None => {
				trace.warn(
					index + 1,
					format!("odd indentation {level} left unchanged (previous {p}, next {n})"),
				);
			}
		}
	}
}
