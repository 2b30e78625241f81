use std::collections::VecDeque;

use serde::Serialize;

use crate::UncommentError;
use crate::UncommentResult;
use crate::line::COMMENT_MASK;
use crate::line::indent_level;
use crate::line::is_blank;
use crate::line::is_comment;
use crate::line::is_comment_only;
use crate::line::is_sentinel;
use crate::line::leading_columns;
use crate::line::uncomment;
use crate::oracle::Oracle;
use crate::repair::DETECTED_AS_COMMENTED_TEXT;
use crate::repair::DETECTED_AS_DUPLICATE;
use crate::trace::DecisionKind;
use crate::trace::Trace;

/// Outcome of the most recent row decision in the reverse scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoldStatus {
	/// Sentinel-wrapped row, carried over untouched.
	PassThrough,
	/// Status 0: a row made only of `#`.
	CommentOnly,
	/// Status 1: the un-commented row extends the candidate block.
	Extended,
	/// Status 2: the un-commented row is deeper than the block; the block is
	/// closed.
	ClosedBlock,
	/// Status 3: the un-commented row is accepted on its own.
	RowAccepted,
	/// Status 4: the row stays commented.
	KeptComment,
	/// Status 5: a data row.
	Data,
}

impl FoldStatus {
	pub fn code(self) -> Option<u8> {
		match self {
			Self::PassThrough => None,
			Self::CommentOnly => Some(0),
			Self::Extended => Some(1),
			Self::ClosedBlock => Some(2),
			Self::RowAccepted => Some(3),
			Self::KeptComment => Some(4),
			Self::Data => Some(5),
		}
	}
}

/// A row held in a candidate block.
#[derive(Debug, Clone)]
struct BlockRow {
	text: String,
	/// Sentinel-wrapped; shown to the oracle as a bare comment.
	opaque: bool,
}

/// Stage 2 output: rows in document order, sentinel tags still in place.
#[derive(Debug, Clone)]
pub struct Folded {
	pub rows: Vec<String>,
	pub trace: Trace,
	pub last_status: Option<FoldStatus>,
}

/// Reverse scanner that decides, row by row, which commented rows are data.
pub struct BlockFolder<'a> {
	oracle: &'a Oracle,
	file: &'a str,
	last_block: VecDeque<BlockRow>,
	/// Smallest column of a data row in `last_block`.
	block_min_indent: Option<usize>,
	blocks: Vec<VecDeque<BlockRow>>,
	status: Option<FoldStatus>,
	trace: Trace,
}

impl<'a> BlockFolder<'a> {
	pub fn new(oracle: &'a Oracle, file: &'a str) -> Self {
		Self {
			oracle,
			file,
			last_block: VecDeque::new(),
			block_min_indent: None,
			blocks: Vec::new(),
			status: None,
			trace: Trace::default(),
		}
	}

	/// Fold a preprocessed document. Row 0 is the head row, so a row's index
	/// is its 1-indexed line number in the input.
	pub fn fold(mut self, document: &str) -> UncommentResult<Folded> {
		let rows: Vec<&str> = document.lines().collect();
		for (index, row) in rows.iter().enumerate().rev() {
			self.fold_row(index, row)?;
		}

		if !self.last_block.is_empty() {
			let block = std::mem::take(&mut self.last_block);
			self.blocks.push(block);
		}

		let rows = self
			.blocks
			.into_iter()
			.rev()
			.flat_map(|block| block.into_iter().map(|row| row.text))
			.collect();

		Ok(Folded {
			rows,
			trace: self.trace,
			last_status: self.status,
		})
	}

	pub(crate) fn fold_row(&mut self, index: usize, row: &str) -> UncommentResult<()> {
		if is_sentinel(row) {
			self.prepend(row.to_string(), true);
			self.status = Some(FoldStatus::PassThrough);
			return Ok(());
		}

		if !self.oracle.row_is_parseable(row) {
			return Err(UncommentError::UnparseableRow {
				file: self.file.to_string(),
				line: index,
				row: row.trim().to_string(),
			});
		}

		let status = if is_comment_only(row) {
			self.prepend(row.to_string(), false);
			FoldStatus::CommentOnly
		} else if is_comment(row) {
			self.fold_comment(index, row)
		} else {
			self.prepend(row.to_string(), false);
			FoldStatus::Data
		};

		self.status = Some(status);
		Ok(())
	}

	fn fold_comment(&mut self, index: usize, row: &str) -> FoldStatus {
		let uncommented = uncomment(row);

		let status = if is_repair_annotated(row) {
			self.prepend(row.to_string(), false);
			FoldStatus::KeptComment
		} else if self.extends_block(&uncommented) {
			self.prepend(uncommented, false);
			FoldStatus::Extended
		} else if self.oracle.accepts(&uncommented) {
			let deeper = self
				.first_line_indent()
				.is_some_and(|first| indent_level(&uncommented) > first);
			self.prepend(uncommented, false);
			if deeper {
				let block = std::mem::take(&mut self.last_block);
				self.blocks.push(block);
				self.block_min_indent = None;
				FoldStatus::ClosedBlock
			} else {
				FoldStatus::RowAccepted
			}
		} else {
			self.prepend(row.to_string(), false);
			FoldStatus::KeptComment
		};

		match status.code() {
			Some(code @ 1..=3) => {
				self.trace.record(
					index,
					DecisionKind::Uncommented { status: code },
					row.trim(),
				);
			}
			_ => self.trace.record(index, DecisionKind::KeptComment, row.trim()),
		}

		status
	}

	/// Would the un-commented row, placed on top of the current block, load?
	fn extends_block(&self, uncommented: &str) -> bool {
		// A block whose first row is deeper than a later data row cannot load
		// as a document.
		let head_indent = leading_columns(uncommented);
		if !is_blank(uncommented) && !is_comment(uncommented) {
			if let Some(min) = self.block_min_indent {
				if head_indent > min {
					return false;
				}
			}
		}

		self.oracle.accepts(&self.candidate(uncommented))
	}

	/// The un-commented row on top of the block, down to and including the
	/// first data row at or left of the row's indent. Rows below it were
	/// already accepted under that row and cannot change the verdict.
	pub(crate) fn candidate(&self, uncommented: &str) -> String {
		let head_is_data = !is_blank(uncommented) && !is_comment(uncommented);
		let head_indent = leading_columns(uncommented);

		let mut candidate = String::with_capacity(uncommented.len() + 1);
		candidate.push_str(uncommented);
		candidate.push('\n');
		for row in &self.last_block {
			if row.opaque {
				candidate.push_str(COMMENT_MASK);
				candidate.push('\n');
				continue;
			}

			candidate.push_str(&row.text);
			candidate.push('\n');
			let is_data = !is_blank(&row.text) && !is_comment(&row.text);
			if is_data && (!head_is_data || leading_columns(&row.text) <= head_indent) {
				break;
			}
		}

		candidate
	}

	fn first_line_indent(&self) -> Option<usize> {
		self.last_block
			.iter()
			.find(|row| !row.opaque && !is_blank(&row.text))
			.map(|row| indent_level(&row.text))
	}

	fn prepend(&mut self, text: String, opaque: bool) {
		if !opaque && !is_blank(&text) && !is_comment(&text) {
			let indent = leading_columns(&text);
			self.block_min_indent = Some(self.block_min_indent.map_or(indent, |min| min.min(indent)));
		}
		self.last_block.push_front(BlockRow { text, opaque });
	}
}

/// Rows the repair loop commented out stay commented on later runs.
fn is_repair_annotated(row: &str) -> bool {
	let row = row.trim_end();
	[DETECTED_AS_DUPLICATE, DETECTED_AS_COMMENTED_TEXT]
		.iter()
		.any(|annotation| {
			row.strip_suffix(annotation)
				.is_some_and(|rest| rest.trim_end().ends_with('#'))
		})
}

/// Stage 2 entry point.
pub fn fold_blocks(document: &str, oracle: &Oracle, file: &str) -> UncommentResult<Folded> {
	BlockFolder::new(oracle, file).fold(document)
}
