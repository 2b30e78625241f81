use serde::Serialize;

use crate::resolver::ValueSource;

/// What kind of decision a pipeline stage took for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[non_exhaustive]
pub enum DecisionKind {
	/// A commented row was turned into data. `status` is the folder case
	/// (1 extended block, 2 closed block, 3 row alone).
	Uncommented { status: u8 },
	/// A commented row stayed commented because it reads as prose.
	KeptComment,
	/// The indent fixer moved a line.
	IndentFixed { from: usize, to: usize },
	/// The repair loop changed a line in response to a lint rule.
	Repaired { rule: String },
	/// A placeholder was replaced.
	ValueResolved {
		path: String,
		source: ValueSource,
		rendered: String,
	},
	/// Something needs a human look; processing continued.
	Warning,
}

/// One replayable trace record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
	/// 1-indexed line number in the input document; 0 for document-wide
	/// records.
	pub line_no: usize,
	#[serde(flatten)]
	pub kind: DecisionKind,
	pub detail: String,
}

/// Ordered decision records for a single run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Trace {
	decisions: Vec<Decision>,
}

impl Trace {
	pub fn record(&mut self, line_no: usize, kind: DecisionKind, detail: impl Into<String>) {
		let detail = detail.into();
		tracing::debug!(line_no, ?kind, "{detail}");
		self.decisions.push(Decision {
			line_no,
			kind,
			detail,
		});
	}

	pub fn warn(&mut self, line_no: usize, detail: impl Into<String>) {
		let detail = detail.into();
		tracing::warn!(line_no, "{detail}");
		self.decisions.push(Decision {
			line_no,
			kind: DecisionKind::Warning,
			detail,
		});
	}

	pub fn extend(&mut self, other: Trace) {
		self.decisions.extend(other.decisions);
	}

	pub fn decisions(&self) -> &[Decision] {
		&self.decisions
	}

	pub fn warnings(&self) -> impl Iterator<Item = &Decision> {
		self.decisions
			.iter()
			.filter(|decision| decision.kind == DecisionKind::Warning)
	}

	pub fn is_empty(&self) -> bool {
		self.decisions.is_empty()
	}

	pub fn len(&self) -> usize {
		self.decisions.len()
	}
}
