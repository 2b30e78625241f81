use crate::line::is_blank;
use crate::line::is_comment;
use crate::loader::Loaded;
use crate::loader::load;
use crate::whitelist::Whitelists;

/// Outcome of asking the oracle about a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
	/// The text loads and passes every semantic filter.
	WellFormed(Loaded),
	/// The text is not YAML but contains allow-listed prose.
	AllowListed,
	/// The text does not load, or loads into something that reads as prose.
	Malformed(Rejection),
}

impl Verdict {
	pub fn is_well_formed(&self) -> bool {
		matches!(self, Self::WellFormed(_))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
	/// The YAML loader failed with this message.
	Syntax(String),
	/// The named semantic filter rejected the loaded value.
	Filter(&'static str),
}

/// A semantic rejection rule applied to text the loader accepted.
pub struct SemanticFilter {
	pub name: &'static str,
	pub description: &'static str,
	/// Returns `true` when the loaded value should be treated as prose.
	pub rejects: fn(&Loaded, &str, &Whitelists) -> bool,
}

/// The filter bank, applied in order after a successful load.
pub const SEMANTIC_FILTERS: &[SemanticFilter] = &[
	SemanticFilter {
		name: "F1",
		description: "bare scalar",
		rejects: |value, _, _| {
			matches!(
				value,
				Loaded::Bool(_) | Loaded::Integer(_) | Loaded::Float(_) | Loaded::String(_)
			)
		},
	},
	SemanticFilter {
		name: "F2",
		description: "list item reads as a sentence",
		rejects: |value, _, _| {
			first_item(value)
				.and_then(Loaded::as_str)
				.is_some_and(|item| item.contains(' ') && !item.contains(':'))
		},
	},
	SemanticFilter {
		name: "F3",
		description: "list item is an example address",
		rejects: |value, _, _| {
			first_item_text(value).is_some_and(|item| item.starts_with("10.40.0."))
		},
	},
	SemanticFilter {
		name: "F4",
		description: "list item has more than two words",
		rejects: |value, _, _| {
			first_item_text(value).is_some_and(|item| item.split_whitespace().count() > 2)
		},
	},
	SemanticFilter {
		name: "F5",
		description: "list item has more than three colon segments",
		rejects: |value, _, _| first_item_text(value).is_some_and(|item| item.split(':').count() > 3),
	},
	SemanticFilter {
		name: "F6",
		description: "first key is capitalised or contains a space",
		rejects: |value, _, whitelists| {
			let Some(key) = first_key_text(value) else {
				return false;
			};
			let capitalised = key.chars().next().is_some_and(char::is_uppercase);
			(capitalised && !whitelists.is_uppercase_key_allowed(&key)) || key.contains(' ')
		},
	},
	SemanticFilter {
		name: "F7",
		description: "single key with an unquoted multi-word value",
		rejects: |value, raw, whitelists| {
			let Loaded::Mapping(entries) = value else {
				return false;
			};
			let [(key, Loaded::String(text))] = entries.as_slice() else {
				return false;
			};
			let Some(key) = key.scalar_text() else {
				return false;
			};
			text.split_whitespace().count() > 2
				&& !first_value_is_quoted(raw)
				&& !whitelists.is_long_value_allowed(&key, text)
		},
	},
];

fn first_item(value: &Loaded) -> Option<&Loaded> {
	match value {
		Loaded::Sequence(items) => items.first(),
		_ => None,
	}
}

fn first_item_text(value: &Loaded) -> Option<String> {
	first_item(value).and_then(Loaded::scalar_text)
}

fn first_key_text(value: &Loaded) -> Option<String> {
	match value {
		Loaded::Mapping(entries) => entries.first().and_then(|(key, _)| key.scalar_text()),
		_ => None,
	}
}

/// Whether the value of the first data row is quoted or a block scalar.
fn first_value_is_quoted(raw: &str) -> bool {
	raw.lines()
		.find(|line| !is_blank(line) && !is_comment(line))
		.and_then(|line| line.split_once(':'))
		.map(|(_, rest)| rest.trim_start())
		.is_some_and(|rest| rest.starts_with(['"', '\'', '|', '>']))
}

/// The well-formedness predicate consulted by the block folder.
#[derive(Debug, Clone, Default)]
pub struct Oracle {
	whitelists: Whitelists,
}

impl Oracle {
	pub fn new(whitelists: Whitelists) -> Self {
		Self { whitelists }
	}

	pub fn whitelists(&self) -> &Whitelists {
		&self.whitelists
	}

	pub fn check(&self, text: &str) -> Verdict {
		let verdict = match load(text) {
			Ok(value) => {
				match SEMANTIC_FILTERS
					.iter()
					.find(|filter| (filter.rejects)(&value, text, &self.whitelists))
				{
					Some(filter) => Verdict::Malformed(Rejection::Filter(filter.name)),
					None => Verdict::WellFormed(value),
				}
			}
			Err(e) => Verdict::Malformed(Rejection::Syntax(e.to_string())),
		};

		match verdict {
			Verdict::Malformed(_) if self.whitelists.is_allowed_text(text) => Verdict::AllowListed,
			verdict => verdict,
		}
	}

	/// `is_yaml(text) → bool × value|nil`. Allow-listed text is reported as
	/// well-formed without a value.
	pub fn is_yaml(&self, text: &str) -> (bool, Option<Loaded>) {
		match self.check(text) {
			Verdict::WellFormed(value) => (true, Some(value)),
			Verdict::AllowListed => (true, None),
			Verdict::Malformed(_) => (false, None),
		}
	}

	/// Strict acceptance used for un-commenting decisions: allow-listed prose
	/// is never turned into data.
	pub fn accepts(&self, text: &str) -> bool {
		self.check(text).is_well_formed()
	}

	/// Row check used to decide whether the scan must abort.
	pub fn row_is_parseable(&self, row: &str) -> bool {
		self.is_yaml(row).0
	}
}
