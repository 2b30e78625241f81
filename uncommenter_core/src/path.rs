use std::fmt;

use derive_more::Deref;
use derive_more::DerefMut;

/// Wildcard array token: "some element, index unknown".
pub const ANY_INDEX: &str = "[N]";

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
	Key(String),
	/// `[N]`
	AnyIndex,
}

impl PathToken {
	pub fn key(name: impl Into<String>) -> Self {
		Self::Key(name.into())
	}

	pub fn as_key(&self) -> Option<&str> {
		match self {
			Self::Key(name) => Some(name),
			Self::AnyIndex => None,
		}
	}
}

impl fmt::Display for PathToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			// Identifiers that contain a separator are parenthesized.
			Self::Key(name) if name.contains(['.', '/']) => write!(f, "({name})"),
			Self::Key(name) => write!(f, "{name}"),
			Self::AnyIndex => write!(f, "{ANY_INDEX}"),
		}
	}
}

/// A sequence of tokens from the document root.
///
/// `Display` gives the dotted form (`svc.ports[N].name`); [`Path::catalogue_key`]
/// gives the `/`-joined key used by the parameter catalogue and Helm values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, DerefMut)]
pub struct Path(Vec<PathToken>);

impl Path {
	pub fn root() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn child(&self, token: PathToken) -> Self {
		let mut tokens = self.0.clone();
		tokens.push(token);
		Self(tokens)
	}

	/// `/`-joined form with array tokens dropped, e.g. `/svc/ports/name`.
	pub fn catalogue_key(&self) -> String {
		let mut key = String::new();
		for name in self.0.iter().filter_map(PathToken::as_key) {
			key.push('/');
			key.push_str(name);
		}
		if key.is_empty() {
			key.push('/');
		}
		key
	}

	/// Parse a catalogue or Helm path such as `/svc/ports[0]/name`. Every
	/// array index becomes [`PathToken::AnyIndex`].
	pub fn parse_slashed(raw: &str) -> Self {
		let mut tokens = Vec::new();
		for segment in raw.split('/').filter(|segment| !segment.is_empty()) {
			let (name, mut rest) = segment.find('[').map_or((segment, ""), |open| segment.split_at(open));
			if !name.is_empty() {
				tokens.push(PathToken::key(name));
			}
			while rest.starts_with('[') {
				let Some(close) = rest.find(']') else {
					break;
				};
				if !is_index_token(&rest[1..close]) {
					break;
				}
				tokens.push(PathToken::AnyIndex);
				rest = &rest[close + 1..];
			}
		}
		Self(tokens)
	}

	/// Parse a dotted path such as `svc.(proxy.istio.io/config).ports[N]`.
	pub fn parse_dotted(text: &str) -> Self {
		let mut tokens = Vec::new();
		let mut current = String::new();
		let mut depth = 0;

		let flush = |current: &mut String, tokens: &mut Vec<PathToken>| {
			if !current.is_empty() {
				tokens.push(PathToken::Key(std::mem::take(current)));
			}
		};

		let mut chars = text.chars();
		while let Some(c) = chars.next() {
			match c {
				'(' if depth == 0 && current.is_empty() => depth += 1,
				')' if depth == 1 => depth -= 1,
				'.' if depth == 0 => flush(&mut current, &mut tokens),
				'[' if depth == 0 => {
					flush(&mut current, &mut tokens);
					for next in chars.by_ref() {
						if next == ']' {
							break;
						}
					}
					tokens.push(PathToken::AnyIndex);
				}
				c => current.push(c),
			}
		}
		flush(&mut current, &mut tokens);

		Self(tokens)
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, token) in self.0.iter().enumerate() {
			match token {
				PathToken::AnyIndex => write!(f, "{token}")?,
				PathToken::Key(_) if index == 0 => write!(f, "{token}")?,
				PathToken::Key(_) => write!(f, ".{token}")?,
			}
		}
		Ok(())
	}
}

impl From<Vec<PathToken>> for Path {
	fn from(tokens: Vec<PathToken>) -> Self {
		Self(tokens)
	}
}

/// Normalize a raw catalogue path: array tokens (`[0]`, `[12]`, `[N]`) are
/// dropped, repeated separators collapse, and the result is `/`-prefixed
/// without a trailing `/`.
pub fn catalogue_key(raw: &str) -> String {
	let mut stripped = String::with_capacity(raw.len() + 1);
	let mut rest = raw;

	while let Some(open) = rest.find('[') {
		stripped.push_str(&rest[..open]);
		let after = &rest[open + 1..];
		match after.find(']') {
			Some(close) if is_index_token(&after[..close]) => rest = &after[close + 1..],
			_ => {
				stripped.push('[');
				rest = after;
			}
		}
	}
	stripped.push_str(rest);

	let segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty()).collect();
	format!("/{}", segments.join("/"))
}

fn is_index_token(inner: &str) -> bool {
	inner == "N" || (!inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()))
}

/// Interpret a placeholder body as a catalogue reference: `/a/b` or `a.b`.
pub fn reference_key(body: &str) -> Option<String> {
	let body = body.trim();
	if body.is_empty() || body.contains(char::is_whitespace) || body.contains('|') {
		return None;
	}

	if body.starts_with('/') {
		return Some(catalogue_key(body));
	}

	if body.contains('.')
		&& body
			.chars()
			.all(|c| c.is_alphanumeric() || "_-.[]()/".contains(c))
		&& body.chars().next().is_some_and(char::is_alphabetic)
	{
		return Some(Path::parse_dotted(body).catalogue_key());
	}

	None
}
