use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::EnumAccess;
use serde::de::MapAccess;
use serde::de::SeqAccess;
use serde::de::VariantAccess;
use serde::de::Visitor;

use crate::line::is_blank;
use crate::line::is_comment;

/// A loosely loaded YAML value.
///
/// Mappings keep every entry in document order, so duplicate keys load
/// instead of failing the way a `serde_yaml_ng::Mapping` would.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
	Null,
	Bool(bool),
	Integer(i64),
	Float(f64),
	String(String),
	Sequence(Vec<Loaded>),
	Mapping(Vec<(Loaded, Loaded)>),
}

impl Loaded {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s.as_str()),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Text form of a scalar; `None` for collections.
	pub fn scalar_text(&self) -> Option<String> {
		match self {
			Self::Null => Some("null".to_string()),
			Self::Bool(b) => Some(b.to_string()),
			Self::Integer(i) => Some(i.to_string()),
			Self::Float(f) => Some(f.to_string()),
			Self::String(s) => Some(s.clone()),
			Self::Sequence(_) | Self::Mapping(_) => None,
		}
	}
}

impl<'de> Deserialize<'de> for Loaded {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(LoadedVisitor)
	}
}

struct LoadedVisitor;

impl<'de> Visitor<'de> for LoadedVisitor {
	type Value = Loaded;

	fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
		formatter.write_str("any YAML value")
	}

	fn visit_bool<E>(self, value: bool) -> Result<Loaded, E> {
		Ok(Loaded::Bool(value))
	}

	fn visit_i64<E>(self, value: i64) -> Result<Loaded, E> {
		Ok(Loaded::Integer(value))
	}

	fn visit_u64<E>(self, value: u64) -> Result<Loaded, E> {
		Ok(i64::try_from(value).map_or(Loaded::Float(value as f64), Loaded::Integer))
	}

	fn visit_f64<E>(self, value: f64) -> Result<Loaded, E> {
		Ok(Loaded::Float(value))
	}

	fn visit_str<E>(self, value: &str) -> Result<Loaded, E> {
		Ok(Loaded::String(value.to_string()))
	}

	fn visit_string<E>(self, value: String) -> Result<Loaded, E> {
		Ok(Loaded::String(value))
	}

	fn visit_unit<E>(self) -> Result<Loaded, E> {
		Ok(Loaded::Null)
	}

	fn visit_none<E>(self) -> Result<Loaded, E> {
		Ok(Loaded::Null)
	}

	fn visit_some<D>(self, deserializer: D) -> Result<Loaded, D::Error>
	where
		D: Deserializer<'de>,
	{
		Loaded::deserialize(deserializer)
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Loaded, A::Error>
	where
		A: SeqAccess<'de>,
	{
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element()? {
			items.push(item);
		}
		Ok(Loaded::Sequence(items))
	}

	fn visit_map<A>(self, mut map: A) -> Result<Loaded, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
		while let Some(entry) = map.next_entry()? {
			entries.push(entry);
		}
		Ok(Loaded::Mapping(entries))
	}

	// Custom tags (`!secret value`) surface as enums; keep the tagged value.
	fn visit_enum<A>(self, data: A) -> Result<Loaded, A::Error>
	where
		A: EnumAccess<'de>,
	{
		let (_tag, variant): (String, _) = data.variant()?;
		variant.newtype_variant()
	}
}

/// Load `text` permissively. Text made only of comments and blank lines loads
/// as [`Loaded::Null`] without invoking the parser.
pub fn load(text: &str) -> Result<Loaded, serde_yaml_ng::Error> {
	if text.lines().all(|line| is_blank(line) || is_comment(line)) {
		return Ok(Loaded::Null);
	}

	serde_yaml_ng::from_str(text)
}
