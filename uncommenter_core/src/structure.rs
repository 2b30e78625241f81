use serde::Serialize;

use crate::helm::HelmValues;
use crate::mrcf::Catalogue;
use crate::mrcf::DeclaredType;
use crate::mrcf::Mandatory;
use crate::path::Path;
use crate::path::PathToken;

/// Index of a node in a [`StructureTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
	Object,
	ArrayElement,
	LeafScalar,
	/// Seen only in the document being processed.
	Dynamic,
}

/// Which external source declared a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
	Helm,
	Mrcf,
	Both,
}

impl Source {
	fn merge(self, other: Self) -> Self {
		if self == other { self } else { Self::Both }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
	pub name: PathToken,
	pub node_type: NodeType,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	/// `None` for the root and for dynamic nodes.
	pub source: Option<Source>,
	pub declared_type: Option<DeclaredType>,
	pub mandatory: Option<Mandatory>,
	pub confidence: f64,
	pub usage_count: u32,
}

impl StructureNode {
	fn new(name: PathToken, node_type: NodeType, parent: Option<NodeId>, source: Option<Source>) -> Self {
		Self {
			name,
			node_type,
			parent,
			children: Vec::new(),
			source,
			declared_type: None,
			mandatory: None,
			confidence: confidence_of(source),
			usage_count: 0,
		}
	}
}

fn confidence_of(source: Option<Source>) -> f64 {
	match source {
		Some(Source::Both) => 1.0,
		Some(Source::Mrcf) => 0.9,
		Some(Source::Helm) => 0.8,
		None => 0.5,
	}
}

/// Merged tree of every path known to the Helm values and the catalogue.
///
/// Nodes live in an arena and refer to each other by [`NodeId`], so context
/// frames can hold ids while the tree keeps growing.
#[derive(Debug, Clone)]
pub struct StructureTree {
	nodes: Vec<StructureNode>,
}

impl Default for StructureTree {
	fn default() -> Self {
		Self::new()
	}
}

impl StructureTree {
	pub fn new() -> Self {
		Self {
			nodes: vec![StructureNode::new(
				PathToken::key(""),
				NodeType::Object,
				None,
				None,
			)],
		}
	}

	pub fn from_sources(catalogue: Option<&Catalogue>, helm: Option<&HelmValues>) -> Self {
		let mut tree = Self::new();

		if let Some(helm) = helm {
			for path in helm.flattened().keys() {
				tree.insert_path(&Path::parse_slashed(path), Source::Helm);
			}
		}

		if let Some(catalogue) = catalogue {
			for record in catalogue.records() {
				let leaf = tree.insert_path(&Path::parse_slashed(&record.path), Source::Mrcf);
				let node = tree.node_mut(leaf);
				node.declared_type = node.declared_type.or(record.format);
				node.mandatory = node.mandatory.or(record.mandatory);
				if matches!(record.format, Some(DeclaredType::Object | DeclaredType::Array))
					&& node.node_type == NodeType::LeafScalar
				{
					node.node_type = NodeType::Object;
				}
			}
		}

		tracing::debug!(nodes = tree.len(), "built structure tree");
		tree
	}

	pub fn root(&self) -> NodeId {
		NodeId(0)
	}

	pub fn node(&self, id: NodeId) -> &StructureNode {
		&self.nodes[id.0]
	}

	fn node_mut(&mut self, id: NodeId) -> &mut StructureNode {
		&mut self.nodes[id.0]
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.len() == 1
	}

	pub fn child(&self, parent: NodeId, token: &PathToken) -> Option<NodeId> {
		self.node(parent)
			.children
			.iter()
			.copied()
			.find(|child| &self.node(*child).name == token)
	}

	pub fn child_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
		self.node(parent)
			.children
			.iter()
			.copied()
			.find(|child| self.node(*child).name.as_key() == Some(key))
	}

	/// The `[N]` child of `parent`.
	pub fn array_child(&self, parent: NodeId) -> Option<NodeId> {
		self.child(parent, &PathToken::AnyIndex)
	}

	/// Insert a child, or return the existing one. Inserting an existing child
	/// merges its source.
	pub fn insert_child(&mut self, parent: NodeId, token: PathToken, source: Option<Source>) -> NodeId {
		if let Some(existing) = self.child(parent, &token) {
			let node = self.node_mut(existing);
			node.source = match (node.source, source) {
				(Some(current), Some(incoming)) => Some(current.merge(incoming)),
				(current, incoming) => current.or(incoming),
			};
			node.confidence = confidence_of(node.source);
			return existing;
		}

		let node_type = match (&token, source) {
			(PathToken::AnyIndex, _) => NodeType::ArrayElement,
			(PathToken::Key(_), None) => NodeType::Dynamic,
			(PathToken::Key(_), Some(_)) => NodeType::LeafScalar,
		};

		let id = NodeId(self.nodes.len());
		self.nodes
			.push(StructureNode::new(token, node_type, Some(parent), source));

		let parent_node = self.node_mut(parent);
		parent_node.children.push(id);
		if parent_node.node_type == NodeType::LeafScalar {
			parent_node.node_type = NodeType::Object;
		}

		id
	}

	/// Insert every token of `path` under the root and return the last node.
	pub fn insert_path(&mut self, path: &Path, source: Source) -> NodeId {
		path.iter().fold(self.root(), |parent, token| {
			self.insert_child(parent, token.clone(), Some(source))
		})
	}

	/// Find the node at `path`, if every token exists.
	pub fn find(&self, path: &Path) -> Option<NodeId> {
		path.iter()
			.try_fold(self.root(), |parent, token| self.child(parent, token))
	}

	pub fn touch(&mut self, id: NodeId) {
		let node = self.node_mut(id);
		node.usage_count = node.usage_count.saturating_add(1);
	}
}
