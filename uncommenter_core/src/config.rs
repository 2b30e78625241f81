use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::UncommentError;
use crate::UncommentResult;
use crate::lint::DEFAULT_LINT_CONFIG;
use crate::lint::LintConfig;
use crate::mrcf::Flavor;
use crate::repair::DEFAULT_MAX_PASSES;
use crate::resolver::ValueSource;
use crate::whitelist::Whitelists;
use crate::whitelist::WhitelistsConfig;

/// Repair loop settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepairConfig {
	pub enabled: bool,
	pub max_passes: usize,
}

impl Default for RepairConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			max_passes: DEFAULT_MAX_PASSES,
		}
	}
}

/// Configuration loaded from the `--config` YAML file. Every field is
/// optional and command-line options take precedence.
///
/// ```yaml
/// flavor: standard-system
/// priority:
///   - mrcf.recommended_value
///   - yaml.defaults_per_flavor
/// mrcf: catalogue.json
/// helm: charts/
/// repair:
///   max_passes: 500
/// lint: |
///   rules:
///     line-length: {max: 200}
/// whitelists:
///   uppercase_keys: ["ACME_*"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UncommenterConfig {
	pub flavor: Option<Flavor>,
	/// Source identifiers in consultation order.
	pub priority: Option<Vec<String>>,
	/// Parameter catalogue (MRCF JSON).
	pub mrcf: Option<PathBuf>,
	/// Helm chart directory, archive or values file.
	pub helm: Option<PathBuf>,
	pub repair: RepairConfig,
	/// yamllint-style configuration text.
	pub lint: Option<String>,
	pub whitelists: WhitelistsConfig,
}

impl UncommenterConfig {
	/// Read a config file. Relative `mrcf` and `helm` paths are resolved
	/// against the file's directory.
	pub fn load(path: &Path) -> UncommentResult<Self> {
		let content = std::fs::read_to_string(path)?;
		let mut config = Self::from_yaml(&content)?;

		if let Some(base) = path.parent() {
			config.mrcf = config.mrcf.map(|p| base.join(p));
			config.helm = config.helm.map(|p| base.join(p));
		}

		tracing::debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	pub fn from_yaml(content: &str) -> UncommentResult<Self> {
		if content.trim().is_empty() {
			return Ok(Self::default());
		}
		serde_yaml_ng::from_str(content).map_err(|e| UncommentError::ConfigParse(e.to_string()))
	}

	/// The configured priority order, or the default one.
	pub fn priority(&self) -> UncommentResult<Vec<ValueSource>> {
		match &self.priority {
			Some(names) => names.iter().map(|name| name.parse()).collect(),
			None => Ok(ValueSource::DEFAULT_PRIORITY.to_vec()),
		}
	}

	pub fn lint_config(&self) -> UncommentResult<LintConfig> {
		LintConfig::parse(self.lint.as_deref().unwrap_or(DEFAULT_LINT_CONFIG))
	}

	pub fn whitelists(&self) -> Whitelists {
		Whitelists::with_extensions(&self.whitelists)
	}
}
