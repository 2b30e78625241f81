use crate::UncommentResult;
use crate::UncommenterConfig;
use crate::fold::fold_blocks;
use crate::helm::HelmValues;
use crate::indent::fix_indentation;
use crate::indent::postprocess;
use crate::line::DocLine;
use crate::line::normalize_line_endings;
use crate::line::render_lines;
use crate::lint::LintConfig;
use crate::lint::Linter;
use crate::lint::YamlLinter;
use crate::mrcf::Catalogue;
use crate::mrcf::Flavor;
use crate::oracle::Oracle;
use crate::preprocess::preprocess;
use crate::repair::DEFAULT_MAX_PASSES;
use crate::repair::RepairLoop;
use crate::repair::RepairOutcome;
use crate::resolver::ResolveSummary;
use crate::resolver::ValueResolver;
use crate::resolver::ValueSource;
use crate::trace::Trace;
use crate::whitelist::Whitelists;

/// Result of running every stage on one document.
#[derive(Debug, Clone)]
pub struct Transformation {
	/// The document after the repair loop, before placeholders are resolved.
	pub fixed: String,
	/// The final document.
	pub output: String,
	pub lines: Vec<DocLine>,
	pub trace: Trace,
	/// `None` when the repair loop was skipped.
	pub repair: Option<RepairOutcome>,
	pub resolve: ResolveSummary,
}

/// Runs stages 1–5 over documents with a fixed set of sources and settings.
pub struct Uncommenter {
	oracle: Oracle,
	flavor: Flavor,
	priority: Vec<ValueSource>,
	catalogue: Option<Catalogue>,
	helm: Option<HelmValues>,
	linter: Option<Box<dyn Linter>>,
	lint_config: LintConfig,
	repair_enabled: bool,
	max_passes: usize,
}

impl Default for Uncommenter {
	fn default() -> Self {
		Self::new()
	}
}

impl Uncommenter {
	pub fn new() -> Self {
		Self {
			oracle: Oracle::default(),
			flavor: Flavor::default(),
			priority: ValueSource::DEFAULT_PRIORITY.to_vec(),
			catalogue: None,
			helm: None,
			linter: Some(Box::new(YamlLinter)),
			lint_config: LintConfig::default(),
			repair_enabled: true,
			max_passes: DEFAULT_MAX_PASSES,
		}
	}

	/// Build from a config file's settings, loading the catalogue and Helm
	/// values it names.
	pub fn from_config(config: &UncommenterConfig) -> UncommentResult<Self> {
		let catalogue = config.mrcf.as_deref().map(Catalogue::load).transpose()?;
		let helm = config.helm.as_deref().map(HelmValues::load).transpose()?;

		Ok(Self {
			oracle: Oracle::new(config.whitelists()),
			flavor: config.flavor.unwrap_or_default(),
			priority: config.priority()?,
			catalogue,
			helm,
			linter: Some(Box::new(YamlLinter)),
			lint_config: config.lint_config()?,
			repair_enabled: config.repair.enabled,
			max_passes: config.repair.max_passes,
		})
	}

	#[must_use]
	pub fn with_flavor(mut self, flavor: Flavor) -> Self {
		self.flavor = flavor;
		self
	}

	#[must_use]
	pub fn with_priority(mut self, priority: Vec<ValueSource>) -> Self {
		self.priority = priority;
		self
	}

	#[must_use]
	pub fn with_catalogue(mut self, catalogue: Catalogue) -> Self {
		self.catalogue = Some(catalogue);
		self
	}

	#[must_use]
	pub fn with_helm(mut self, helm: HelmValues) -> Self {
		self.helm = Some(helm);
		self
	}

	#[must_use]
	pub fn with_whitelists(mut self, whitelists: Whitelists) -> Self {
		self.oracle = Oracle::new(whitelists);
		self
	}

	/// Replace the linter; `None` behaves like an unavailable linter and
	/// skips the repair loop.
	#[must_use]
	pub fn with_linter(mut self, linter: Option<Box<dyn Linter>>) -> Self {
		self.linter = linter;
		self
	}

	#[must_use]
	pub fn with_lint_config(mut self, lint_config: LintConfig) -> Self {
		self.lint_config = lint_config;
		self
	}

	#[must_use]
	pub fn with_max_passes(mut self, max_passes: usize) -> Self {
		self.max_passes = max_passes;
		self
	}

	#[must_use]
	pub fn with_repair(mut self, enabled: bool) -> Self {
		self.repair_enabled = enabled;
		self
	}

	pub fn flavor(&self) -> Flavor {
		self.flavor
	}

	/// Transform one document. `file` names the document in diagnostics.
	pub fn transform(&self, input: &str, file: &str) -> UncommentResult<Transformation> {
		let normalized = normalize_line_endings(input);
		let mut trace = Trace::default();
		self.record_loader_warnings(&mut trace);

		let preprocessed = preprocess(&normalized, self.oracle.whitelists());
		let folded = fold_blocks(&preprocessed, &self.oracle, file)?;
		trace.extend(folded.trace);
		tracing::info!(file, rows = folded.rows.len() - 1, "folded commented blocks");

		let mut lines = postprocess(&folded.rows, &normalized);
		fix_indentation(&mut lines, &mut trace);

		let repair = self.repair(&mut lines, &normalized, &mut trace);
		let fixed = render(&lines);

		let mut resolver = ValueResolver::new(
			self.catalogue.as_ref(),
			self.helm.as_ref(),
			self.flavor,
			&self.priority,
		);
		let resolve = resolver.resolve(&mut lines, &mut trace);
		let output = render(&lines);

		Ok(Transformation {
			fixed,
			output,
			lines,
			trace,
			repair,
			resolve,
		})
	}

	fn repair(&self, lines: &mut [DocLine], normalized: &str, trace: &mut Trace) -> Option<RepairOutcome> {
		if !self.repair_enabled {
			return None;
		}

		let Some(linter) = self.linter.as_deref() else {
			trace.warn(0, "linter unavailable; skipping the repair loop");
			return None;
		};

		let input: Vec<&str> = normalized.lines().collect();
		let outcome = RepairLoop::new(linter, &self.lint_config)
			.with_max_passes(self.max_passes)
			.run(lines, &input, trace);
		Some(outcome)
	}

	fn record_loader_warnings(&self, trace: &mut Trace) {
		let catalogue = self.catalogue.iter().flat_map(Catalogue::warnings);
		let helm = self.helm.iter().flat_map(HelmValues::warnings);
		for warning in catalogue.chain(helm) {
			trace.warn(0, warning.clone());
		}
	}
}

fn render(lines: &[DocLine]) -> String {
	let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
	render_lines(&texts)
}
