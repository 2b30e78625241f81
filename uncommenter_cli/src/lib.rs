use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use uncommenter_core::mrcf::Flavor;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn a commented YAML template into a working configuration file.",
	long_about = "uncommenter un-comments the data rows of a commented YAML template, keeps \
	              commented prose as it is, repairs the structure with a lint-and-fix loop, and \
	              replaces `{{ … }}` placeholders with values from a parameter catalogue, Helm \
	              chart values, or the placeholder's own per-flavor defaults.\n\nExamples:\n  \
	              uncommenter values.tpl.yaml values.yaml\n  uncommenter values.tpl.yaml \
	              values.yaml --mrcf catalogue.json --helm charts/ --flavor large-system\n  \
	              uncommenter values.tpl.yaml values.yaml --trace trace.json --diff"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct UncommenterCli {
	/// The commented YAML template to read.
	pub input: PathBuf,

	/// Where to write the processed document. Nothing is written when
	/// processing fails.
	pub output: PathBuf,

	/// Parameter catalogue (MRCF JSON) to resolve placeholders from.
	#[arg(long)]
	pub mrcf: Option<PathBuf>,

	/// Helm chart directory, `.tgz` archive, or `values.yaml` file.
	#[arg(long)]
	pub helm: Option<PathBuf>,

	/// Deployment flavor used to pick per-flavor defaults.
	#[arg(long, value_enum)]
	pub flavor: Option<FlavorArg>,

	/// Configuration file. Command-line options take precedence over its
	/// fields.
	#[arg(long, short)]
	pub config: Option<PathBuf>,

	/// Write logs to this file instead of stderr.
	#[arg(long)]
	pub log: Option<PathBuf>,

	/// Also write the repaired document, before placeholders are resolved.
	#[arg(long)]
	pub fixed: Option<PathBuf>,

	/// Write the decision trace as JSON.
	#[arg(long)]
	pub trace: Option<PathBuf>,

	/// Skip the lint-and-repair loop as if no linter were available.
	#[arg(long, default_value_t = false)]
	pub no_lint: bool,

	/// Print a unified diff of the input against the output.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Log every decision.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
	SmallSystem,
	StandardSystem,
	LargeSystem,
}

impl From<FlavorArg> for Flavor {
	fn from(value: FlavorArg) -> Self {
		match value {
			FlavorArg::SmallSystem => Self::SmallSystem,
			FlavorArg::StandardSystem => Self::StandardSystem,
			FlavorArg::LargeSystem => Self::LargeSystem,
		}
	}
}
