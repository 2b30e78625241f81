use std::path::Path;
use std::process;
use std::sync::Mutex;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use uncommenter_cli::UncommenterCli;
use uncommenter_core::DecisionKind;
use uncommenter_core::Transformation;
use uncommenter_core::UncommentError;
use uncommenter_core::UncommentResult;
use uncommenter_core::Uncommenter;
use uncommenter_core::UncommenterConfig;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

const LOG_ENV: &str = "UNCOMMENTER_LOG";

fn main() {
	let args = UncommenterCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	if let Err(e) = init_logging(&args, use_color) {
		eprintln!("{} cannot open log file: {e}", colored!("error:", red));
		process::exit(2);
	}

	if let Err(e) = run(&args) {
		let code = match e {
			UncommentError::UnparseableRow { .. } => 1,
			_ => 2,
		};
		let report: miette::Report = e.into();
		eprintln!("{report:?}");
		process::exit(code);
	}
}

fn init_logging(args: &UncommenterCli, use_color: bool) -> std::io::Result<()> {
	let filter = if args.verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	match &args.log {
		Some(path) => {
			let file = std::fs::File::create(path)?;
			tracing_subscriber::fmt()
				.with_env_filter(filter)
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.init();
		}
		None => {
			tracing_subscriber::fmt()
				.with_env_filter(filter)
				.with_ansi(use_color)
				.with_writer(std::io::stderr)
				.init();
		}
	}

	Ok(())
}

/// Merge the config file with command-line overrides.
fn load_config(args: &UncommenterCli) -> UncommentResult<UncommenterConfig> {
	let mut config = match &args.config {
		Some(path) => UncommenterConfig::load(path)?,
		None => UncommenterConfig::default(),
	};

	if let Some(mrcf) = &args.mrcf {
		config.mrcf = Some(mrcf.clone());
	}
	if let Some(helm) = &args.helm {
		config.helm = Some(helm.clone());
	}
	if let Some(flavor) = args.flavor {
		config.flavor = Some(flavor.into());
	}

	Ok(config)
}

fn run(args: &UncommenterCli) -> UncommentResult<()> {
	let config = load_config(args)?;
	let mut uncommenter = Uncommenter::from_config(&config)?;
	if args.no_lint {
		uncommenter = uncommenter.with_linter(None);
	}

	let input = std::fs::read_to_string(&args.input)?;
	let file = args.input.display().to_string();
	let result = uncommenter.transform(&input, &file)?;

	std::fs::write(&args.output, &result.output)?;
	tracing::debug!(output = %args.output.display(), "wrote output");
	if let Some(path) = &args.fixed {
		std::fs::write(path, &result.fixed)?;
	}
	if let Some(path) = &args.trace {
		let json = serde_json::to_string_pretty(&result.trace).map_err(std::io::Error::from)?;
		std::fs::write(path, json)?;
	}

	// Warnings reach stderr through the log unless it goes to a file.
	if args.log.is_some() {
		print_warnings(&result);
	}
	if args.diff {
		print_diff(&input, &result.output);
	}
	print_summary(&result, &args.input, &args.output);

	Ok(())
}

fn print_warnings(result: &Transformation) {
	for warning in result.trace.warnings() {
		let label = colored!("Warning:", yellow);
		if warning.line_no == 0 {
			eprintln!("{label} {}", warning.detail);
		} else {
			eprintln!("{label} line {}: {}", warning.line_no, warning.detail);
		}
	}
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("{}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("{}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!(" {change}");
			}
		}
	}
}

fn print_summary(result: &Transformation, input: &Path, output: &Path) {
	let uncommented = result
		.trace
		.decisions()
		.iter()
		.filter(|decision| matches!(decision.kind, DecisionKind::Uncommented { .. }))
		.count();
	let repaired = result
		.trace
		.decisions()
		.iter()
		.filter(|decision| matches!(decision.kind, DecisionKind::Repaired { .. }))
		.count();

	println!(
		"{} → {}: {uncommented} rows un-commented, {repaired} repairs, {} placeholders resolved, \
		 {} unresolved",
		input.display(),
		output.display(),
		result.resolve.resolved,
		result.resolve.unresolved,
	);
}
