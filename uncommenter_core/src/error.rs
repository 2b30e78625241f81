use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum UncommentError {
	#[error(transparent)]
	#[diagnostic(code(uncommenter::io_error))]
	Io(#[from] std::io::Error),

	#[error("{file}:{line}: row is neither YAML nor commented text: `{row}`")]
	#[diagnostic(
		code(uncommenter::unparseable_row),
		help(
			"comment the row out, wrap it in a block scalar, or add its text to \
			 `whitelists.allowed_text` in the config file"
		)
	)]
	UnparseableRow {
		file: String,
		line: usize,
		row: String,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(uncommenter::config_parse),
		help("check that the config file is valid YAML with known top-level keys")
	)]
	ConfigParse(String),

	#[error("failed to parse lint config: {0}")]
	#[diagnostic(
		code(uncommenter::lint_config),
		help("the `lint` value uses yamllint syntax, e.g. `rules: {{line-length: {{max: 120}}}}`")
	)]
	LintConfig(String),

	#[error("unknown flavor: `{0}`")]
	#[diagnostic(
		code(uncommenter::unknown_flavor),
		help("available flavors: small-system, standard-system, large-system")
	)]
	UnknownFlavor(String),

	#[error("unknown value source: `{0}`")]
	#[diagnostic(
		code(uncommenter::unknown_source),
		help(
			"available sources: mrcf.recommended_value, mrcf.defaults_per_flavor, \
			 mrcf.default, yaml.defaults_per_flavor, helm.default, mrcf.example"
		)
	)]
	UnknownSource(String),

	#[error("failed to load parameter catalogue `{path}`: {reason}")]
	#[diagnostic(code(uncommenter::catalogue))]
	Catalogue { path: String, reason: String },

	#[error("failed to load helm values from `{path}`: {reason}")]
	#[diagnostic(code(uncommenter::helm_values))]
	HelmValues { path: String, reason: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(uncommenter::symlink_cycle),
		help("remove the circular symlink from the helm chart directory")
	)]
	SymlinkCycle { path: String },
}

pub type UncommentResult<T> = Result<T, UncommentError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
