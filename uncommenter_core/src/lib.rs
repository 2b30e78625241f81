//! `uncommenter_core` turns a commented YAML template into a usable document.
//! Commented data rows are un-commented, commented prose stays commented,
//! structural damage is repaired, and `{{ … }}` placeholders are replaced with
//! values from a parameter catalogue, Helm chart values, or the placeholder's
//! own per-flavor defaults.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Commented YAML template
//!   → Preprocessor (sentinel-tags JSON blocks, prose and block-scalar bodies)
//!   → Block folder (reverse scan; un-comments rows the oracle accepts)
//!   → Post-processor & indent fixer (strips sentinels, repairs odd indents)
//!   → Repair loop (lints, applies targeted repairs to a fixed point)
//!   → Value resolver (resolves placeholders by path and source priority)
//! ```
//!
//! ## Modules
//!
//! - [`oracle`]: The well-formedness predicate: a permissive YAML load plus
//!   the semantic filter bank.
//! - [`fold`]: The reverse block folder.
//! - [`lint`]: The [`lint::Linter`] trait and the built-in
//!   [`lint::YamlLinter`].
//! - [`resolver`]: Backtracking path resolution over the
//!   [`structure::StructureTree`] and placeholder rewriting.
//! - [`mrcf`] and [`helm`]: Loaders for the external value sources.
//!
//! ## Key Types
//!
//! - [`Uncommenter`]: Settings and sources for a run; [`Uncommenter::transform`]
//!   runs every stage.
//! - [`Transformation`]: The repaired document, the final document, and the
//!   decision [`Trace`].
//! - [`UncommenterConfig`]: Configuration loaded from a YAML file.
//!
//! ## Quick Start
//!
//! ```rust
//! use uncommenter_core::Uncommenter;
//!
//! let input = "a:\n  # b: 1\n  c: 2\n";
//! let result = Uncommenter::new().transform(input, "values.yaml").unwrap();
//! assert_eq!(result.output, "a:\n  b: 1\n  c: 2\n");
//! ```

pub use config::*;
pub use error::*;
pub use pipeline::*;
pub use trace::*;

pub mod config;
#[allow(unused_assignments)]
mod error;
pub mod fold;
pub mod helm;
pub mod indent;
pub mod line;
pub mod lint;
pub mod loader;
pub mod mrcf;
pub mod oracle;
pub mod path;
mod pipeline;
pub mod preprocess;
pub mod repair;
pub mod resolver;
pub mod structure;
mod trace;
pub mod whitelist;

#[cfg(test)]
mod __fixtures;
