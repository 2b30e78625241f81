mod common;

use common::CATALOGUE;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use uncommenter_core::AnyEmptyResult;

#[test]
fn uncomments_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	std::fs::write(&input, "a:\n  # b: 1\n  c: 2\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.assert()
		.success()
		.stdout(predicates::str::contains("1 rows un-commented"));

	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "a:\n  b: 1\n  c: 2\n");

	Ok(())
}

#[test]
fn prose_row_aborts_without_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	std::fs::write(&input, "a: 1\nThis README section is mandatory reading.\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("row is neither YAML nor commented text")
				.and(predicates::str::contains("This README section is mandatory reading.")),
		);

	assert!(!output.exists());

	Ok(())
}

#[test]
fn missing_input_is_an_io_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let output = tmp.path().join("values.yaml");

	let _ = common::uncommenter_cmd()
		.arg(tmp.path().join("missing.yaml"))
		.arg(&output)
		.assert()
		.code(2);

	assert!(!output.exists());

	Ok(())
}

#[test]
fn resolves_placeholders_from_catalogue() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	let catalogue = tmp.path().join("catalogue.json");
	std::fs::write(&catalogue, CATALOGUE)?;
	std::fs::write(
		&input,
		"svc:\n  port: {{80|8080|9090}}\n  replicas: {{1|3|5}}\n",
	)?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--mrcf")
		.arg(&catalogue)
		.arg("--flavor")
		.arg("large-system")
		.assert()
		.success()
		.stdout(predicates::str::contains("2 placeholders resolved"))
		.stderr(predicates::str::contains(
			"Cannot find path /svc/replicas, please check manually",
		));

	similar_asserts::assert_eq!(
		std::fs::read_to_string(&output)?,
		"svc:\n  port: 8080\n  replicas: 5\n"
	);

	Ok(())
}

#[test]
fn command_line_overrides_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	let config = tmp.path().join("uncommenter.yaml");
	std::fs::write(&input, "replicas: {{1|3|5}}\n")?;
	std::fs::write(&config, "flavor: small-system\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--config")
		.arg(&config)
		.assert()
		.success();
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "replicas: 1\n");

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--config")
		.arg(&config)
		.arg("--flavor")
		.arg("large-system")
		.assert()
		.success();
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "replicas: 5\n");

	Ok(())
}

#[test]
fn config_paths_resolve_against_config_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let settings = tmp.path().join("settings");
	std::fs::create_dir_all(&settings)?;
	std::fs::write(settings.join("catalogue.json"), CATALOGUE)?;
	std::fs::write(settings.join("uncommenter.yaml"), "mrcf: catalogue.json\n")?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	std::fs::write(&input, "svc:\n  port: {{ }}\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--config")
		.arg(settings.join("uncommenter.yaml"))
		.assert()
		.success();

	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "svc:\n  port: 8080\n");

	Ok(())
}

#[test]
fn invalid_config_is_a_configuration_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	let config = tmp.path().join("uncommenter.yaml");
	std::fs::write(&input, "a: 1\n")?;
	std::fs::write(&config, "flavour: small-system\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--config")
		.arg(&config)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	assert!(!output.exists());

	Ok(())
}

#[test]
fn writes_fixed_document_and_trace() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	let fixed = tmp.path().join("fixed.yaml");
	let trace = tmp.path().join("trace.json");
	std::fs::write(&input, "a:\n  # b: 1\n  c: {{1|2|3}}\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--fixed")
		.arg(&fixed)
		.arg("--trace")
		.arg(&trace)
		.assert()
		.success();

	similar_asserts::assert_eq!(
		std::fs::read_to_string(&fixed)?,
		"a:\n  b: 1\n  c: {{1|2|3}}\n"
	);
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "a:\n  b: 1\n  c: 2\n");

	let records: Value = serde_json::from_str(&std::fs::read_to_string(&trace)?)?;
	let records = records.as_array().cloned().unwrap_or_default();
	assert!(records.iter().any(|record| {
		record["kind"] == "uncommented" && record["line_no"] == 2 && record["status"] == 1
	}));
	assert!(records.iter().any(|record| {
		record["kind"] == "value-resolved"
			&& record["source"] == "yaml.defaults_per_flavor"
			&& record["path"] == "a.c"
	}));

	Ok(())
}

#[test]
fn no_lint_skips_repair() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	std::fs::write(&input, "foo: {}\n- a\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--no-lint")
		.assert()
		.success()
		.stderr(predicates::str::contains("linter unavailable"));
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "foo: {}\n- a\n");

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.assert()
		.success()
		.stdout(predicates::str::contains("1 repairs"));
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "foo:\n- a\n");

	Ok(())
}

#[test]
fn diff_shows_changed_rows() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	std::fs::write(&input, "a:\n  # b: 1\n  c: 2\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--diff")
		.assert()
		.success()
		.stdout(
			predicates::str::contains("-  # b: 1")
				.and(predicates::str::contains("+  b: 1"))
				.and(predicates::str::contains("   c: 2")),
		);

	Ok(())
}

#[test]
fn log_file_receives_warnings() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = tmp.path().join("values.tpl.yaml");
	let output = tmp.path().join("values.yaml");
	let log = tmp.path().join("uncommenter.log");
	std::fs::write(&input, "svc:\n  name: {{ }}\n")?;

	let _ = common::uncommenter_cmd()
		.arg(&input)
		.arg(&output)
		.arg("--log")
		.arg(&log)
		.assert()
		.success()
		.stdout(predicates::str::contains("1 unresolved"))
		.stderr(predicates::str::contains("Warning: line 2: no value found for `svc.name`"));

	let contents = std::fs::read_to_string(&log)?;
	assert!(contents.contains("no value found for `svc.name`"));
	assert!(!contents.contains('\u{1b}'));
	similar_asserts::assert_eq!(std::fs::read_to_string(&output)?, "svc:\n  name: {{ }}\n");

	Ok(())
}
