use assert_cmd::Command;

pub fn uncommenter_cmd() -> Command {
	let mut cmd = Command::cargo_bin("uncommenter").unwrap_or_else(|e| panic!("binary: {e}"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("UNCOMMENTER_LOG");
	cmd
}

pub const CATALOGUE: &str = r#"{
  "parameters": [
    {"path": "/svc/port", "format": "integer", "recommended_value": 8080, "default": 80}
  ]
}"#;
