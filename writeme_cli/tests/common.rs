#![allow(dead_code)]

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const LIB_SOURCE: &str = "/// Greets someone.\npub fn greet(name: &str) -> String {\n\tformat!(\"hello {name}\")\n}\n";

pub fn writeme_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("writeme"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// A project holding `src/lib.rs` and the template `template.md`.
pub fn project(template: &str) -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("src"))?;
	std::fs::write(tmp.path().join("src/lib.rs"), LIB_SOURCE)?;
	std::fs::write(tmp.path().join("template.md"), template)?;
	Ok(tmp)
}
