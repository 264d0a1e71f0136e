mod common;

use rstest::rstest;
use writeme_core::AnyEmptyResult;

const MIXED: &str = "```rust\nfn main() {}\n```\n\n```writeme\nshow_source_code('lib:greet', True)\n```\n";

#[rstest]
#[case::root("writeme.toml")]
#[case::dotfile(".writeme.toml")]
#[case::config_dir(".config/writeme.toml")]
fn discovers_config_file(#[case] location: &str) -> AnyEmptyResult {
	let tmp = common::project(MIXED)?;
	let config_path = tmp.path().join(location);
	if let Some(parent) = config_path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&config_path, "[render]\nfence_tag = \"writeme\"\n")?;

	common::writeme_cmd()
		.current_dir(tmp.path())
		.args(["render", "template.md"])
		.assert()
		.success()
		.stdout(predicates::str::starts_with("```rust\nfn main() {}\n```\n\n```rust\n/// Greets someone."));

	Ok(())
}

#[test]
fn explicit_config_resolves_paths_against_its_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let docs = tmp.path().join("docs");
	std::fs::create_dir_all(docs.join("code"))?;
	std::fs::write(docs.join("code/lib.rs"), common::LIB_SOURCE)?;
	std::fs::write(docs.join("writeme.toml"), "[source]\nroots = [\"code\"]\n")?;
	std::fs::write(tmp.path().join("template.md"), "```\nshow_source_code('lib:greet', True)\n```\n")?;

	common::writeme_cmd()
		.current_dir(tmp.path())
		.args(["render", "template.md", "--config"])
		.arg(docs.join("writeme.toml"))
		.assert()
		.success()
		.stdout(predicates::str::contains("pub fn greet(name: &str) -> String {"));

	Ok(())
}

#[test]
fn flags_override_config() -> AnyEmptyResult {
	let tmp = common::project("One two three four five six.\n")?;
	std::fs::write(tmp.path().join("writeme.toml"), "[render]\nmax_line_length = 100\n")?;

	common::writeme_cmd()
		.current_dir(tmp.path())
		.args(["render", "template.md", "--max-line-length", "10"])
		.assert()
		.success()
		.stdout(predicates::str::diff("One two\nthree four\nfive six.\n"));

	Ok(())
}

#[test]
fn invalid_config_exits_with_error() -> AnyEmptyResult {
	let tmp = common::project(MIXED)?;
	std::fs::write(tmp.path().join("writeme.toml"), "[render\n")?;

	common::writeme_cmd()
		.current_dir(tmp.path())
		.args(["render", "template.md"])
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}
