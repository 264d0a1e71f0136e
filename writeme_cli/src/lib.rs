use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render markdown documentation whose code fences run commands and show source.",
	long_about = "writeme renders markdown templates. Each fenced code block holds a single \
	              call, such as `show_help_menu(\"writeme\")`, and is replaced with the \
	              output of that call.\n\nQuick start:\n  writeme render readme.template.md -o \
	              readme.md\n  writeme check readme.template.md -o readme.md"
)]
pub struct WritemeCli {
	#[command(subcommand)]
	pub command: Commands,

	/// Path to a config file. Defaults to `writeme.toml`, `.writeme.toml` or
	/// `.config/writeme.toml` in the current directory.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render a markdown template.
	///
	/// Every fenced code block is evaluated as a call to a rendering function
	/// and its body is replaced with the result. The rendered markdown is
	/// printed to stdout unless `--output` is given.
	Render {
		/// The markdown template to render.
		markdown_path: PathBuf,

		/// Write the rendered markdown to this file.
		#[arg(long, short)]
		output: Option<PathBuf>,

		#[command(flatten)]
		render: RenderArgs,
	},
	/// Check that a rendered file is up to date with its template.
	///
	/// Renders the template and compares the result with the existing output
	/// file. Exits with status 1 when they differ.
	Check {
		/// The markdown template to render.
		markdown_path: PathBuf,

		/// The previously rendered file.
		#[arg(long, short)]
		output: PathBuf,

		/// Show a unified diff between the existing and expected content.
		#[arg(long, default_value_t = false)]
		diff: bool,

		#[command(flatten)]
		render: RenderArgs,
	},
}

/// Flags overriding the `[render]` and `[commands]` config sections.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderArgs {
	/// Wrap top-level paragraphs at this many characters.
	#[arg(long, visible_alias = "mxl")]
	pub max_line_length: Option<usize>,

	/// Collapse runs of whitespace inside paragraphs.
	#[arg(long, visible_alias = "norm", default_value_t = false)]
	pub normalize_whitespaces: bool,

	/// Only evaluate code fences whose info string starts with this tag.
	#[arg(long)]
	pub tag: Option<String>,

	/// Fail when a command cannot be run or exits with a non-zero status.
	#[arg(long, default_value_t = false)]
	pub strict_commands: bool,
}
