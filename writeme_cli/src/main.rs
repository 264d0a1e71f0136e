use std::path::Path;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use writeme_cli::Commands;
use writeme_cli::RenderArgs;
use writeme_cli::WritemeCli;
use writeme_core::Namespace;
use writeme_core::TemplateEngine;
use writeme_core::WritemeConfig;
use writeme_core::WritemeError;

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

fn main() {
	let args = WritemeCli::parse();
	init_tracing(args.verbose);

	// Respect NO_COLOR env var, --no-color flag and non-terminal output.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
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

	let result = match &args.command {
		Commands::Render {
			markdown_path,
			output,
			render,
		} => run_render(&args, markdown_path, output.as_deref(), render),
		Commands::Check {
			markdown_path,
			output,
			diff,
			render,
		} => run_check(&args, markdown_path, output, *diff, render),
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<WritemeError>() {
			Ok(writeme_err) => {
				let report: miette::Report = (*writeme_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so rendered markdown on stdout stays clean. `RUST_LOG`
/// takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr).with_target(false))
		.with(filter)
		.init();
}

fn load_config(args: &WritemeCli, render: &RenderArgs) -> Result<WritemeConfig, WritemeError> {
	let mut config = if let Some(path) = &args.config {
		let base = path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.unwrap_or(Path::new("."));
		WritemeConfig::load_file(path, base)?
	} else {
		let root = std::env::current_dir()?;
		match WritemeConfig::load(&root)? {
			Some(config) => config,
			None => WritemeConfig::default().relative_to(&root),
		}
	};

	if let Some(max_line_length) = render.max_line_length {
		config.render.max_line_length = Some(max_line_length);
	}
	if render.normalize_whitespaces {
		config.render.normalize_whitespace = true;
	}
	if let Some(tag) = &render.tag {
		config.render.fence_tag = Some(tag.clone());
	}
	if render.strict_commands {
		config.commands.strict = true;
	}

	Ok(config)
}

fn render_file(args: &WritemeCli, markdown_path: &Path, render: &RenderArgs) -> Result<String, WritemeError> {
	let config = load_config(args, render)?;
	let namespace = Namespace::with_builtins(&config)?;
	let engine = TemplateEngine::new(namespace).with_options(config.engine_options());
	let content = std::fs::read_to_string(markdown_path)?;

	tracing::debug!(path = %markdown_path.display(), "rendering markdown");
	engine.render_markdown(&content, &config.renderer_options())
}

fn run_render(
	args: &WritemeCli,
	markdown_path: &Path,
	output: Option<&Path>,
	render: &RenderArgs,
) -> Result<(), Box<dyn std::error::Error>> {
	let rendered = render_file(args, markdown_path, render)?;

	match output {
		Some(output) => {
			std::fs::write(output, rendered)?;
			println!("Rendered to {}", output.display());
		}
		None => print!("{rendered}"),
	}

	Ok(())
}

fn run_check(
	args: &WritemeCli,
	markdown_path: &Path,
	output: &Path,
	show_diff: bool,
	render: &RenderArgs,
) -> Result<(), Box<dyn std::error::Error>> {
	let expected = render_file(args, markdown_path, render)?;
	let current = if output.is_file() {
		std::fs::read_to_string(output)?
	} else {
		String::new()
	};

	if current == expected {
		println!("Check passed: {} is up to date.", output.display());
		return Ok(());
	}

	eprintln!(
		"{} {} is out of date. Run `writeme render {} --output {}` to update it.",
		colored!("stale:", yellow),
		output.display(),
		markdown_path.display(),
		output.display()
	);

	if show_diff {
		print_diff(&current, &expected);
	}

	process::exit(1);
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
