use std::sync::Arc;

use crate::CommandExecutor;
use crate::Namespace;
use crate::RenderingFunction;
use crate::RenderingResult;
use crate::SourceExtractor;
use crate::Value;
use crate::WritemeConfig;
use crate::WritemeResult;

/// Display language used by `show_source_code` when none is given.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "rust";

/// Runs `cmd` and shows what it printed.
pub fn show_command_output(executor: Arc<CommandExecutor>) -> RenderingFunction {
	RenderingFunction::new("show_command_output", move |args| {
		let output = executor.run(args.string("cmd")?)?;
		Ok(RenderingResult::console(output).into())
	})
	.param("cmd")
}

/// Shows the help menu of `cmd`.
pub fn show_help_menu(executor: Arc<CommandExecutor>) -> RenderingFunction {
	RenderingFunction::new("show_help_menu", move |args| {
		let output = executor.run(&format!("{} --help", args.string("cmd")?))?;
		Ok(RenderingResult::console(output).into())
	})
	.param("cmd")
}

/// Shows the source of the item at `import_path` (`module.path:Name`),
/// optionally reduced to its declaration.
pub fn show_source_code(extractor: Arc<SourceExtractor>) -> RenderingFunction {
	RenderingFunction::new("show_source_code", move |args| {
		let source = extractor.extract(args.string("import_path")?, args.bool("declaration_only")?)?;
		Ok(RenderingResult::code_like(source, args.string("language")?).into())
	})
	.param("import_path")
	.param_with_default("declaration_only", false)
	.param_with_default("language", Value::from(DEFAULT_SOURCE_LANGUAGE))
}

/// Register the built-in rendering functions into `namespace`.
pub fn register_builtins(
	namespace: &mut Namespace,
	executor: CommandExecutor,
	extractor: SourceExtractor,
) -> WritemeResult<()> {
	let executor = Arc::new(executor);
	namespace.register(show_command_output(Arc::clone(&executor)))?;
	namespace.register(show_help_menu(executor))?;
	namespace.register(show_source_code(Arc::new(extractor)))?;

	Ok(())
}

impl Namespace {
	/// A namespace holding the built-in functions, set up from `config`.
	pub fn with_builtins(config: &WritemeConfig) -> WritemeResult<Self> {
		let mut namespace = Self::new();
		register_builtins(&mut namespace, config.command_executor(), config.source_extractor())?;

		Ok(namespace)
	}
}
