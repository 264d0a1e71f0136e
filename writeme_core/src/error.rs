use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum WritemeError {
	#[error(transparent)]
	#[diagnostic(code(writeme::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(writeme::markdown))]
	Markdown(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(writeme::config_parse),
		help("check that writeme.toml is valid TOML with [render], [source] and/or [commands] sections")
	)]
	ConfigParse(String),

	#[error("invalid source reference `{0}`")]
	#[diagnostic(
		code(writeme::invalid_reference),
		help("references are written as `module.path:ItemName`, e.g. `engine:TemplateEngine`")
	)]
	InvalidReference(String),

	#[error("failed to find module `{module}` in any source root")]
	#[diagnostic(
		code(writeme::module_not_found),
		help("searched: {searched}")
	)]
	ModuleNotFound { module: String, searched: String },

	#[error("failed to find `{object}` in module `{module}`")]
	#[diagnostic(
		code(writeme::object_not_found),
		help("only top-level items of the module file can be referenced")
	)]
	ObjectNotFound { module: String, object: String },

	#[error("cannot strip the body of `{0}`")]
	#[diagnostic(
		code(writeme::unsupported_declaration),
		help("declaration_only supports functions and structs, enums, unions or traits with a body")
	)]
	UnsupportedDeclaration(String),

	#[error("namespace function does not comply with expected signature: `{expression}` produced {found}")]
	#[diagnostic(
		code(writeme::contract_violation),
		help("rendering functions must return a RenderingResult")
	)]
	ContractViolation { expression: String, found: String },

	#[error("`{0}` is already declared in the namespace")]
	#[diagnostic(code(writeme::duplicate_registration))]
	DuplicateRegistration(String),

	#[error("invalid expression `{expression}`: {reason}")]
	#[diagnostic(
		code(writeme::invalid_expression),
		help("a writeme block holds a single call, e.g. `show_command_output(\"ls -la\")`")
	)]
	InvalidExpression { expression: String, reason: String },

	#[error("unknown name: `{0}`")]
	#[diagnostic(code(writeme::unknown_name))]
	UnknownName(String),

	#[error("`{0}` is not callable")]
	#[diagnostic(code(writeme::not_callable))]
	NotCallable(String),

	#[error("invalid arguments for `{function}`: {reason}")]
	#[diagnostic(code(writeme::invalid_arguments))]
	InvalidArguments { function: String, reason: String },

	#[error("argument `{parameter}` of `{function}` expects {expected}, got {found}")]
	#[diagnostic(code(writeme::invalid_argument_type))]
	InvalidArgumentType {
		function: String,
		parameter: String,
		expected: String,
		found: String,
	},

	#[error("command `{command}` exited with status {status}")]
	#[diagnostic(
		code(writeme::command_failed),
		help("{stderr}")
	)]
	CommandFailed {
		command: String,
		status: String,
		stderr: String,
	},
}

pub type WritemeResult<T> = Result<T, WritemeError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
