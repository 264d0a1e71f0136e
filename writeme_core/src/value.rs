use std::fmt::Display;
use std::sync::Arc;

use float_cmp::approx_eq;

use crate::tokens::Token;

/// The default language tag for code-like output produced by commands.
pub const CONSOLE_LANGUAGE: &str = "console";

/// How the content of a [`RenderingResult`] should be displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum RenderKind {
	/// Plain content. The fence keeps whatever language it already had.
	#[default]
	Inline,
	/// Content that should be highlighted as `language`. The fence's language
	/// and info string are both rewritten.
	CodeLike { language: String },
}

impl RenderKind {
	/// Code-like output tagged with `language`.
	pub fn code_like(language: impl Into<String>) -> Self {
		Self::CodeLike {
			language: language.into(),
		}
	}

	/// Code-like output tagged as `console`.
	pub fn console() -> Self {
		Self::code_like(CONSOLE_LANGUAGE)
	}

	/// The display language, if any.
	pub fn language(&self) -> Option<&str> {
		match self {
			Self::Inline => None,
			Self::CodeLike { language } => Some(language.as_str()),
		}
	}
}

/// The outcome of evaluating one writeme block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderingResult {
	/// The text that replaces the body of the fence.
	pub content: String,
	/// How the content should be displayed.
	pub kind: RenderKind,
}

impl RenderingResult {
	pub fn new(content: impl Into<String>, kind: RenderKind) -> Self {
		Self {
			content: content.into(),
			kind,
		}
	}

	pub fn inline(content: impl Into<String>) -> Self {
		Self::new(content, RenderKind::Inline)
	}

	pub fn code_like(content: impl Into<String>, language: impl Into<String>) -> Self {
		Self::new(content, RenderKind::code_like(language))
	}

	pub fn console(content: impl Into<String>) -> Self {
		Self::new(content, RenderKind::console())
	}
}

/// A value manipulated by the expression interpreter.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Value {
	/// `none` / `None`
	None,
	/// `true` / `false` (or `True` / `False`)
	Bool(bool),
	/// An integer literal, e.g. `42`
	Int(i64),
	/// A floating point literal, e.g. `1.5`
	Float(f64),
	/// A quoted string literal, e.g. `"ls -la"`
	String(String),
	/// The result of a rendering function.
	Rendering(RenderingResult),
	/// A snapshot of the document being rendered.
	Document(Arc<Token>),
}

impl Value {
	/// A short name for the type of this value, used in error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Bool(_) => "a boolean",
			Self::Int(_) => "an integer",
			Self::Float(_) => "a float",
			Self::String(_) => "a string",
			Self::Rendering(_) => "a rendering result",
			Self::Document(_) => "a document",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value.as_str()),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_document(&self) -> Option<&Token> {
		match self {
			Self::Document(token) => Some(token.as_ref()),
			_ => None,
		}
	}

	/// Consume the value, keeping it only if it is a [`RenderingResult`].
	pub fn into_rendering(self) -> Result<RenderingResult, Self> {
		match self {
			Self::Rendering(rendering) => Ok(rendering),
			other => Err(other),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::None, Self::None) => true,
			(Self::Bool(value), Self::Bool(other_value)) => value == other_value,
			(Self::Int(value), Self::Int(other_value)) => value == other_value,
			(Self::Float(value), Self::Float(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Self::String(value), Self::String(other_value)) => value == other_value,
			(Self::Rendering(value), Self::Rendering(other_value)) => value == other_value,
			(Self::Document(value), Self::Document(other_value)) => Arc::ptr_eq(value, other_value),
			_ => false,
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::None => write!(f, "none"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::String(value) => write!(f, "{value:?}"),
			Self::Rendering(rendering) => write!(f, "{:?}", rendering.content),
			Self::Document(_) => write!(f, "<document>"),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<RenderingResult> for Value {
	fn from(value: RenderingResult) -> Self {
		Self::Rendering(value)
	}
}
