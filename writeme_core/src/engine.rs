use std::sync::Arc;

use crate::Namespace;
use crate::RenderingResult;
use crate::Value;
use crate::WritemeError;
use crate::WritemeResult;
use crate::expression::evaluate;
use crate::namespace::Environment;
use crate::renderer::RendererOptions;
use crate::tokens::CodeFence;
use crate::tokens::Document;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Name of the global bound to the document being rendered.
pub const DOCUMENT_GLOBAL: &str = "document";

/// Options controlling which fences are treated as templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
	/// When set, only fences whose info string starts with this word are
	/// evaluated.
	pub fence_tag: Option<String>,
	/// Bind the token tree as the `document` global while rendering.
	pub expose_document: bool,
}

impl Default for EngineOptions {
	fn default() -> Self {
		Self {
			fence_tag: None,
			expose_document: true,
		}
	}
}

impl EngineOptions {
	pub fn accepts(&self, fence: &CodeFence) -> bool {
		match &self.fence_tag {
			None => true,
			Some(tag) => fence.info_string.split_whitespace().next() == Some(tag.as_str()),
		}
	}
}

/// Renders writeme blocks found in markdown documents against a
/// [`Namespace`].
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
	namespace: Namespace,
	options: EngineOptions,
}

impl TemplateEngine {
	pub fn new(namespace: Namespace) -> Self {
		Self {
			namespace,
			options: EngineOptions::default(),
		}
	}

	#[must_use]
	pub fn with_options(mut self, options: EngineOptions) -> Self {
		self.options = options;
		self
	}

	pub fn namespace(&self) -> &Namespace {
		&self.namespace
	}

	pub fn namespace_mut(&mut self) -> &mut Namespace {
		&mut self.namespace
	}

	pub fn options(&self) -> &EngineOptions {
		&self.options
	}

	/// Evaluate every template fence of `document` in place.
	pub fn render(&self, document: &mut Document) -> WritemeResult<()> {
		render_tree(&mut document.root, &self.namespace, &self.options)
	}

	/// Parse `content`, evaluate its template fences and serialize the result.
	pub fn render_markdown(&self, content: &str, renderer: &RendererOptions) -> WritemeResult<String> {
		let mut document = Document::parse(content)?;
		self.render(&mut document)?;

		Ok(document.render(renderer))
	}
}

/// Parse `content` and evaluate every fence against `namespace` with the
/// default options.
pub fn render_template(content: &str, namespace: &Namespace) -> WritemeResult<Document> {
	let mut document = Document::parse(content)?;
	render_tree(&mut document.root, namespace, &EngineOptions::default())?;

	Ok(document)
}

enum WalkState {
	NoActiveFence,
	/// Path of a template fence whose body has not been seen yet.
	AwaitingText(Vec<usize>),
}

enum Visit {
	Fence { accepted: bool },
	Text(String),
	Skip,
}

/// Walk `root` in document order, replacing the body of each template fence
/// with the result of evaluating it.
pub fn render_tree(root: &mut Token, namespace: &Namespace, options: &EngineOptions) -> WritemeResult<()> {
	if root.children.is_empty() {
		return Ok(());
	}

	let mut environment = namespace.export();
	if options.expose_document {
		environment.insert_global(DOCUMENT_GLOBAL, Value::Document(Arc::new(root.clone())));
	}

	let mut state = WalkState::NoActiveFence;
	let mut rendered = 0;

	for path in root.preorder_paths() {
		let visit = match root.get(&path).map(|token| &token.kind) {
			Some(TokenKind::CodeFence(fence)) => {
				Visit::Fence {
					accepted: options.accepts(fence),
				}
			}
			Some(TokenKind::RawText(text)) if matches!(state, WalkState::AwaitingText(_)) => {
				Visit::Text(text.content.clone())
			}
			_ => Visit::Skip,
		};

		match visit {
			Visit::Fence { accepted } => {
				tracing::trace!(?path, accepted, "visiting code fence");
				state = if accepted {
					WalkState::AwaitingText(path)
				} else {
					WalkState::NoActiveFence
				};
			}
			Visit::Text(expression) => {
				let WalkState::AwaitingText(fence_path) =
					std::mem::replace(&mut state, WalkState::NoActiveFence)
				else {
					continue;
				};

				if expression.trim().is_empty() {
					tracing::trace!(?fence_path, "skipping empty code fence");
					continue;
				}

				let result = evaluate_block(&expression, &environment)?;
				apply(root, &path, &fence_path, result);
				rendered += 1;
			}
			Visit::Skip => {}
		}
	}

	tracing::debug!(rendered, "rendered writeme blocks");

	Ok(())
}

fn evaluate_block(expression: &str, environment: &Environment) -> WritemeResult<RenderingResult> {
	tracing::debug!(expression = expression.trim(), "evaluating writeme block");

	evaluate(expression, environment)?
		.into_rendering()
		.map_err(|found| {
			WritemeError::ContractViolation {
				expression: expression.trim().to_string(),
				found: found.type_name().to_string(),
			}
		})
}

fn apply(root: &mut Token, text_path: &[usize], fence_path: &[usize], result: RenderingResult) {
	if let Some(TokenKind::RawText(text)) = root.get_mut(text_path).map(|token| &mut token.kind) {
		text.content = result.content;
	}

	let Some(language) = result.kind.language() else {
		return;
	};

	if let Some(TokenKind::CodeFence(fence)) = root.get_mut(fence_path).map(|token| &mut token.kind) {
		fence.language = Some(language.to_string());
		fence.info_string = language.to_string();
	}
}
