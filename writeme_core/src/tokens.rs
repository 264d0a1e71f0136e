use std::ops::Range;

use crate::WritemeResult;
use crate::parser::parse_markdown;

/// A node of the markdown token tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub children: Vec<Token>,
	/// Byte range of the node in the source it was parsed from.
	pub span: Option<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TokenKind {
	/// The root of the tree.
	Document,
	/// A fenced code block. Its body is its single [`RawText`] child.
	CodeFence(CodeFence),
	/// Literal text: plain text, inline code and code block bodies.
	RawText(RawText),
	/// Any other markdown node, named after its mdast type (e.g.
	/// `paragraph`, `heading`, `inlineCode`).
	Other(String),
}

/// The mutable part of a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFence {
	/// The language, i.e. the first word of the info string.
	pub language: Option<String>,
	/// Everything after the opening fence marker. This is what the renderer
	/// writes back.
	pub info_string: String,
	original_info: String,
	original_content: String,
}

impl CodeFence {
	pub fn new(language: Option<String>, info_string: impl Into<String>, content: impl Into<String>) -> Self {
		let info_string = info_string.into();
		Self {
			language,
			original_info: info_string.clone(),
			info_string,
			original_content: content.into(),
		}
	}

	/// The body as it was parsed.
	pub fn original_content(&self) -> &str {
		&self.original_content
	}

	/// Whether the fence differs from what was parsed, given its current body.
	pub fn is_modified(&self, content: &str) -> bool {
		self.info_string != self.original_info || content != self.original_content
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
	pub content: String,
}

impl Token {
	pub fn new(kind: TokenKind, children: Vec<Token>, span: Option<Range<usize>>) -> Self {
		Self {
			kind,
			children,
			span,
		}
	}

	pub fn raw_text(content: impl Into<String>, span: Option<Range<usize>>) -> Self {
		Self::new(
			TokenKind::RawText(RawText {
				content: content.into(),
			}),
			vec![],
			span,
		)
	}

	pub fn children(&self) -> &[Token] {
		&self.children
	}

	pub fn as_code_fence(&self) -> Option<&CodeFence> {
		match &self.kind {
			TokenKind::CodeFence(fence) => Some(fence),
			_ => None,
		}
	}

	pub fn as_raw_text(&self) -> Option<&RawText> {
		match &self.kind {
			TokenKind::RawText(text) => Some(text),
			_ => None,
		}
	}

	/// The body of a code fence, read from its first raw text child.
	pub fn fence_content(&self) -> Option<&str> {
		self.as_code_fence()?;
		Some(
			self.children
				.iter()
				.find_map(Token::as_raw_text)
				.map_or("", |text| text.content.as_str()),
		)
	}

	/// Iterate over this node and all of its descendants in document order.
	pub fn iter(&self) -> Preorder<'_> {
		Preorder { stack: vec![self] }
	}

	/// The child index paths of every node in document order, starting with
	/// the empty path of this node.
	pub fn preorder_paths(&self) -> Vec<Vec<usize>> {
		let mut paths = vec![];
		let mut stack: Vec<(Vec<usize>, &Token)> = vec![(vec![], self)];

		while let Some((path, token)) = stack.pop() {
			for (index, child) in token.children.iter().enumerate().rev() {
				let mut child_path = path.clone();
				child_path.push(index);
				stack.push((child_path, child));
			}
			paths.push(path);
		}

		paths
	}

	pub fn get(&self, path: &[usize]) -> Option<&Token> {
		path.iter()
			.try_fold(self, |token, index| token.children.get(*index))
	}

	pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Token> {
		path.iter()
			.try_fold(self, |token, index| token.children.get_mut(*index))
	}
}

/// Pre-order iterator over a token tree, driven by an explicit stack.
pub struct Preorder<'a> {
	stack: Vec<&'a Token>,
}

impl<'a> Iterator for Preorder<'a> {
	type Item = &'a Token;

	fn next(&mut self) -> Option<Self::Item> {
		let token = self.stack.pop()?;
		self.stack.extend(token.children.iter().rev());
		Some(token)
	}
}

/// A parsed markdown document: the source text and its token tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	source: String,
	pub root: Token,
}

impl Document {
	pub fn new(source: impl Into<String>, root: Token) -> Self {
		Self {
			source: source.into(),
			root,
		}
	}

	/// Parse markdown `content` into a document.
	pub fn parse(content: impl Into<String>) -> WritemeResult<Self> {
		parse_markdown(content)
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	/// All code fences in document order.
	pub fn code_fences(&self) -> impl Iterator<Item = &Token> {
		self.root
			.iter()
			.filter(|token| matches!(token.kind, TokenKind::CodeFence(_)))
	}
}
