use std::ops::Range;

use markdown::ParseOptions;
use markdown::mdast::Code;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::WritemeError;
use crate::WritemeResult;
use crate::tokens::CodeFence;
use crate::tokens::Document;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Parse markdown `content` into a [`Document`].
///
/// Fenced code blocks become [`TokenKind::CodeFence`] nodes with a single
/// raw text child holding their body. Text, inline code and indented code
/// keep their literal content in raw text nodes. Every other node is kept as
/// [`TokenKind::Other`] so the tree mirrors the structure of the document.
pub fn parse_markdown(content: impl Into<String>) -> WritemeResult<Document> {
	let content = content.into();
	let options = ParseOptions::gfm();
	let mdast = to_mdast(&content, &options).map_err(|e| WritemeError::Markdown(e.to_string()))?;
	let root = convert(&mdast, &content);

	Ok(Document::new(content, root))
}

fn convert(node: &Node, source: &str) -> Token {
	let span = node
		.position()
		.map(|position| position.start.offset..position.end.offset);

	match node {
		Node::Code(code) if is_fenced(source, span.as_ref()) => {
			let fence = CodeFence::new(code.lang.clone(), info_string(code), code.value.as_str());
			Token::new(
				TokenKind::CodeFence(fence),
				vec![Token::raw_text(code.value.as_str(), None)],
				span,
			)
		}
		Node::Code(code) => {
			Token::new(
				TokenKind::Other("code".into()),
				vec![Token::raw_text(code.value.as_str(), None)],
				span,
			)
		}
		Node::InlineCode(code) => {
			Token::new(
				TokenKind::Other("inlineCode".into()),
				vec![Token::raw_text(code.value.as_str(), None)],
				span,
			)
		}
		Node::Text(text) => Token::raw_text(text.value.as_str(), span),
		_ => {
			let kind = match node {
				Node::Root(_) => TokenKind::Document,
				_ => TokenKind::Other(node_name(node).into()),
			};
			let children = node
				.children()
				.map(|children| {
					children
						.iter()
						.map(|child| convert(child, source))
						.collect()
				})
				.unwrap_or_default();

			Token::new(kind, children, span)
		}
	}
}

/// Indented code blocks share the mdast `code` node with fenced ones. The
/// source decides which one it is.
fn is_fenced(source: &str, span: Option<&Range<usize>>) -> bool {
	let Some(opening) = span.and_then(|span| source.get(span.clone())) else {
		return false;
	};
	let opening = opening.trim_start_matches(' ');

	opening.starts_with("```") || opening.starts_with("~~~")
}

fn info_string(code: &Code) -> String {
	match (&code.lang, &code.meta) {
		(Some(lang), Some(meta)) => format!("{lang} {meta}"),
		(Some(lang), None) => lang.clone(),
		(None, Some(meta)) => meta.clone(),
		(None, None) => String::new(),
	}
}

fn node_name(node: &Node) -> &'static str {
	match node {
		Node::Root(_) => "root",
		Node::Blockquote(_) => "blockquote",
		Node::FootnoteDefinition(_) => "footnoteDefinition",
		Node::List(_) => "list",
		Node::ListItem(_) => "listItem",
		Node::Toml(_) => "toml",
		Node::Yaml(_) => "yaml",
		Node::Break(_) => "break",
		Node::InlineCode(_) => "inlineCode",
		Node::InlineMath(_) => "inlineMath",
		Node::Delete(_) => "delete",
		Node::Emphasis(_) => "emphasis",
		Node::Strong(_) => "strong",
		Node::FootnoteReference(_) => "footnoteReference",
		Node::Html(_) => "html",
		Node::Image(_) => "image",
		Node::ImageReference(_) => "imageReference",
		Node::Link(_) => "link",
		Node::LinkReference(_) => "linkReference",
		Node::Text(_) => "text",
		Node::Code(_) => "code",
		Node::Math(_) => "math",
		Node::Heading(_) => "heading",
		Node::Table(_) => "table",
		Node::TableRow(_) => "tableRow",
		Node::TableCell(_) => "tableCell",
		Node::ThematicBreak(_) => "thematicBreak",
		Node::Definition(_) => "definition",
		Node::Paragraph(_) => "paragraph",
		_ => "other",
	}
}
