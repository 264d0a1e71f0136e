use std::ops::Range;

use crate::tokens::CodeFence;
use crate::tokens::Document;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Formatting applied when a [`Document`] is written back to markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererOptions {
	/// Re-wrap top-level paragraphs so lines stay within this many
	/// characters where word boundaries allow it.
	pub max_line_length: Option<usize>,
	/// Collapse runs of whitespace inside top-level paragraphs.
	pub normalize_whitespace: bool,
}

impl RendererOptions {
	fn formats_paragraphs(&self) -> bool {
		self.max_line_length.is_some() || self.normalize_whitespace
	}
}

/// A replacement of `range` in the source text.
struct Edit {
	range: Range<usize>,
	content: String,
}

impl Document {
	/// Serialize the document back to markdown.
	///
	/// Only code fences that were modified since parsing, and paragraphs
	/// touched by `options`, are re-emitted. Everything else is copied from
	/// the source as is.
	pub fn render(&self, options: &RendererOptions) -> String {
		let source = self.source();
		let eol = line_ending(source);
		let mut edits = vec![];

		for token in self.root.iter() {
			let (Some(fence), Some(span)) = (token.as_code_fence(), &token.span) else {
				continue;
			};
			let content = token.fence_content().unwrap_or_default();

			if fence.is_modified(content) {
				if let Some(original) = source.get(span.clone()) {
					edits.push(Edit {
						range: span.clone(),
						content: render_fence(original, fence, content, eol),
					});
				}
			}
		}

		if options.formats_paragraphs() {
			for paragraph in self.root.children() {
				if let Some(edit) = format_paragraph(source, paragraph, options, eol) {
					edits.push(edit);
				}
			}
		}

		// Apply from the end so earlier offsets stay valid.
		edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

		let mut result = source.to_string();
		for edit in edits {
			if edit.range.end <= result.len() {
				result.replace_range(edit.range, &edit.content);
			}
		}

		result
	}
}

/// The line ending used by `source`, judged by its first line break.
fn line_ending(source: &str) -> &'static str {
	match source.find('\n') {
		Some(position) if source[..position].ends_with('\r') => "\r\n",
		_ => "\n",
	}
}

/// Re-emit a fence with its current info string and body, keeping the
/// marker, indentation and container prefix of `original`.
fn render_fence(original: &str, fence: &CodeFence, content: &str, eol: &str) -> String {
	let mut lines = original.lines();
	let opening = lines.next().unwrap_or_default();
	let indent = &opening[..opening.len() - opening.trim_start().len()];
	let marker = opening.trim_start().chars().next().unwrap_or('`');
	let opening_length = leading_run(opening.trim_start(), marker);

	let closing = original.lines().skip(1).last().and_then(|line| {
		let position = line.find(marker)?;
		let run = &line[position..];
		let closes = leading_run(run, marker) >= opening_length && run.trim_end().chars().all(|c| c == marker);
		closes.then(|| &line[..position])
	});
	let prefix = closing
		.or_else(|| body_prefix(lines, fence.original_content()))
		.unwrap_or(indent);

	let body = content.strip_suffix('\n').unwrap_or(content);
	let longest_inner = body
		.lines()
		.map(|line| leading_run(line.trim_start(), marker))
		.max()
		.unwrap_or(0);
	let length = opening_length.max(longest_inner + 1);
	let fence_marker = marker.to_string().repeat(length);

	let mut result = format!("{indent}{fence_marker}{}{eol}", fence.info_string);
	if !content.is_empty() {
		for line in body.split('\n') {
			let line = line.strip_suffix('\r').unwrap_or(line);
			if line.is_empty() {
				result.push_str(prefix.trim_end());
			} else {
				result.push_str(prefix);
				result.push_str(line);
			}
			result.push_str(eol);
		}
	}
	result.push_str(prefix);
	result.push_str(&fence_marker);

	// An unterminated fence runs to the end of its container, line break
	// included.
	if original.ends_with('\n') {
		result.push_str(eol);
	}

	result
}

/// The container prefix of an unterminated fence: what precedes the parsed
/// text on its first non-blank body line.
fn body_prefix<'a>(body_lines: impl Iterator<Item = &'a str>, parsed: &str) -> Option<&'a str> {
	body_lines.zip(parsed.lines()).find_map(|(line, text)| {
		if text.is_empty() {
			return None;
		}
		line.strip_suffix(text)
	})
}

fn leading_run(text: &str, marker: char) -> usize {
	text.chars().take_while(|c| *c == marker).count()
}

fn format_paragraph(source: &str, paragraph: &Token, options: &RendererOptions, eol: &str) -> Option<Edit> {
	if !matches!(&paragraph.kind, TokenKind::Other(name) if name == "paragraph") {
		return None;
	}

	let span = paragraph.span.clone()?;
	let original = source.get(span.clone())?;
	let has_hard_break = paragraph
		.iter()
		.any(|token| matches!(&token.kind, TokenKind::Other(name) if name == "break"));

	// Code spans are literal text and never split or collapsed.
	let code_spans: Vec<Range<usize>> = paragraph
		.iter()
		.filter(|token| matches!(&token.kind, TokenKind::Other(name) if name == "inlineCode"))
		.filter_map(|token| token.span.clone())
		.map(|code| code.start.saturating_sub(span.start)..code.end.saturating_sub(span.start))
		.collect();

	let formatted = match options.max_line_length {
		Some(width) if !has_hard_break => wrap(original, width, &code_spans, eol),
		_ if options.normalize_whitespace => normalize(original, &code_spans, eol),
		_ => return None,
	};

	(formatted != original).then_some(Edit {
		range: span,
		content: formatted,
	})
}

/// Split `text` on whitespace that falls outside `protected`. `offset` is
/// the position of `text` within the paragraph the ranges refer to.
fn words<'a>(text: &'a str, offset: usize, protected: &[Range<usize>]) -> Vec<&'a str> {
	let mut words = vec![];
	let mut start = None;

	for (index, c) in text.char_indices() {
		let splits = c.is_whitespace() && !protected.iter().any(|range| range.contains(&(offset + index)));
		match (splits, start) {
			(true, Some(begin)) => {
				words.push(&text[begin..index]);
				start = None;
			}
			(false, None) => start = Some(index),
			_ => {}
		}
	}

	if let Some(begin) = start {
		words.push(&text[begin..]);
	}

	words
}

/// Collapse whitespace runs on every line and trim line ends, keeping hard
/// breaks written as two trailing spaces.
fn normalize(paragraph: &str, protected: &[Range<usize>], eol: &str) -> String {
	let mut lines = vec![];
	let mut offset = 0;

	for line in paragraph.split('\n') {
		let collapsed = words(line, offset, protected).join(" ");
		let trimmed = line.strip_suffix('\r').unwrap_or(line);
		offset += line.len() + 1;

		if trimmed.ends_with("  ") && !collapsed.is_empty() {
			lines.push(format!("{collapsed}  "));
		} else {
			lines.push(collapsed);
		}
	}

	lines.join(eol)
}

/// Greedy word wrap. A word that would start a new line as a block marker
/// stays on the previous line instead.
fn wrap(paragraph: &str, width: usize, protected: &[Range<usize>], eol: &str) -> String {
	let mut lines: Vec<String> = vec![];
	let mut current = String::new();

	for word in words(paragraph, 0, protected) {
		let fits = current.chars().count() + 1 + word.chars().count() <= width;
		if current.is_empty() {
			current.push_str(word);
		} else if fits || starts_block(word) {
			current.push(' ');
			current.push_str(word);
		} else {
			lines.push(std::mem::take(&mut current));
			current.push_str(word);
		}
	}

	if !current.is_empty() {
		lines.push(current);
	}

	lines.join(eol)
}

fn starts_block(word: &str) -> bool {
	if word.starts_with(['#', '>', '-', '+', '*', '=', '|', '`', '~']) {
		return true;
	}

	let digits = word.chars().take_while(char::is_ascii_digit).count();
	digits > 0 && word[digits..].starts_with(['.', ')'])
}
