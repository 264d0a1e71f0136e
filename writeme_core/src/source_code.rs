use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use logos::Lexer;
use logos::Logos;

use crate::WritemeError;
use crate::WritemeResult;

/// The placeholder that replaces a stripped body.
pub const BODY_PLACEHOLDER: &str = "...";

/// Source roots searched when no configuration is provided.
pub const DEFAULT_SOURCE_ROOTS: [&str; 2] = ["src", "."];

const BODY_INDENT: &str = "    ";

/// A parsed `module.path:ItemName` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
	/// Dot-separated module path, e.g. `engine` or `my_crate.engine`.
	pub module: String,
	/// Name of a top-level item in that module.
	pub object: String,
}

impl SourceReference {
	/// Parse a reference without touching the file system.
	pub fn parse(reference: &str) -> WritemeResult<Self> {
		let invalid = || WritemeError::InvalidReference(reference.to_string());
		let mut parts = reference.split(':');
		let (Some(module), Some(object), None) = (parts.next(), parts.next(), parts.next()) else {
			return Err(invalid());
		};

		let module = module.trim();
		let object = object.trim();

		if !module.split('.').all(is_identifier) || !is_identifier(object) {
			return Err(invalid());
		}

		Ok(Self {
			module: module.to_string(),
			object: object.to_string(),
		})
	}

	/// Relative file paths that may hold this module, in lookup order.
	pub fn candidate_paths(&self) -> Vec<PathBuf> {
		let segments: Vec<&str> = self.module.split('.').collect();
		let relative: PathBuf = segments.iter().collect();
		let mut candidates = vec![
			relative.with_extension("rs"),
			relative.join("mod.rs"),
			relative.join("lib.rs"),
			relative.join("src").join("lib.rs"),
		];

		if let [first, rest @ ..] = segments.as_slice() {
			if !rest.is_empty() {
				let nested: PathBuf = rest.iter().collect();
				let in_crate = Path::new(first).join("src").join(nested);
				candidates.push(in_crate.with_extension("rs"));
				candidates.push(in_crate.join("mod.rs"));
			}
		}

		candidates
	}
}

/// Resolves references to items in a Rust source tree and returns their
/// source text.
#[derive(Debug, Clone)]
pub struct SourceExtractor {
	roots: Vec<PathBuf>,
}

impl Default for SourceExtractor {
	fn default() -> Self {
		Self::new(DEFAULT_SOURCE_ROOTS.iter().map(PathBuf::from))
	}
}

impl SourceExtractor {
	pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
		Self {
			roots: roots.into_iter().map(Into::into).collect(),
		}
	}

	pub fn roots(&self) -> &[PathBuf] {
		&self.roots
	}

	/// Return the source of the item at `reference`, or only its declaration
	/// when `declaration_only` is set.
	pub fn extract(&self, reference: &str, declaration_only: bool) -> WritemeResult<String> {
		let reference = SourceReference::parse(reference)?;
		let module_path = self.resolve_module(&reference)?;
		tracing::debug!(
			module = %reference.module,
			object = %reference.object,
			path = %module_path.display(),
			"extracting source"
		);

		let module_source = std::fs::read_to_string(&module_path)?;
		let source = item_source(&module_source, &reference.object).ok_or_else(|| {
			WritemeError::ObjectNotFound {
				module: reference.module.clone(),
				object: reference.object.clone(),
			}
		})?;

		if declaration_only {
			strip_declaration_body(&source)
		} else {
			Ok(source)
		}
	}

	/// Find the file that holds the module of `reference`.
	pub fn resolve_module(&self, reference: &SourceReference) -> WritemeResult<PathBuf> {
		let candidates = reference.candidate_paths();
		let mut searched = vec![];

		for root in &self.roots {
			for candidate in &candidates {
				let path = root.join(candidate);
				if path.is_file() {
					return Ok(path);
				}
				searched.push(path.display().to_string());
			}
		}

		Err(WritemeError::ModuleNotFound {
			module: reference.module.clone(),
			searched: searched.join(", "),
		})
	}
}

/// The source text of the first top-level item named `name`, from its first
/// attribute or doc comment to its end, followed by a newline.
pub fn item_source(source: &str, name: &str) -> Option<String> {
	scan_items(source)
		.into_iter()
		.find(|item| item.name.as_deref() == Some(name))
		.map(|item| format!("{}\n", &source[item.span]))
}

/// Keep the header of the first item in `source` and replace its body with
/// the body's inner doc comments followed by [`BODY_PLACEHOLDER`].
pub fn strip_declaration_body(source: &str) -> WritemeResult<String> {
	let unsupported = || WritemeError::UnsupportedDeclaration(first_line(source).to_string());
	let items = scan_items(source);
	let item = items.first().ok_or_else(unsupported)?;

	if !item.kind.has_strippable_body() {
		return Err(unsupported());
	}

	let body = item.body.clone().ok_or_else(unsupported)?;
	let header = source[item.span.start..body.start].trim_end();
	let mut result = format!("{header} {{\n");

	for doc in &item.inner_docs {
		result.push_str(BODY_INDENT);
		result.push_str(&source[doc.clone()]);
		result.push('\n');
	}

	result.push_str(BODY_INDENT);
	result.push_str(BODY_PLACEHOLDER);
	result.push_str("\n}\n");

	Ok(result)
}

fn first_line(source: &str) -> &str {
	source
		.lines()
		.map(str::trim)
		.find(|line| !line.is_empty())
		.unwrap_or_default()
}

fn is_identifier(value: &str) -> bool {
	let mut chars = value.chars();
	let Some(first) = chars.next() else {
		return false;
	};

	(first.is_alphabetic() || first == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// The kind of a top-level item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemKind {
	Function,
	Struct,
	Enum,
	Union,
	Trait,
	Impl,
	Module,
	Const,
	Static,
	TypeAlias,
	MacroRules,
	Use,
	ExternCrate,
	ExternBlock,
}

impl ItemKind {
	fn from_keyword(keyword: &str) -> Option<Self> {
		let kind = match keyword {
			"fn" => Self::Function,
			"struct" => Self::Struct,
			"enum" => Self::Enum,
			"union" => Self::Union,
			"trait" => Self::Trait,
			"impl" => Self::Impl,
			"mod" => Self::Module,
			"const" => Self::Const,
			"static" => Self::Static,
			"type" => Self::TypeAlias,
			"macro_rules" => Self::MacroRules,
			"use" => Self::Use,
			_ => return None,
		};

		Some(kind)
	}

	/// Functions and the type-like items whose body can be replaced.
	pub fn has_strippable_body(self) -> bool {
		matches!(
			self,
			Self::Function | Self::Struct | Self::Enum | Self::Union | Self::Trait
		)
	}

	fn is_named(self) -> bool {
		!matches!(
			self,
			Self::Impl | Self::Use | Self::ExternCrate | Self::ExternBlock
		)
	}

	/// Items that always end with `;` even when their initializer holds braces.
	fn ends_with_semicolon(self) -> bool {
		matches!(
			self,
			Self::Const | Self::Static | Self::TypeAlias | Self::Use | Self::ExternCrate
		)
	}
}

/// A top-level item found by [`scan_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
	pub kind: ItemKind,
	pub name: Option<String>,
	/// From the first outer attribute, doc comment or visibility keyword to
	/// the closing `}` or `;`.
	pub span: Range<usize>,
	/// From the opening `{` of the body to just after its closing `}`.
	pub body: Option<Range<usize>>,
	/// Inner doc comments (`//!`, `/*! */`) at the very start of the body.
	pub inner_docs: Vec<Range<usize>>,
}

/// Raw tokens produced by logos. Only the structure needed to find item
/// boundaries is recognized, everything else is an error token that the
/// scanner steps over.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
	#[token("//", line_comment)]
	LineComment,
	#[token("/*", block_comment)]
	BlockComment,
	#[token("\"", quoted_string)]
	#[token("b\"", quoted_string)]
	#[token("c\"", quoted_string)]
	QuotedString,
	#[regex(r#"[bc]?r#*""#, raw_string)]
	RawString,
	#[token("'", char_or_lifetime)]
	#[token("b'", char_or_lifetime)]
	Quote,
	#[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
	#[regex(r"r#[A-Za-z_][A-Za-z0-9_]*")]
	Ident,
	#[regex(r"[0-9][0-9A-Za-z_]*")]
	Number,
	#[token("{")]
	#[token("(")]
	#[token("[")]
	Open,
	#[token("}")]
	#[token(")")]
	#[token("]")]
	Close,
	#[token(";")]
	Semicolon,
	#[token("<")]
	Less,
	#[token(">")]
	Greater,
	#[token("->")]
	#[token("=>")]
	Arrow,
	#[token("#")]
	Pound,
	#[token("!")]
	Bang,
}

fn line_comment(lex: &mut Lexer<RawToken>) {
	let remainder = lex.remainder();
	let end = remainder.find('\n').unwrap_or(remainder.len());
	lex.bump(end);
}

fn block_comment(lex: &mut Lexer<RawToken>) {
	let bytes = lex.remainder().as_bytes();
	let mut depth = 1;
	let mut index = 0;

	while index < bytes.len() {
		match &bytes[index..] {
			[b'/', b'*', ..] => {
				depth += 1;
				index += 2;
			}
			[b'*', b'/', ..] => {
				depth -= 1;
				index += 2;
				if depth == 0 {
					break;
				}
			}
			_ => index += 1,
		}
	}

	lex.bump(index.min(bytes.len()));
}

fn quoted_string(lex: &mut Lexer<RawToken>) {
	let bytes = lex.remainder().as_bytes();
	let mut index = 0;

	while index < bytes.len() {
		match bytes[index] {
			b'\\' => index += 2,
			b'"' => {
				index += 1;
				break;
			}
			_ => index += 1,
		}
	}

	lex.bump(index.min(bytes.len()));
}

fn raw_string(lex: &mut Lexer<RawToken>) {
	let hashes = lex.slice().bytes().filter(|byte| *byte == b'#').count();
	let terminator = format!("\"{}", "#".repeat(hashes));
	let remainder = lex.remainder();
	let end = remainder
		.find(&terminator)
		.map_or(remainder.len(), |position| position + terminator.len());
	lex.bump(end);
}

/// Consume a character literal. Lifetimes and labels are left alone so the
/// identifier that follows is lexed on its own.
fn char_or_lifetime(lex: &mut Lexer<RawToken>) {
	let remainder = lex.remainder();

	if let Some(escaped) = remainder.strip_prefix('\\') {
		let end = escaped
			.char_indices()
			.skip(1)
			.find(|(_, c)| *c == '\'')
			.map_or(remainder.len(), |(position, _)| position + 2);
		lex.bump(end);
		return;
	}

	let mut chars = remainder.chars();
	if let (Some(c), Some('\'')) = (chars.next(), chars.next()) {
		lex.bump(c.len_utf8() + 1);
	}
}

/// The significant tokens the item scanner works on. Plain comments are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
	OuterDoc,
	InnerDoc,
	Ident,
	Open,
	Close,
	Semicolon,
	AngleOpen,
	AngleClose,
	Pound,
	Bang,
	Literal,
	Other,
}

fn classify_comment(slice: &str) -> Option<Lexeme> {
	if slice.starts_with("///") && !slice.starts_with("////") {
		return Some(Lexeme::OuterDoc);
	}

	if slice.starts_with("/**") && !slice.starts_with("/***") && slice != "/**/" {
		return Some(Lexeme::OuterDoc);
	}

	if slice.starts_with("//!") || slice.starts_with("/*!") {
		return Some(Lexeme::InnerDoc);
	}

	None
}

fn lex(source: &str) -> Vec<(Lexeme, Range<usize>)> {
	RawToken::lexer(source)
		.spanned()
		.filter_map(|(token, span)| {
			let lexeme = match token {
				Ok(RawToken::LineComment | RawToken::BlockComment) => {
					classify_comment(&source[span.clone()])?
				}
				Ok(RawToken::Ident) => Lexeme::Ident,
				Ok(RawToken::Open) => Lexeme::Open,
				Ok(RawToken::Close) => Lexeme::Close,
				Ok(RawToken::Semicolon) => Lexeme::Semicolon,
				Ok(RawToken::Less) => Lexeme::AngleOpen,
				Ok(RawToken::Greater) => Lexeme::AngleClose,
				Ok(RawToken::Arrow) | Err(()) => Lexeme::Other,
				Ok(RawToken::Pound) => Lexeme::Pound,
				Ok(RawToken::Bang) => Lexeme::Bang,
				Ok(
					RawToken::QuotedString
					| RawToken::RawString
					| RawToken::Quote
					| RawToken::Number,
				) => Lexeme::Literal,
			};

			Some((lexeme, span))
		})
		.collect()
}

/// Walks the significant tokens of a Rust file and collects its top-level
/// items.
struct ItemScanner<'a> {
	source: &'a str,
	tokens: Vec<(Lexeme, Range<usize>)>,
	cursor: usize,
}

impl<'a> ItemScanner<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			tokens: lex(source),
			cursor: 0,
		}
	}

	fn kind_at(&self, index: usize) -> Option<Lexeme> {
		self.tokens.get(index).map(|(kind, _)| *kind)
	}

	fn text_at(&self, index: usize) -> &'a str {
		self.tokens
			.get(index)
			.map_or("", |(_, span)| &self.source[span.clone()])
	}

	fn is_ident(&self, index: usize, text: &str) -> bool {
		self.kind_at(index) == Some(Lexeme::Ident) && self.text_at(index) == text
	}

	fn start_of(&self, index: usize) -> usize {
		self.tokens
			.get(index)
			.map_or(self.source.len(), |(_, span)| span.start)
	}

	fn end_of(&self, index: usize) -> usize {
		self.tokens
			.get(index)
			.map_or(self.source.len(), |(_, span)| span.end)
	}

	/// Index of the token closing the group opened at `open`.
	fn matching_close(&self, open: usize) -> usize {
		let mut depth = 0usize;
		for index in open..self.tokens.len() {
			match self.kind_at(index) {
				Some(Lexeme::Open) => depth += 1,
				Some(Lexeme::Close) => {
					depth = depth.saturating_sub(1);
					if depth == 0 {
						return index;
					}
				}
				_ => {}
			}
		}

		self.tokens.len().saturating_sub(1)
	}

	/// Index of the first `;` at depth zero from `from`.
	fn semicolon_from(&self, from: usize) -> usize {
		let mut index = from;
		while index < self.tokens.len() {
			match self.kind_at(index) {
				Some(Lexeme::Semicolon) => return index,
				Some(Lexeme::Open) => index = self.matching_close(index) + 1,
				_ => index += 1,
			}
		}

		self.tokens.len().saturating_sub(1)
	}

	/// Index of the first `;` or `{` at depth zero from `from`. Parentheses,
	/// brackets and generic arguments are skipped as groups.
	fn body_or_semicolon_from(&self, from: usize) -> usize {
		let mut index = from;
		let mut angles = 0usize;
		while index < self.tokens.len() {
			match self.kind_at(index) {
				Some(Lexeme::AngleOpen) => {
					angles += 1;
					index += 1;
				}
				Some(Lexeme::AngleClose) => {
					angles = angles.saturating_sub(1);
					index += 1;
				}
				Some(Lexeme::Semicolon) if angles == 0 => return index,
				Some(Lexeme::Open) if angles == 0 && self.text_at(index) == "{" => return index,
				Some(Lexeme::Open) => index = self.matching_close(index) + 1,
				_ => index += 1,
			}
		}

		self.tokens.len().saturating_sub(1)
	}

	/// Leading inner doc comments inside the group opened at `open`.
	fn inner_docs_after(&self, open: usize) -> Vec<Range<usize>> {
		self.tokens[open + 1..]
			.iter()
			.take_while(|(kind, _)| *kind == Lexeme::InnerDoc)
			.map(|(_, span)| span.clone())
			.collect()
	}

	/// Skip visibility and qualifiers, returning the index of the item
	/// keyword, if one follows.
	fn skip_modifiers(&self, mut index: usize) -> usize {
		loop {
			match self.text_at(index) {
				"pub" => {
					index += 1;
					if self.kind_at(index) == Some(Lexeme::Open) && self.text_at(index) == "(" {
						index = self.matching_close(index) + 1;
					}
				}
				"const"
					if ["fn", "unsafe", "async", "extern"]
						.iter()
						.any(|next| self.is_ident(index + 1, next)) =>
				{
					index += 1;
				}
				"extern"
					if self.kind_at(index + 1) == Some(Lexeme::Literal)
						&& !self.is_ident(index + 2, "crate")
						&& self.kind_at(index + 2) != Some(Lexeme::Open) =>
				{
					index += 2;
				}
				"extern" if self.is_ident(index + 1, "fn") => index += 1,
				"async" | "unsafe" | "default" | "auto" | "safe"
					if self.kind_at(index + 1) == Some(Lexeme::Ident) =>
				{
					index += 1;
				}
				_ => return index,
			}
		}
	}

	fn scan(mut self) -> Vec<SourceItem> {
		let mut items = vec![];
		let mut pending_start: Option<usize> = None;

		while self.cursor < self.tokens.len() {
			let index = self.cursor;

			match self.kind_at(index) {
				Some(Lexeme::OuterDoc) => {
					pending_start.get_or_insert(self.start_of(index));
					self.cursor += 1;
				}
				Some(Lexeme::Pound) => {
					let is_inner = self.kind_at(index + 1) == Some(Lexeme::Bang);
					let open = if is_inner { index + 2 } else { index + 1 };
					if !is_inner {
						pending_start.get_or_insert(self.start_of(index));
					}
					self.cursor = if self.kind_at(open) == Some(Lexeme::Open) {
						self.matching_close(open) + 1
					} else {
						open
					};
				}
				Some(Lexeme::Ident) => {
					let start = pending_start.take().unwrap_or(self.start_of(index));
					if let Some(item) = self.scan_item(index, start) {
						items.push(item);
					}
				}
				_ => {
					pending_start = None;
					self.cursor += 1;
				}
			}
		}

		items
	}

	/// Scan the item starting at `index`, moving the cursor past it.
	fn scan_item(&mut self, index: usize, start: usize) -> Option<SourceItem> {
		let keyword = self.skip_modifiers(index);
		let keyword_text = self.text_at(keyword);

		// `name!(...)` / `name! { ... }` invocations at the top level.
		if keyword_text != "macro_rules" && self.kind_at(keyword + 1) == Some(Lexeme::Bang) {
			let open = keyword + 2;
			let mut end = self.matching_close(open);
			if self.text_at(open) != "{" && self.kind_at(end + 1) == Some(Lexeme::Semicolon) {
				end += 1;
			}
			self.cursor = end + 1;
			return None;
		}

		let kind = match keyword_text {
			"extern" if self.is_ident(keyword + 1, "crate") => ItemKind::ExternCrate,
			"extern" => ItemKind::ExternBlock,
			"union" if self.kind_at(keyword + 1) != Some(Lexeme::Ident) => {
				self.cursor = keyword + 1;
				return None;
			}
			other => {
				let Some(kind) = ItemKind::from_keyword(other) else {
					self.cursor = keyword + 1;
					return None;
				};
				kind
			}
		};

		let mut name_index = keyword + 1;
		match kind {
			ItemKind::Static if self.is_ident(name_index, "mut") => name_index += 1,
			ItemKind::MacroRules if self.kind_at(name_index) == Some(Lexeme::Bang) => {
				name_index += 1;
			}
			_ => {}
		}

		let name = (kind.is_named() && self.kind_at(name_index) == Some(Lexeme::Ident))
			.then(|| self.text_at(name_index).trim_start_matches("r#").to_string());

		let after_name = if kind.is_named() { name_index + 1 } else { keyword + 1 };
		let (end, body) = if kind.ends_with_semicolon() {
			(self.semicolon_from(after_name), None)
		} else if kind == ItemKind::MacroRules {
			let close = self.matching_close(after_name);
			if self.text_at(after_name) == "{" {
				(close, Some(after_name))
			} else {
				(self.semicolon_from(close + 1), None)
			}
		} else {
			let stop = self.body_or_semicolon_from(after_name);
			if self.kind_at(stop) == Some(Lexeme::Open) {
				(self.matching_close(stop), Some(stop))
			} else {
				(stop, None)
			}
		};

		self.cursor = end + 1;

		Some(SourceItem {
			kind,
			name,
			span: start..self.end_of(end),
			body: body.map(|open| self.start_of(open)..self.end_of(end)),
			inner_docs: body.map(|open| self.inner_docs_after(open)).unwrap_or_default(),
		})
	}
}

/// Find every top-level item of a Rust source file, in source order.
pub fn scan_items(source: &str) -> Vec<SourceItem> {
	ItemScanner::new(source).scan()
}
