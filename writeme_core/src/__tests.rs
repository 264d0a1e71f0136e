use std::path::Path;
use std::path::PathBuf;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::*;
use crate::expression::Call;
use crate::expression::Expression;
use crate::expression::parse_expression;

const SHAPES: &str = "/// A point.\n#[derive(Debug)]\npub struct Point {\n\tpub x: i32,\n}\n\n/// Area of \
                      a square.\npub fn area(side: u32) -> u32 {\n\t//! Squares the side.\n\tside * \
                      side\n}\n\npub const MAX: u32 = 3;\n";

fn test_namespace() -> Namespace {
	let mut namespace = Namespace::new();
	let functions = [
		RenderingFunction::new("echo", |args| {
			Ok(RenderingResult::inline(args.string("text")?).into())
		})
		.param("text"),
		RenderingFunction::new("shout", |args| {
			let text = args.string("text")?.to_uppercase();
			Ok(RenderingResult::code_like(text, args.string("language")?).into())
		})
		.param("text")
		.param_with_default("language", "console"),
		RenderingFunction::new("broken", |_| Ok(Value::Int(1))),
		RenderingFunction::new("fence_count", |args| {
			let count = args
				.get("doc")
				.and_then(Value::as_document)
				.map_or(0, |document| {
					document
						.iter()
						.filter(|token| token.as_code_fence().is_some())
						.count()
				});
			Ok(RenderingResult::inline(count.to_string()).into())
		})
		.param("doc"),
	];

	for function in functions {
		namespace
			.register(function)
			.unwrap_or_else(|e| panic!("register: {e}"));
	}

	namespace
}

fn render(content: &str, options: EngineOptions) -> WritemeResult<String> {
	TemplateEngine::new(test_namespace())
		.with_options(options)
		.render_markdown(content, &RendererOptions::default())
}

fn tagged(tag: &str) -> EngineOptions {
	EngineOptions {
		fence_tag: Some(tag.into()),
		..EngineOptions::default()
	}
}

fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	path
}

#[test]
fn parse_call_with_positional_and_keyword_arguments() -> WritemeResult<()> {
	let expression =
		parse_expression("show_source_code(\n\t\"engine:TemplateEngine\",\n\tdeclaration_only=True,\n\tlanguage='rust',\n)")?;
	let expected = Expression::Call(Call {
		function: "show_source_code".into(),
		positional: vec![Expression::Literal(Value::from("engine:TemplateEngine"))],
		keywords: vec![
			("declaration_only".into(), Expression::Literal(Value::Bool(true))),
			("language".into(), Expression::Literal(Value::from("rust"))),
		],
	});
	assert_eq!(expression, expected);

	Ok(())
}

#[rstest]
#[case::int("42", Value::Int(42))]
#[case::negative_float("-1.5", Value::Float(-1.5))]
#[case::exponent("2e3", Value::Float(2000.0))]
#[case::single_quoted("'ls -la'", Value::from("ls -la"))]
#[case::escaped_newline(r#""a\nb""#, Value::from("a\nb"))]
#[case::escaped_single_quote(r"'it\'s'", Value::from("it's"))]
#[case::nested_double_quotes(r#"'say "hi"'"#, Value::from("say \"hi\""))]
#[case::python_true("True", Value::Bool(true))]
#[case::lower_false("false", Value::Bool(false))]
#[case::none("None", Value::None)]
fn parse_literals(#[case] input: &str, #[case] expected: Value) -> WritemeResult<()> {
	let expression = parse_expression(input)?;
	assert_eq!(expression, Expression::Literal(expected));

	Ok(())
}

#[rstest]
#[case::empty("")]
#[case::whitespace("  \n ")]
#[case::unclosed_call("echo(")]
#[case::missing_comma("echo('a' 'b')")]
#[case::positional_after_keyword("echo(text='a', 'b')")]
#[case::trailing_input("echo('a') extra")]
#[case::arithmetic("1 + 2")]
#[case::unterminated_string("echo('abc)")]
#[case::statement("import os")]
fn invalid_expressions(#[case] input: &str) {
	let result = parse_expression(input);
	assert!(
		matches!(result, Err(WritemeError::InvalidExpression { .. })),
		"expected an invalid expression for {input:?}, got {result:?}"
	);
}

#[test]
fn bare_function_name_must_be_called() {
	let environment = test_namespace().export();
	let result = expression::evaluate("echo", &environment);
	assert!(matches!(result, Err(WritemeError::InvalidArguments { function, .. }) if function == "echo"));
}

#[test]
fn unknown_and_non_callable_names() {
	let mut namespace = test_namespace();
	namespace.add_global("project", "writeme");
	let environment = namespace.export();

	let unknown = expression::evaluate("missing()", &environment);
	assert!(matches!(unknown, Err(WritemeError::UnknownName(name)) if name == "missing"));

	let not_callable = expression::evaluate("project()", &environment);
	assert!(matches!(not_callable, Err(WritemeError::NotCallable(name)) if name == "project"));
}

#[test]
fn globals_are_passed_as_arguments() -> WritemeResult<()> {
	let mut namespace = test_namespace();
	namespace.add_global("project", "writeme");
	let value = expression::evaluate("echo(project)", &namespace.export())?;
	assert_eq!(value, Value::from(RenderingResult::inline("writeme")));

	Ok(())
}

#[rstest]
#[case::too_many_positional("echo('a', 'b')")]
#[case::unknown_keyword("echo(nope='a')")]
#[case::multiple_values("echo('a', text='b')")]
#[case::missing_required("echo()")]
fn invalid_arguments(#[case] input: &str) {
	let result = expression::evaluate(input, &test_namespace().export());
	assert!(
		matches!(result, Err(WritemeError::InvalidArguments { .. })),
		"expected invalid arguments for {input:?}, got {result:?}"
	);
}

#[test]
fn argument_type_is_checked() {
	let result = expression::evaluate("echo(1)", &test_namespace().export());
	assert!(matches!(
		result,
		Err(WritemeError::InvalidArgumentType { parameter, found, .. }) if parameter == "text" && found == "an integer"
	));
}

#[test]
fn defaults_fill_missing_parameters() -> WritemeResult<()> {
	let namespace = test_namespace();
	let function = namespace
		.function("shout")
		.unwrap_or_else(|| panic!("shout is registered"));
	let arguments = function.bind(vec![Value::from("hi")], vec![])?;
	assert_eq!(arguments.string("language")?, "console");

	Ok(())
}

#[test]
fn duplicate_registration_keeps_first_function() -> WritemeResult<()> {
	let mut namespace = test_namespace();
	let replacement = RenderingFunction::new("echo", |_| Ok(RenderingResult::inline("replaced").into()));
	let result = namespace.register(replacement);
	assert!(matches!(result, Err(WritemeError::DuplicateRegistration(name)) if name == "echo"));

	let value = expression::evaluate("echo('original')", &namespace.export())?;
	assert_eq!(value, Value::from(RenderingResult::inline("original")));

	Ok(())
}

#[test]
fn register_under_another_name() -> WritemeResult<()> {
	let mut namespace = Namespace::new();
	let function = RenderingFunction::new("echo", |args| Ok(RenderingResult::inline(args.string("text")?).into()))
		.param("text");
	namespace.register_as("say", function)?;

	assert!(namespace.contains("say"));
	assert!(!namespace.contains("echo"));
	assert_eq!(namespace.function_names(), vec!["say"]);

	Ok(())
}

#[test]
fn functions_shadow_globals_in_export() {
	let mut namespace = test_namespace();
	namespace.add_global("echo", 3_i64);
	namespace.add_global("version", "1.0");
	let environment = namespace.export();

	assert!(matches!(environment.get("echo"), Some(Binding::Function(_))));
	assert!(matches!(environment.get("version"), Some(Binding::Value(value)) if value.as_str() == Some("1.0")));
}

#[test]
fn float_values_compare_approximately() {
	assert_eq!(Value::Float(0.1 + 0.2), Value::Float(0.3));
	assert_ne!(Value::Float(0.3), Value::Int(0));
}

#[test]
fn parse_markdown_into_token_tree() -> WritemeResult<()> {
	let document = Document::parse("# Title\n\nSome `code` here.\n\n```rust title=\"main\"\nfn main() {}\n```\n")?;

	assert!(matches!(document.root.kind, TokenKind::Document));
	assert_eq!(document.root.children().len(), 3);
	assert!(matches!(&document.root.children()[0].kind, TokenKind::Other(name) if name == "heading"));

	let inline_code = document
		.root
		.iter()
		.find(|token| matches!(&token.kind, TokenKind::Other(name) if name == "inlineCode"))
		.unwrap_or_else(|| panic!("inline code is kept"));
	assert_eq!(inline_code.children()[0].as_raw_text().map(|text| text.content.as_str()), Some("code"));

	let fences: Vec<&Token> = document.code_fences().collect();
	assert_eq!(fences.len(), 1);
	let fence = fences[0]
		.as_code_fence()
		.unwrap_or_else(|| panic!("fence"));
	assert_eq!(fence.language.as_deref(), Some("rust"));
	assert_eq!(fence.info_string, "rust title=\"main\"");
	assert_eq!(fences[0].fence_content(), Some("fn main() {}"));

	Ok(())
}

#[test]
fn indented_code_is_not_a_fence() -> WritemeResult<()> {
	let document = Document::parse("Text\n\n    echo(\"x\")\n")?;
	assert_eq!(document.code_fences().count(), 0);

	Ok(())
}

#[test]
fn preorder_paths_follow_document_order() {
	let leaf = |content: &str| Token::raw_text(content, None);
	let root = Token::new(
		TokenKind::Document,
		vec![
			Token::new(TokenKind::Other("paragraph".into()), vec![leaf("a"), leaf("b")], None),
			leaf("c"),
		],
		None,
	);

	let paths = root.preorder_paths();
	assert_eq!(paths, vec![vec![], vec![0], vec![0, 0], vec![0, 1], vec![1]]);

	let contents: Vec<&str> = root
		.iter()
		.filter_map(|token| token.as_raw_text().map(|text| text.content.as_str()))
		.collect();
	assert_eq!(contents, vec!["a", "b", "c"]);
	assert_eq!(root.get(&[0, 1]).and_then(Token::as_raw_text).map(|text| text.content.as_str()), Some("b"));
	assert!(root.get(&[2]).is_none());
}

#[test]
fn renders_inline_result_keeping_fence_language() -> WritemeResult<()> {
	let rendered = render("```text\necho(\"generated\")\n```\n", EngineOptions::default())?;
	assert_eq!(rendered, "```text\ngenerated\n```\n");

	Ok(())
}

#[test]
fn code_like_result_sets_language_and_info_string() -> WritemeResult<()> {
	let mut document = Document::parse("```text extra\nshout('a', language='shell')\n```\n")?;
	TemplateEngine::new(test_namespace()).render(&mut document)?;

	let fence = document
		.code_fences()
		.next()
		.and_then(Token::as_code_fence)
		.unwrap_or_else(|| panic!("fence"));
	assert_eq!(fence.language.as_deref(), Some("shell"));
	assert_eq!(fence.info_string, "shell");
	assert_eq!(document.render(&RendererOptions::default()), "```shell\nA\n```\n");

	Ok(())
}

#[test]
fn text_outside_fences_is_untouched() -> WritemeResult<()> {
	let source = "# echo('heading')\n\nInline `echo('x')` code.\n\n    echo('indented')\n";
	let rendered = render(source, EngineOptions::default())?;
	assert_eq!(rendered, source);

	Ok(())
}

#[test]
fn empty_fence_is_not_a_template() -> WritemeResult<()> {
	let source = "Before\n\n```\n```\n\n```rust\n\n```\n";
	let rendered = render(source, EngineOptions::default())?;
	assert_eq!(rendered, source);

	Ok(())
}

#[test]
fn empty_document_is_returned_unmodified() -> WritemeResult<()> {
	let mut document = Document::parse("")?;
	let before = document.clone();
	TemplateEngine::new(test_namespace()).render(&mut document)?;
	assert_eq!(document, before);

	Ok(())
}

#[test]
fn contract_violation_leaves_document_untouched() -> WritemeResult<()> {
	let mut document = Document::parse("```\nbroken()\n```\n")?;
	let before = document.clone();
	let result = TemplateEngine::new(test_namespace()).render(&mut document);

	assert!(matches!(
		result,
		Err(WritemeError::ContractViolation { expression, found }) if expression == "broken()" && found == "an integer"
	));
	assert_eq!(document, before);

	Ok(())
}

#[test]
fn fence_tag_filters_templates() -> WritemeResult<()> {
	let source = "```rust\nfn main() {}\n```\n\n```writeme\necho('x')\n```\n";

	let rendered = render(source, tagged("writeme"))?;
	assert_eq!(rendered, "```rust\nfn main() {}\n```\n\n```writeme\nx\n```\n");

	let unfiltered = render(source, EngineOptions::default());
	assert!(matches!(unfiltered, Err(WritemeError::InvalidExpression { .. })));

	Ok(())
}

#[test]
fn document_global_exposes_the_tree() -> WritemeResult<()> {
	let namespace = test_namespace();
	let source = "```\nfence_count(document)\n```\n\n```\necho('x')\n```\n";

	let rendered = TemplateEngine::new(namespace.clone()).render_markdown(source, &RendererOptions::default())?;
	assert_eq!(rendered, "```\n2\n```\n\n```\nx\n```\n");
	assert!(!namespace.contains(DOCUMENT_GLOBAL));

	let hidden = render(source, EngineOptions {
		expose_document: false,
		..EngineOptions::default()
	});
	assert!(matches!(hidden, Err(WritemeError::UnknownName(name)) if name == "document"));

	Ok(())
}

#[test]
fn pending_fence_is_superseded_by_the_next_one() -> WritemeResult<()> {
	let fence = |children| Token::new(TokenKind::CodeFence(CodeFence::new(None, "", "")), children, None);
	let mut root = Token::new(
		TokenKind::Document,
		vec![
			Token::raw_text("echo('outside')", None),
			fence(vec![]),
			fence(vec![Token::raw_text("echo('inside')", None)]),
		],
		None,
	);

	render_tree(&mut root, &test_namespace(), &EngineOptions::default())?;

	assert_eq!(root.children()[0].as_raw_text().map(|text| text.content.as_str()), Some("echo('outside')"));
	assert!(root.children()[1].children().is_empty());
	assert_eq!(root.children()[2].fence_content(), Some("inside"));

	Ok(())
}

#[test]
fn render_template_uses_default_options() -> WritemeResult<()> {
	let document = render_template("```\necho('x')\n```\n", &test_namespace())?;
	assert_eq!(document.code_fences().next().and_then(Token::fence_content), Some("x"));

	Ok(())
}

#[test]
fn renders_mixed_document() -> WritemeResult<()> {
	let source = "# Demo\n\nSome   intro text.\n\n```writeme\nshout(\"hello\")\n```\n\n```rust\nfn main() \
	              {}\n```\n\n> ```writeme\n> echo('quoted')\n> ```\n";
	let rendered = render(source, tagged("writeme"))?;
	insta::assert_snapshot!(rendered);

	Ok(())
}

#[test]
fn unchanged_document_renders_byte_identical() -> WritemeResult<()> {
	let source = "Title\n=====\n\n* item   one\n* item two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n~~~ rust\nfn \
	              main() {}\n~~~\n";
	let document = Document::parse(source)?;
	assert_eq!(document.render(&RendererOptions::default()), source);

	Ok(())
}

#[rstest]
#[case::tilde_fence("~~~\necho(\"hi\")\n~~~\n", "~~~\nhi\n~~~\n")]
#[case::long_fence("`````\necho(\"hi\")\n`````\n", "`````\nhi\n`````\n")]
#[case::block_quote("> ```\n> echo(\"hi\")\n> ```\n", "> ```\n> hi\n> ```\n")]
#[case::list_item("- item\n\n  ```\n  echo(\"hi\")\n  ```\n", "- item\n\n  ```\n  hi\n  ```\n")]
#[case::lengthened(
	"```\necho(\"a\\n```\\nb\")\n```\n",
	"````\na\n```\nb\n````\n"
)]
fn re_emits_modified_fences(#[case] source: &str, #[case] expected: &str) -> WritemeResult<()> {
	let rendered = render(source, EngineOptions::default())?;
	assert_eq!(rendered, expected);

	Ok(())
}

#[rstest]
#[case::top_level("```\necho(\"hi\")\n", "```\nhi\n```\n")]
#[case::block_quote("> ```\n> echo('hi')\n", "> ```\n> hi\n> ```\n")]
#[case::list_item("- ```\n  echo('hi')\n", "- ```\n  hi\n  ```\n")]
fn unterminated_fence_gets_closed(#[case] source: &str, #[case] expected: &str) -> WritemeResult<()> {
	let rendered = render(source, EngineOptions::default())?;
	assert_eq!(rendered, expected);

	let reparsed = Document::parse(rendered)?;
	let bodies: Vec<&str> = reparsed.code_fences().filter_map(Token::fence_content).collect();
	assert_eq!(bodies, vec!["hi"]);

	Ok(())
}

#[test]
fn re_emitted_fence_keeps_crlf_line_endings() -> WritemeResult<()> {
	let rendered = render("Intro\r\n\r\n```\r\necho('hi')\r\n```\r\n", EngineOptions::default())?;
	assert_eq!(rendered, "Intro\r\n\r\n```\r\nhi\r\n```\r\n");

	Ok(())
}

#[rstest]
#[case::collapses_spaces("Some   text\twith  spaces.\n", "Some text with spaces.\n")]
#[case::keeps_hard_break("line one  \nline two\n", "line one  \nline two\n")]
#[case::skips_headings("#  Spaced   heading\n", "#  Spaced   heading\n")]
#[case::keeps_code_spans("Run `a  b`   now.\n", "Run `a  b` now.\n")]
#[case::keeps_crlf("Too   many\r\nspaces.\r\n", "Too many\r\nspaces.\r\n")]
fn normalizes_whitespace(#[case] source: &str, #[case] expected: &str) -> WritemeResult<()> {
	let document = Document::parse(source)?;
	let options = RendererOptions {
		normalize_whitespace: true,
		..RendererOptions::default()
	};
	assert_eq!(document.render(&options), expected);

	Ok(())
}

#[rstest]
#[case::wraps(
	"The quick brown fox jumps over the lazy dog.\n",
	"The quick brown fox\njumps over the lazy\ndog.\n"
)]
#[case::joins_short_lines("short\nlines\n", "short lines\n")]
#[case::keeps_hard_breaks("aaa bbb ccc ddd eee fff  \nggg\n", "aaa bbb ccc ddd eee fff  \nggg\n")]
#[case::keeps_block_markers_inline("aaaaaaaaaaaaaaaaaaa - b\n", "aaaaaaaaaaaaaaaaaaa -\nb\n")]
#[case::keeps_code_spans("Keep `a  b` intact please ok.\n", "Keep `a  b` intact\nplease ok.\n")]
#[case::leaves_code_alone("```\na very long line inside a fence\n```\n", "```\na very long line inside a fence\n```\n")]
fn wraps_paragraphs(#[case] source: &str, #[case] expected: &str) -> WritemeResult<()> {
	let document = Document::parse(source)?;
	let options = RendererOptions {
		max_line_length: Some(20),
		..RendererOptions::default()
	};
	assert_eq!(document.render(&options), expected);

	Ok(())
}

#[rstest]
#[case::simple("engine:TemplateEngine", "engine", "TemplateEngine")]
#[case::nested("my_crate.engine:render", "my_crate.engine", "render")]
#[case::padded(" engine : render ", "engine", "render")]
fn parse_source_references(#[case] input: &str, #[case] module: &str, #[case] object: &str) -> WritemeResult<()> {
	let reference = SourceReference::parse(input)?;
	assert_eq!(reference.module, module);
	assert_eq!(reference.object, object);

	Ok(())
}

#[rstest]
#[case::missing_object("engine")]
#[case::too_many_parts("a:b:c")]
#[case::empty_module(":render")]
#[case::invalid_segment("my-crate:render")]
#[case::empty_segment("my_crate..engine:render")]
fn invalid_source_references(#[case] input: &str) {
	let result = SourceReference::parse(input);
	assert!(matches!(result, Err(WritemeError::InvalidReference(_))), "{input:?} gave {result:?}");
}

#[test]
fn candidate_paths_cover_module_layouts() -> WritemeResult<()> {
	let reference = SourceReference::parse("my_crate.engine:render")?;
	let expected: Vec<PathBuf> = [
		"my_crate/engine.rs",
		"my_crate/engine/mod.rs",
		"my_crate/engine/lib.rs",
		"my_crate/engine/src/lib.rs",
		"my_crate/src/engine.rs",
		"my_crate/src/engine/mod.rs",
	]
	.iter()
	.map(PathBuf::from)
	.collect();
	assert_eq!(reference.candidate_paths(), expected);

	Ok(())
}

#[test]
fn extracts_full_item_source() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "src/shapes.rs", SHAPES);
	let extractor = SourceExtractor::new([tmp.path().join("src")]);

	let source = extractor.extract("shapes:area", false)?;
	assert_eq!(
		source,
		"/// Area of a square.\npub fn area(side: u32) -> u32 {\n\t//! Squares the side.\n\tside * side\n}\n"
	);

	Ok(())
}

#[rstest]
#[case::function(
	"shapes:area",
	"/// Area of a square.\npub fn area(side: u32) -> u32 {\n    //! Squares the side.\n    ...\n}\n"
)]
#[case::structure(
	"shapes:Point",
	"/// A point.\n#[derive(Debug)]\npub struct Point {\n    ...\n}\n"
)]
fn extracts_declarations(#[case] reference: &str, #[case] expected: &str) -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "src/shapes.rs", SHAPES);
	let extractor = SourceExtractor::new([tmp.path().join("src")]);

	assert_eq!(extractor.extract(reference, true)?, expected);

	Ok(())
}

#[test]
fn declaration_extraction_is_idempotent() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "src/shapes.rs", SHAPES);
	let extractor = SourceExtractor::new([tmp.path().join("src")]);
	assert_eq!(extractor.extract("shapes:area", true)?, extractor.extract("shapes:area", true)?);

	let config = WritemeConfig::default().relative_to(tmp.path());
	let engine = TemplateEngine::new(Namespace::with_builtins(&config)?);
	let template = "```\nshow_source_code('shapes:area', declaration_only=True)\n```\n";
	let first = engine.render_markdown(template, &RendererOptions::default())?;
	let second = engine.render_markdown(template, &RendererOptions::default())?;
	assert_eq!(first, second);

	Ok(())
}

#[rstest]
#[case::const_generic_default(
	"Buffer",
	"pub struct Buffer<const N: usize = { 1 }> {\n\tbytes: [u8; N],\n}\n",
	"pub struct Buffer<const N: usize = { 1 }> {\n    ...\n}\n"
)]
#[case::closure_return_type(
	"make",
	"fn make<T>() -> Box<dyn Fn(T) -> Vec<T>>\nwhere\n\tT: Clone,\n{\n\ttodo!()\n}\n",
	"fn make<T>() -> Box<dyn Fn(T) -> Vec<T>>\nwhere\n\tT: Clone, {\n    ...\n}\n"
)]
fn finds_body_after_generics(#[case] name: &str, #[case] source: &str, #[case] declaration: &str) -> WritemeResult<()> {
	assert_eq!(item_source(source, name).as_deref(), Some(source));
	assert_eq!(strip_declaration_body(source)?, declaration);

	Ok(())
}

#[test]
fn invalid_reference_is_rejected_before_resolution() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let extractor = SourceExtractor::new([tmp.path().join("missing")]);

	let result = extractor.extract("engine", false);
	assert!(matches!(result, Err(WritemeError::InvalidReference(reference)) if reference == "engine"));
}

#[test]
fn source_extraction_errors() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "src/shapes.rs", SHAPES);
	let extractor = SourceExtractor::new([tmp.path().join("src"), tmp.path().to_path_buf()]);

	let missing_module = extractor.extract("nothing:Point", false);
	assert!(matches!(missing_module, Err(WritemeError::ModuleNotFound { module, .. }) if module == "nothing"));

	let missing_object = extractor.extract("shapes:Circle", false);
	assert!(matches!(missing_object, Err(WritemeError::ObjectNotFound { object, .. }) if object == "Circle"));

	let constant = extractor.extract("shapes:MAX", true);
	assert!(matches!(constant, Err(WritemeError::UnsupportedDeclaration(_))));
}

#[test]
fn resolves_modules_inside_crate_directories() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "my_crate/src/geometry.rs", SHAPES);
	let extractor = SourceExtractor::new([tmp.path()]);

	let reference = SourceReference::parse("my_crate.geometry:Point")?;
	assert_eq!(
		extractor.resolve_module(&reference)?,
		tmp.path().join("my_crate/src/geometry.rs")
	);

	Ok(())
}

#[test]
fn scans_top_level_items() {
	let source = r#"use std::fmt;

macro_rules! square {
	($x:expr) => { $x * $x };
}

const LIMITS: [u32; 2] = [1, 2];

lazy! { fn hidden() {} }

/// Doc.
pub(crate) async fn fetch() -> &'static str {
	"fn not_an_item() {}"
}

// fn commented_out() {}
impl fmt::Display for Point {}

pub static mut COUNTER: u8 = b'{';
"#;

	let items: Vec<(ItemKind, Option<String>)> = scan_items(source)
		.into_iter()
		.map(|item| (item.kind, item.name))
		.collect();

	assert_eq!(
		items,
		vec![
			(ItemKind::Use, None),
			(ItemKind::MacroRules, Some("square".into())),
			(ItemKind::Const, Some("LIMITS".into())),
			(ItemKind::Function, Some("fetch".into())),
			(ItemKind::Impl, None),
			(ItemKind::Static, Some("COUNTER".into())),
		]
	);
}

#[test]
fn item_source_starts_at_doc_comment() {
	let source = "// plain comment\n\n/// Documented.\n#[inline]\nfn helper() {}\n";
	assert_eq!(
		item_source(source, "helper").as_deref(),
		Some("/// Documented.\n#[inline]\nfn helper() {}\n")
	);
}

#[test]
fn command_output_is_captured() -> WritemeResult<()> {
	let output = CommandExecutor::new().run("echo hello")?;
	assert_eq!(output.trim(), "hello");

	Ok(())
}

#[test]
#[traced_test]
fn lenient_command_failure_is_logged() -> WritemeResult<()> {
	let output = CommandExecutor::new().run("exit 3")?;
	assert_eq!(output, "");
	assert!(logs_contain("command exited unsuccessfully"));

	Ok(())
}

#[test]
fn strict_command_failure_is_an_error() {
	let result = CommandExecutor::new().strict(true).run("exit 3");
	assert!(matches!(result, Err(WritemeError::CommandFailed { status, .. }) if status == "3"));
}

#[test]
fn spawn_failure_depends_on_strictness() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let missing = tmp.path().join("missing");

	let lenient = CommandExecutor::new().working_dir(&missing);
	assert_eq!(lenient.run("echo hello")?, "");

	let strict = CommandExecutor::new().strict(true).working_dir(&missing);
	assert!(matches!(strict.run("echo hello"), Err(WritemeError::Io(_))));

	Ok(())
}

#[test]
fn help_menu_appends_help_flag() -> WritemeResult<()> {
	let function = show_help_menu(std::sync::Arc::new(CommandExecutor::new()));
	let value = function.call(vec![Value::from("echo usage:")], vec![])?;
	let result = value
		.into_rendering()
		.unwrap_or_else(|value| panic!("expected a rendering result, got {value:?}"));

	assert_eq!(result.content.trim(), "usage: --help");
	assert_eq!(result.kind, RenderKind::console());

	Ok(())
}

#[test]
fn builtins_render_source_code() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(tmp.path(), "src/shapes.rs", SHAPES);
	let config = WritemeConfig::default().relative_to(tmp.path());
	let namespace = Namespace::with_builtins(&config)?;
	assert_eq!(
		namespace.function_names(),
		vec!["show_command_output", "show_help_menu", "show_source_code"]
	);

	let rendered = TemplateEngine::new(namespace).render_markdown(
		"```\nshow_source_code('shapes:Point', declaration_only=True)\n```\n",
		&RendererOptions::default(),
	)?;
	assert_eq!(
		rendered,
		"```rust\n/// A point.\n#[derive(Debug)]\npub struct Point {\n    ...\n}\n```\n"
	);

	Ok(())
}

#[cfg(unix)]
#[test]
#[traced_test]
fn builtins_render_command_output() -> WritemeResult<()> {
	let namespace = Namespace::with_builtins(&WritemeConfig::default())?;
	let rendered = TemplateEngine::new(namespace)
		.render_markdown("```\nshow_command_output(\"echo hello\")\n```\n", &RendererOptions::default())?;
	assert_eq!(rendered, "```console\nhello\n```\n");
	assert!(logs_contain("rendered writeme blocks"));

	Ok(())
}

#[test]
fn parse_config_with_defaults() -> WritemeResult<()> {
	let config = WritemeConfig::parse(
		"[render]\nmax_line_length = 80\nfence_tag = \"writeme\"\n\n[commands]\nstrict = true\n",
	)?;

	assert_eq!(config.render.max_line_length, Some(80));
	assert_eq!(config.render.fence_tag.as_deref(), Some("writeme"));
	assert!(config.render.expose_document);
	assert!(!config.render.normalize_whitespace);
	assert!(config.commands.strict);
	assert_eq!(config.source.roots, vec![PathBuf::from("src"), PathBuf::from(".")]);
	assert_eq!(config.engine_options(), tagged("writeme"));
	assert_eq!(config.renderer_options(), RendererOptions {
		max_line_length: Some(80),
		normalize_whitespace: false,
	});

	Ok(())
}

#[test]
fn invalid_config_is_reported() {
	let result = WritemeConfig::parse("[render\nmax_line_length = 80\n");
	assert!(matches!(result, Err(WritemeError::ConfigParse(_))));

	let wrong_type = WritemeConfig::parse("[render]\nmax_line_length = \"wide\"\n");
	assert!(matches!(wrong_type, Err(WritemeError::ConfigParse(_))));
}

#[test]
fn config_paths_resolve_against_config_directory() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_file(
		tmp.path(),
		".config/writeme.toml",
		"[source]\nroots = [\"crates\"]\n\n[commands]\nworking_dir = \"docs\"\n",
	);

	let config = WritemeConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config is discovered"));
	assert_eq!(config.source.roots, vec![tmp.path().join("crates")]);
	assert_eq!(config.commands.working_dir, Some(tmp.path().join("docs")));

	Ok(())
}

#[test]
fn config_discovery_prefers_root_file() -> WritemeResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	assert!(WritemeConfig::load(tmp.path())?.is_none());

	write_file(tmp.path(), ".writeme.toml", "[render]\nnormalize_whitespace = true\n");
	let root = write_file(tmp.path(), "writeme.toml", "[render]\nmax_line_length = 72\n");

	assert_eq!(WritemeConfig::resolve_path(tmp.path()), Some(root));
	let config = WritemeConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config is discovered"));
	assert_eq!(config.render.max_line_length, Some(72));
	assert!(!config.render.normalize_whitespace);

	Ok(())
}
