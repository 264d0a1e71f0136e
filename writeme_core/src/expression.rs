use logos::Logos;
use snailquote::unescape;

use crate::Environment;
use crate::Value;
use crate::WritemeError;
use crate::WritemeResult;
use crate::namespace::Binding;

/// Raw tokens of the call grammar used inside writeme blocks.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token(",")]
	Comma,
	#[token("=")]
	Equals,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"-?[0-9]+")]
	Int,
	#[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
	#[regex(r"-?[0-9]+[eE][+-]?[0-9]+")]
	Float,
}

/// A parsed writeme expression.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expression {
	/// A literal value, e.g. `"ls"`, `42` or `true`.
	Literal(Value),
	/// A reference to a global, e.g. `document`.
	Name(String),
	/// A function call, e.g. `show_help_menu("cargo")`.
	Call(Call),
}

/// A function call with positional arguments followed by keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
	pub function: String,
	pub positional: Vec<Expression>,
	pub keywords: Vec<(String, Expression)>,
}

/// Parse the content of a writeme block.
pub fn parse_expression(source: &str) -> WritemeResult<Expression> {
	let mut parser = ExpressionParser::new(source)?;
	let expression = parser.expression()?;

	if parser.cursor < parser.tokens.len() {
		return Err(parser.error("unexpected trailing input"));
	}

	Ok(expression)
}

/// Parse `source` and evaluate it against `environment`.
pub fn evaluate(source: &str, environment: &Environment) -> WritemeResult<Value> {
	let expression = parse_expression(source)?;
	expression.evaluate(environment)
}

impl Expression {
	pub fn evaluate(&self, environment: &Environment) -> WritemeResult<Value> {
		match self {
			Self::Literal(value) => Ok(value.clone()),
			Self::Name(name) => {
				match environment.get(name) {
					Some(Binding::Value(value)) => Ok(value.clone()),
					Some(Binding::Function(_)) => {
						Err(WritemeError::InvalidArguments {
							function: name.clone(),
							reason: format!("functions must be called, e.g. `{name}(...)`"),
						})
					}
					None => Err(WritemeError::UnknownName(name.clone())),
				}
			}
			Self::Call(call) => call.evaluate(environment),
		}
	}
}

impl Call {
	pub fn evaluate(&self, environment: &Environment) -> WritemeResult<Value> {
		let function = match environment.get(&self.function) {
			Some(Binding::Function(function)) => function,
			Some(Binding::Value(_)) => return Err(WritemeError::NotCallable(self.function.clone())),
			None => return Err(WritemeError::UnknownName(self.function.clone())),
		};

		let positional = self
			.positional
			.iter()
			.map(|argument| argument.evaluate(environment))
			.collect::<WritemeResult<Vec<_>>>()?;
		let keywords = self
			.keywords
			.iter()
			.map(|(name, argument)| Ok((name.clone(), argument.evaluate(environment)?)))
			.collect::<WritemeResult<Vec<_>>>()?;

		function.call(positional, keywords)
	}
}

/// A lexed token with its byte span in the expression source.
#[derive(Debug, Clone)]
struct Lexeme<'a> {
	token: RawToken,
	slice: &'a str,
}

/// Recursive descent parser over the logos token stream.
struct ExpressionParser<'a> {
	source: &'a str,
	tokens: Vec<Lexeme<'a>>,
	cursor: usize,
}

impl<'a> ExpressionParser<'a> {
	fn new(source: &'a str) -> WritemeResult<Self> {
		let mut tokens = vec![];

		for (token, span) in RawToken::lexer(source).spanned() {
			let slice = &source[span.clone()];
			let Ok(token) = token else {
				return Err(WritemeError::InvalidExpression {
					expression: source.trim().to_string(),
					reason: format!("unexpected `{slice}` at offset {}", span.start),
				});
			};
			tokens.push(Lexeme { token, slice });
		}

		Ok(Self {
			source,
			tokens,
			cursor: 0,
		})
	}

	fn error(&self, reason: impl Into<String>) -> WritemeError {
		WritemeError::InvalidExpression {
			expression: self.source.trim().to_string(),
			reason: reason.into(),
		}
	}

	fn peek(&self) -> Option<RawToken> {
		self.tokens.get(self.cursor).map(|lexeme| lexeme.token)
	}

	fn peek_nth(&self, offset: usize) -> Option<RawToken> {
		self.tokens.get(self.cursor + offset).map(|lexeme| lexeme.token)
	}

	fn advance(&mut self) -> Option<Lexeme<'a>> {
		let lexeme = self.tokens.get(self.cursor).cloned();
		self.cursor += 1;
		lexeme
	}

	fn expect(&mut self, expected: RawToken, description: &str) -> WritemeResult<()> {
		match self.advance() {
			Some(lexeme) if lexeme.token == expected => Ok(()),
			Some(lexeme) => Err(self.error(format!("expected {description}, found `{}`", lexeme.slice))),
			None => Err(self.error(format!("expected {description}, found end of input"))),
		}
	}

	fn expression(&mut self) -> WritemeResult<Expression> {
		let Some(lexeme) = self.advance() else {
			return Err(self.error("empty expression"));
		};

		match lexeme.token {
			RawToken::Ident => {
				if let Some(value) = keyword_literal(lexeme.slice) {
					return Ok(Expression::Literal(value));
				}

				if self.peek() == Some(RawToken::ParenOpen) {
					self.cursor += 1;
					return self.call(lexeme.slice).map(Expression::Call);
				}

				Ok(Expression::Name(lexeme.slice.to_string()))
			}
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				self.string(lexeme.slice).map(|value| Expression::Literal(Value::String(value)))
			}
			RawToken::Int => {
				lexeme
					.slice
					.parse::<i64>()
					.map(|value| Expression::Literal(Value::Int(value)))
					.map_err(|e| self.error(format!("invalid integer `{}`: {e}", lexeme.slice)))
			}
			RawToken::Float => {
				lexeme
					.slice
					.parse::<f64>()
					.map(|value| Expression::Literal(Value::Float(value)))
					.map_err(|e| self.error(format!("invalid float `{}`: {e}", lexeme.slice)))
			}
			RawToken::ParenOpen | RawToken::ParenClose | RawToken::Comma | RawToken::Equals => {
				Err(self.error(format!("unexpected `{}`", lexeme.slice)))
			}
		}
	}

	/// Parse the arguments of a call whose opening parenthesis was consumed.
	fn call(&mut self, function: &str) -> WritemeResult<Call> {
		let mut call = Call {
			function: function.to_string(),
			positional: vec![],
			keywords: vec![],
		};

		loop {
			if self.peek() == Some(RawToken::ParenClose) {
				self.cursor += 1;
				return Ok(call);
			}

			let is_keyword =
				self.peek() == Some(RawToken::Ident) && self.peek_nth(1) == Some(RawToken::Equals);

			if is_keyword {
				let name = self.advance().map(|lexeme| lexeme.slice.to_string()).unwrap_or_default();
				self.cursor += 1;
				let value = self.expression()?;
				call.keywords.push((name, value));
			} else if call.keywords.is_empty() {
				call.positional.push(self.expression()?);
			} else {
				return Err(self.error("positional argument follows keyword argument"));
			}

			match self.peek() {
				Some(RawToken::Comma) => self.cursor += 1,
				Some(RawToken::ParenClose) => {}
				_ => self.expect(RawToken::ParenClose, "`,` or `)`")?,
			}
		}
	}

	/// Strip the quotes of a string literal and unescape it.
	fn string(&self, slice: &str) -> WritemeResult<String> {
		let inner = &slice[1..slice.len() - 1];

		if !inner.contains('\\') {
			return Ok(inner.to_string());
		}

		unescape(&format!("\"{}\"", requote(inner)))
			.map_err(|e| self.error(format!("invalid escape in {slice}: {e}")))
	}
}

/// Rewrite the body of a string literal so it can be unescaped as one
/// double-quoted segment.
fn requote(inner: &str) -> String {
	let mut result = String::with_capacity(inner.len() + 2);
	let mut chars = inner.chars();

	while let Some(c) = chars.next() {
		match (c, chars.clone().next()) {
			('\\', Some('\'')) => {
				chars.next();
				result.push('\'');
			}
			('\\', Some(escaped)) => {
				chars.next();
				result.push(c);
				result.push(escaped);
			}
			('"', _) => result.push_str("\\\""),
			_ => result.push(c),
		}
	}

	result
}

fn keyword_literal(ident: &str) -> Option<Value> {
	match ident {
		"true" | "True" => Some(Value::Bool(true)),
		"false" | "False" => Some(Value::Bool(false)),
		"none" | "None" => Some(Value::None),
		_ => None,
	}
}
