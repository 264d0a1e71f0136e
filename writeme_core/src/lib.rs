//! `writeme_core` renders markdown documentation from live sources. Fenced
//! code blocks act as templates: each holds a single call to a rendering
//! function, and the block body is replaced with the function's output, such
//! as the help menu of a command or the source of an item in the crate.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown file
//!   → Parser (mdast → token tree of fences, raw text and other nodes)
//!   → Engine (pre-order walk, evaluates each fence body against the namespace)
//!   → Renderer (splices modified fences back into the source text)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `writeme.toml`.
//! - [`builtins`]: `show_command_output`, `show_help_menu` and
//!   `show_source_code`.
//! - [`source_code`]: Resolution of `module.path:Item` references to Rust
//!   source files and item extraction.
//! - [`expression`]: The call grammar accepted inside a writeme block.
//!
//! ## Key Types
//!
//! - [`Namespace`]: The functions and globals a block can reference.
//! - [`RenderingFunction`]: A named function with declared parameters.
//! - [`RenderingResult`]: What a rendering function returns: content plus
//!   how to display it.
//! - [`TemplateEngine`]: Evaluates the template fences of a [`Document`].
//! - [`WritemeConfig`]: Configuration loaded from `writeme.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use writeme_core::Namespace;
//! use writeme_core::TemplateEngine;
//! use writeme_core::WritemeConfig;
//!
//! let config = WritemeConfig::default();
//! let namespace = Namespace::with_builtins(&config).unwrap();
//! let engine = TemplateEngine::new(namespace).with_options(config.engine_options());
//!
//! let markdown = std::fs::read_to_string("readme.template.md").unwrap();
//! let rendered = engine
//! 	.render_markdown(&markdown, &config.renderer_options())
//! 	.unwrap();
//! std::fs::write("readme.md", rendered).unwrap();
//! ```

pub use builtins::*;
pub use command::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use namespace::*;
pub use parser::*;
pub use renderer::*;
pub use source_code::*;
pub use tokens::*;
pub use value::*;

pub mod builtins;
mod command;
pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod expression;
mod namespace;
mod parser;
mod renderer;
pub mod source_code;
mod tokens;
mod value;

#[cfg(test)]
mod __tests;
