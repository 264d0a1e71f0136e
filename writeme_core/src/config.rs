use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::CommandExecutor;
use crate::EngineOptions;
use crate::RendererOptions;
use crate::SourceExtractor;
use crate::WritemeError;
use crate::WritemeResult;
use crate::source_code::DEFAULT_SOURCE_ROOTS;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["writeme.toml", ".writeme.toml", ".config/writeme.toml"];

/// Configuration loaded from `writeme.toml`.
///
/// ```toml
/// [render]
/// max_line_length = 80
/// normalize_whitespace = false
/// fence_tag = "writeme"
/// expose_document = true
///
/// [source]
/// roots = ["src", "."]
///
/// [commands]
/// strict = false
/// working_dir = "."
/// ```
///
/// Relative paths are resolved against the directory holding the config
/// file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct WritemeConfig {
	#[serde(default)]
	pub render: RenderConfig,
	#[serde(default)]
	pub source: SourceConfig,
	#[serde(default)]
	pub commands: CommandsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RenderConfig {
	/// Wrap top-level paragraphs at this width.
	#[serde(default)]
	pub max_line_length: Option<usize>,
	#[serde(default)]
	pub normalize_whitespace: bool,
	/// Only evaluate fences whose info string starts with this word. All
	/// fences are evaluated when unset.
	#[serde(default)]
	pub fence_tag: Option<String>,
	#[serde(default = "default_true")]
	pub expose_document: bool,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			max_line_length: None,
			normalize_whitespace: false,
			fence_tag: None,
			expose_document: true,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
	/// Directories searched, in order, when resolving `show_source_code`
	/// references.
	#[serde(default = "default_source_roots")]
	pub roots: Vec<PathBuf>,
}

impl Default for SourceConfig {
	fn default() -> Self {
		Self {
			roots: default_source_roots(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CommandsConfig {
	/// Fail rendering when a command cannot be spawned or exits with a
	/// non-zero status.
	#[serde(default)]
	pub strict: bool,
	#[serde(default)]
	pub working_dir: Option<PathBuf>,
}

fn default_true() -> bool {
	true
}

fn default_source_roots() -> Vec<PathBuf> {
	DEFAULT_SOURCE_ROOTS.iter().map(PathBuf::from).collect()
}

impl WritemeConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> WritemeResult<Option<WritemeConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path, root).map(Some)
	}

	/// Load the config at `path`, resolving relative paths against `base`.
	pub fn load_file(path: &Path, base: &Path) -> WritemeResult<WritemeConfig> {
		tracing::debug!(path = %path.display(), "loading config");
		let content = std::fs::read_to_string(path)?;
		let config = Self::parse(&content)?;

		Ok(config.relative_to(base))
	}

	pub fn parse(content: &str) -> WritemeResult<WritemeConfig> {
		toml::from_str(content).map_err(|e| WritemeError::ConfigParse(e.to_string()))
	}

	/// Resolve relative source roots and working directory against `base`.
	#[must_use]
	pub fn relative_to(mut self, base: &Path) -> Self {
		for root in &mut self.source.roots {
			*root = base.join(&*root);
		}

		self.commands.working_dir = Some(match self.commands.working_dir.take() {
			Some(dir) => base.join(dir),
			None => base.to_path_buf(),
		});

		self
	}

	pub fn renderer_options(&self) -> RendererOptions {
		RendererOptions {
			max_line_length: self.render.max_line_length,
			normalize_whitespace: self.render.normalize_whitespace,
		}
	}

	pub fn engine_options(&self) -> EngineOptions {
		EngineOptions {
			fence_tag: self.render.fence_tag.clone(),
			expose_document: self.render.expose_document,
		}
	}

	pub fn command_executor(&self) -> CommandExecutor {
		let executor = CommandExecutor::new().strict(self.commands.strict);
		match &self.commands.working_dir {
			Some(dir) => executor.working_dir(dir),
			None => executor,
		}
	}

	pub fn source_extractor(&self) -> SourceExtractor {
		SourceExtractor::new(self.source.roots.iter().cloned())
	}
}
