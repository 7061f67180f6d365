// Exposition configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ConfigError;
use super::exposition::validate_separator;
use super::types::{DEFAULT_SEPARATOR, ToolExposition};

fn default_separator() -> String {
	DEFAULT_SEPARATOR.to_string()
}

/// How registered builders are exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpositionConfig {
	#[serde(default)]
	pub tool_exposition: ToolExposition,
	/// Joins builder name and action key in flat tool names
	#[serde(default = "default_separator")]
	pub action_separator: String,
	#[serde(default)]
	pub tags: TagFilter,
}

impl Default for ExpositionConfig {
	fn default() -> Self {
		Self {
			tool_exposition: ToolExposition::default(),
			action_separator: default_separator(),
			tags: TagFilter::default(),
		}
	}
}

impl ExpositionConfig {
	pub fn flat() -> Self {
		Self::default()
	}

	pub fn grouped() -> Self {
		Self {
			tool_exposition: ToolExposition::Grouped,
			..Default::default()
		}
	}

	pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
		self.action_separator = separator.into();
		self
	}

	pub fn with_tags(mut self, tags: TagFilter) -> Self {
		self.tags = tags;
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_separator(&self.action_separator).map_err(|e| ConfigError::Invalid(e.to_string()))
	}

	pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_yaml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	/// Load from a `.json`, `.yaml` or `.yml` file
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		info!(target: "actions", "Loading exposition config from file: {}", path.display());
		let content = fs_err::tokio::read_to_string(path).await?;
		match path.extension().and_then(|e| e.to_str()) {
			Some("yaml" | "yml") => Self::from_yaml_str(&content),
			_ => Self::from_json_str(&content),
		}
	}
}

/// Tag-based builder selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagFilter {
	/// When non-empty, a builder must carry at least one of these tags
	#[serde(default)]
	pub include: Vec<String>,
	/// Builders carrying any of these tags are hidden
	#[serde(default)]
	pub exclude: Vec<String>,
}

impl TagFilter {
	pub fn include<I, S>(tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			include: tags.into_iter().map(Into::into).collect(),
			exclude: Vec::new(),
		}
	}

	pub fn exclude<I, S>(tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			include: Vec::new(),
			exclude: tags.into_iter().map(Into::into).collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.include.is_empty() && self.exclude.is_empty()
	}

	pub fn matches(&self, tags: &[String]) -> bool {
		if tags.iter().any(|t| self.exclude.contains(t)) {
			return false;
		}
		self.include.is_empty() || tags.iter().any(|t| self.include.contains(t))
	}
}
