// Action engine error types

use thiserror::Error;

/// Errors raised while compiling builders or an exposition.
///
/// These are integration defects: they surface when tools are assembled,
/// never as a response to a caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
	#[error("Builder has no actions registered: '{0}'")]
	NoActions(String),

	#[error("duplicate action key '{key}' in builder '{builder}'")]
	DuplicateActionKey { builder: String, key: String },

	#[error("duplicate tool name: '{0}'")]
	DuplicateToolName(String),

	#[error("invalid tool name '{0}': must not be empty")]
	InvalidToolName(String),

	#[error("invalid action separator {0:?}: must be non-empty and contain no whitespace")]
	InvalidSeparator(String),

	#[error("field '{field}' in builder '{builder}' collides with the action discriminator")]
	ReservedField { builder: String, field: String },

	#[error("invalid schema for action '{action}' in builder '{builder}': {message}")]
	InvalidSchema {
		builder: String,
		action: String,
		message: String,
	},
}

impl CompileError {
	pub fn duplicate_action(builder: impl Into<String>, key: impl Into<String>) -> Self {
		Self::DuplicateActionKey {
			builder: builder.into(),
			key: key.into(),
		}
	}

	pub fn reserved_field(builder: impl Into<String>, field: impl Into<String>) -> Self {
		Self::ReservedField {
			builder: builder.into(),
			field: field.into(),
		}
	}

	pub fn invalid_schema(
		builder: impl Into<String>,
		action: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self::InvalidSchema {
			builder: builder.into(),
			action: action.into(),
			message: message.into(),
		}
	}
}

/// Errors raised by handlers and middleware.
///
/// Unlike resolution and validation failures, which are returned to the
/// caller as `isError` responses, these propagate out of `execute()` for the
/// transport to convert.
#[derive(Error, Debug)]
pub enum ActionError {
	#[error("action failed: {0}")]
	Failed(String),

	#[error("failed to serialize action output: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error(transparent)]
	Construction(#[from] CompileError),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ActionError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// Errors raised while loading exposition configuration
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read config file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse JSON config: {0}")]
	Json(#[from] serde_json::Error),

	#[error("failed to parse YAML config: {0}")]
	Yaml(#[from] serde_yaml::Error),

	#[error("invalid config: {0}")]
	Invalid(String),
}
