// Exposition: projecting compiled builders onto the wire
//
// Grouped: one tool per builder, the builder routes on its discriminator.
// Flat: one tool per action, named `{builder}{separator}{action}`, with a
// routing table back to (builder, action). A flat call injects the
// discriminator and goes through the same `execute()` as a grouped call.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject, Tool};
use serde_json::Value;
use tracing::debug;

use super::annotations::aggregate_annotations;
use super::builder::ToolBuilder;
use super::context::CallContext;
use super::description::flat_description;
use super::error::{ActionError, CompileError};
use super::schema::ObjectSchema;
use super::types::ToolExposition;

/// Where a flat tool name leads
#[derive(Clone)]
pub struct Route {
	pub builder: Arc<dyn ToolBuilder>,
	pub action_key: String,
	pub discriminator: String,
}

impl Route {
	/// Call the routed action through the builder's uniform entry point
	pub async fn execute(
		&self,
		ctx: CallContext,
		args: Value,
	) -> Result<CallToolResult, ActionError> {
		let args = match args {
			Value::Null => {
				let mut map = serde_json::Map::new();
				map.insert(self.discriminator.clone(), Value::String(self.action_key.clone()));
				Value::Object(map)
			},
			Value::Object(mut map) => {
				map.insert(self.discriminator.clone(), Value::String(self.action_key.clone()));
				Value::Object(map)
			},
			// Let the builder reject it the same way a grouped call would be
			other => other,
		};
		self.builder.execute(ctx, args).await
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("builder", &self.builder.name())
			.field("action_key", &self.action_key)
			.field("discriminator", &self.discriminator)
			.finish()
	}
}

/// Externally visible tools plus the flat routing table
#[derive(Debug, Clone, Default)]
pub struct ExpositionResult {
	pub tools: Vec<Tool>,
	/// Empty for grouped exposition
	pub routing_map: HashMap<String, Route>,
	pub is_flat: bool,
}

impl ExpositionResult {
	pub fn route(&self, tool_name: &str) -> Option<&Route> {
		self.routing_map.get(tool_name)
	}

	pub fn tool_names(&self) -> impl Iterator<Item = &str> {
		self.tools.iter().map(|t| t.name.as_ref())
	}
}

/// Check an action separator: non-empty, no whitespace
pub fn validate_separator(separator: &str) -> Result<(), CompileError> {
	if separator.is_empty() || separator.chars().any(char::is_whitespace) {
		return Err(CompileError::InvalidSeparator(separator.to_string()));
	}
	Ok(())
}

/// Compile the externally visible tools for `builders`
pub fn compile_exposition(
	builders: &[Arc<dyn ToolBuilder>],
	strategy: ToolExposition,
	separator: &str,
) -> Result<ExpositionResult, CompileError> {
	validate_separator(separator)?;

	let mut result = ExpositionResult {
		is_flat: strategy == ToolExposition::Flat,
		..Default::default()
	};
	let mut names = HashSet::new();

	for builder in builders {
		let compiled = builder.build_tool_definition()?;
		match strategy {
			ToolExposition::Grouped => {
				if !names.insert(compiled.tool.name.to_string()) {
					return Err(CompileError::DuplicateToolName(compiled.tool.name.to_string()));
				}
				result.tools.push(compiled.tool.clone());
			},
			ToolExposition::Flat => {
				for meta in &compiled.metadata {
					let wire_name = format!("{}{}{}", builder.name(), separator, meta.key);
					if !names.insert(wire_name.clone()) {
						return Err(CompileError::DuplicateToolName(wire_name));
					}
					let input_schema =
						flat_input_schema(compiled.context.validation_schema(&meta.key));
					result.tools.push(Tool {
						name: Cow::Owned(wire_name.clone()),
						title: None,
						description: Some(Cow::Owned(flat_description(builder.name(), meta))),
						input_schema: Arc::new(input_schema),
						output_schema: None,
						annotations: Some(aggregate_annotations(
							std::iter::once(&meta.flags),
							None,
						)),
						icons: None,
						meta: None,
					});
					result.routing_map.insert(
						wire_name,
						Route {
							builder: builder.clone(),
							action_key: meta.key.clone(),
							discriminator: builder.discriminator().to_string(),
						},
					);
				}
			},
		}
	}

	debug!(
		target: "actions",
		strategy = ?strategy,
		builders = builders.len(),
		tools = result.tools.len(),
		"compiled exposition"
	);
	Ok(result)
}

/// Schema of a flat tool: the action's own validation schema, no discriminator
fn flat_input_schema(schema: Option<&ObjectSchema>) -> JsonObject {
	match schema {
		Some(schema) => schema.to_json_schema(),
		None => ObjectSchema::new().to_json_schema(),
	}
}
