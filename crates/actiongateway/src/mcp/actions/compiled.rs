// Action compilation
//
// Turns one builder's declarative action model into:
// - the wire `Tool` exposed when the builder is served as a single tool
// - an immutable `ExecutionContext` (action map, validation cache, chains)
//   shared by every call regardless of exposition strategy

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{Map, Value};
use tracing::debug;

use super::annotations::aggregate_annotations;
use super::description::DescriptionStyle;
use super::error::CompileError;
use super::middleware::{CompiledChain, Middleware, compile_chains};
use super::schema::{ObjectSchema, SchemaValidator, merge_schemas};
use super::types::{ActionDefinition, ActionMetadata};

/// Everything the compiler needs from a builder
#[derive(Clone, Copy)]
pub struct CompileInput<'a> {
	pub name: &'a str,
	pub description: Option<&'a str>,
	pub actions: &'a [ActionDefinition],
	/// Builder-wide middleware, outermost in every chain
	pub middleware: &'a [Arc<dyn Middleware>],
	pub discriminator: &'a str,
	pub common_schema: Option<&'a ObjectSchema>,
	pub annotations: Option<&'a ToolAnnotations>,
	pub has_group: bool,
	pub description_style: DescriptionStyle,
}

/// Compiled form of a builder
#[derive(Debug)]
pub struct CompiledBuilder {
	pub tool: Tool,
	pub context: Arc<ExecutionContext>,
	pub metadata: Vec<ActionMetadata>,
}

/// Immutable per-builder state used by every call
pub struct ExecutionContext {
	action_map: HashMap<String, ActionDefinition>,
	chains: HashMap<String, CompiledChain>,
	/// `None` means the action takes its arguments unvalidated
	validation_cache: HashMap<String, Option<SchemaValidator>>,
	discriminator: String,
	tool_name: String,
	action_keys: Vec<String>,
	action_keys_string: String,
}

impl ExecutionContext {
	pub fn action(&self, key: &str) -> Option<&ActionDefinition> {
		self.action_map.get(key)
	}

	pub fn chain(&self, key: &str) -> Option<&CompiledChain> {
		self.chains.get(key)
	}

	/// Merged validation schema for `key`, if the action has one
	pub fn validation_schema(&self, key: &str) -> Option<&ObjectSchema> {
		self.validator(key).map(SchemaValidator::schema)
	}

	/// Compiled validator for `key`, if the action has a schema
	pub fn validator(&self, key: &str) -> Option<&SchemaValidator> {
		self.validation_cache.get(key).and_then(Option::as_ref)
	}

	pub fn discriminator(&self) -> &str {
		&self.discriminator
	}

	pub fn tool_name(&self) -> &str {
		&self.tool_name
	}

	/// Action keys in declaration order
	pub fn action_keys(&self) -> &[String] {
		&self.action_keys
	}

	/// Comma-joined action keys, precomputed for error messages
	pub fn action_keys_string(&self) -> &str {
		&self.action_keys_string
	}
}

impl fmt::Debug for ExecutionContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExecutionContext")
			.field("tool_name", &self.tool_name)
			.field("discriminator", &self.discriminator)
			.field("action_keys", &self.action_keys)
			.finish()
	}
}

/// Compile a builder into its tool and execution context
pub fn compile_builder(input: CompileInput<'_>) -> Result<CompiledBuilder, CompileError> {
	if input.name.trim().is_empty() {
		return Err(CompileError::InvalidToolName(input.name.to_string()));
	}
	if input.actions.is_empty() {
		return Err(CompileError::NoActions(input.name.to_string()));
	}
	let mut seen = HashSet::new();
	for action in input.actions {
		if !seen.insert(action.key.as_str()) {
			return Err(CompileError::duplicate_action(input.name, &action.key));
		}
	}
	// The discriminator is consumed by routing and never reaches validation
	let declares_discriminator = |schema: Option<&ObjectSchema>| {
		schema.is_some_and(|s| s.get(input.discriminator).is_some())
	};
	if declares_discriminator(input.common_schema)
		|| input.actions.iter().any(|a| declares_discriminator(a.schema.as_ref()))
	{
		return Err(CompileError::reserved_field(input.name, input.discriminator));
	}

	// Validation schemas first: metadata needs their required fields
	let mut validation_cache: HashMap<String, Option<SchemaValidator>> = HashMap::new();
	for action in input.actions {
		let merged = merge_schemas(
			input.common_schema,
			&action.omit_common_fields,
			action.schema.as_ref(),
		);
		let validator = merged
			.map(|schema| schema.compile())
			.transpose()
			.map_err(|e| CompileError::invalid_schema(input.name, &action.key, e.to_string()))?;
		validation_cache.insert(action.key.clone(), validator);
	}

	let metadata: Vec<ActionMetadata> = input
		.actions
		.iter()
		.map(|a| {
			let validator = validation_cache.get(&a.key).and_then(Option::as_ref);
			a.metadata(validator.map(SchemaValidator::schema))
		})
		.collect();

	let description =
		input
			.description_style
			.render(&metadata, input.name, input.description, input.has_group);
	let input_schema = grouped_input_schema(&input);
	let annotations = aggregate_annotations(metadata.iter().map(|m| &m.flags), input.annotations);

	let tool = Tool {
		name: Cow::Owned(input.name.to_string()),
		title: annotations.title.clone(),
		description: Some(Cow::Owned(description)),
		input_schema: Arc::new(input_schema),
		output_schema: None,
		annotations: Some(annotations),
		icons: None,
		meta: None,
	};

	let chains = compile_chains(input.actions, input.middleware);
	let action_keys: Vec<String> = input.actions.iter().map(|a| a.key.clone()).collect();
	let action_keys_string = action_keys.join(", ");
	let action_map = input
		.actions
		.iter()
		.map(|a| (a.key.clone(), a.clone()))
		.collect();

	debug!(
		target: "actions",
		tool = %input.name,
		actions = action_keys.len(),
		"compiled builder"
	);

	Ok(CompiledBuilder {
		tool,
		context: Arc::new(ExecutionContext {
			action_map,
			chains,
			validation_cache,
			discriminator: input.discriminator.to_string(),
			tool_name: input.name.to_string(),
			action_keys,
			action_keys_string,
		}),
		metadata,
	})
}

/// Input schema of the single grouped tool.
///
/// Layout: the discriminator enum, then common fields (required only when
/// every action keeps them), then the union of action-specific fields, each
/// optional and annotated with the actions that use it.
fn grouped_input_schema(input: &CompileInput<'_>) -> JsonObject {
	let keys: Vec<&str> = input.actions.iter().map(|a| a.key.as_str()).collect();
	let mut properties = Map::new();
	let mut required = vec![Value::String(input.discriminator.to_string())];

	properties.insert(
		input.discriminator.to_string(),
		serde_json::json!({
			"type": "string",
			"enum": keys,
			"description": "The action to perform",
		}),
	);

	if let Some(common) = input.common_schema {
		for (name, field) in common.fields() {
			let omitted_by: Vec<&str> = input
				.actions
				.iter()
				.filter(|a| a.omit_common_fields.iter().any(|f| f == name))
				.map(|a| a.key.as_str())
				.collect();
			let mut schema = field.to_json_schema();
			if omitted_by.is_empty() {
				if !field.optional {
					required.push(Value::String(name.to_string()));
				}
			} else {
				annotate(&mut schema, &format!("(not used by: {})", omitted_by.join(", ")));
			}
			properties.insert(name.to_string(), schema);
		}
	}

	// Action-specific fields, first definition wins, in declaration order
	let mut specific: Vec<(&str, Value, Vec<&str>, Vec<&str>)> = Vec::new();
	for action in input.actions {
		let Some(ref schema) = action.schema else {
			continue;
		};
		for (name, field) in schema.fields() {
			if properties.contains_key(name) {
				continue;
			}
			let idx = match specific.iter().position(|(n, ..)| *n == name) {
				Some(idx) => idx,
				None => {
					specific.push((name, field.to_json_schema(), Vec::new(), Vec::new()));
					specific.len() - 1
				},
			};
			let (_, _, required_for, optional_for) = &mut specific[idx];
			if field.optional {
				optional_for.push(action.key.as_str());
			} else {
				required_for.push(action.key.as_str());
			}
		}
	}
	for (name, mut schema, required_for, optional_for) in specific {
		let note = match (required_for.is_empty(), optional_for.is_empty()) {
			(false, true) => format!("Required for: {}", required_for.join(", ")),
			(true, _) => format!("For: {}", optional_for.join(", ")),
			(false, false) => format!(
				"Required for: {}. Optional for: {}",
				required_for.join(", "),
				optional_for.join(", ")
			),
		};
		annotate(&mut schema, &note);
		properties.insert(name.to_string(), schema);
	}

	let mut schema = Map::new();
	schema.insert("type".into(), "object".into());
	schema.insert("properties".into(), Value::Object(properties));
	schema.insert("required".into(), Value::Array(required));
	schema
}

/// Append `note` to a property's description
fn annotate(schema: &mut Value, note: &str) {
	let Some(obj) = schema.as_object_mut() else {
		return;
	};
	let description = match obj.get("description").and_then(Value::as_str) {
		Some(existing) => format!("{}. {note}", existing.trim_end_matches('.')),
		None => note.to_string(),
	};
	obj.insert("description".into(), Value::String(description));
}
