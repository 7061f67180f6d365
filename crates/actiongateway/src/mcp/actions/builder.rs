// Builders
//
// `ToolBuilder` is the capability the exposition compiler and the registry
// work against. `ActionBuilder` is the fluent, declarative implementation:
// actions and groups are appended by value, and the compiled form is cached
// on first use.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rmcp::model::{CallToolResult, ToolAnnotations};
use serde_json::Value;

use super::compiled::{CompileInput, CompiledBuilder, compile_builder};
use super::context::CallContext;
use super::description::DescriptionStyle;
use super::error::{ActionError, CompileError};
use super::middleware::Middleware;
use super::schema::{ObjectSchema, merge_schemas};
use super::types::{
	ActionDefinition, ActionMetadata, DEFAULT_DISCRIMINATOR, GROUP_SEPARATOR, GroupInfo,
};

/// Anything that can be compiled into tools and execute calls for them
#[async_trait::async_trait]
pub trait ToolBuilder: Send + Sync {
	fn name(&self) -> &str;

	fn tags(&self) -> &[String];

	/// Field carrying the action key in grouped calls
	fn discriminator(&self) -> &str;

	fn action_metadata(&self) -> Vec<ActionMetadata>;

	/// Compile (once) and return the cached result
	fn build_tool_definition(&self) -> Result<Arc<CompiledBuilder>, CompileError>;

	/// Uniform entry point: `args[discriminator]` selects the action
	async fn execute(&self, ctx: CallContext, args: Value) -> Result<CallToolResult, ActionError>;
}

/// Fluent builder for a set of related actions
pub struct ActionBuilder {
	name: String,
	description: Option<String>,
	tags: Vec<String>,
	discriminator: String,
	common_schema: Option<ObjectSchema>,
	annotations: Option<ToolAnnotations>,
	middleware: Vec<Arc<dyn Middleware>>,
	description_style: DescriptionStyle,
	actions: Vec<ActionDefinition>,
	has_group: bool,
	compiled: OnceCell<Arc<CompiledBuilder>>,
}

impl ActionBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			tags: Vec::new(),
			discriminator: DEFAULT_DISCRIMINATOR.to_string(),
			common_schema: None,
			annotations: None,
			middleware: Vec::new(),
			description_style: DescriptionStyle::default(),
			actions: Vec::new(),
			has_group: false,
			compiled: OnceCell::new(),
		}
	}

	// Any change after compilation invalidates the cached result
	fn modified(mut self) -> Self {
		self.compiled.take();
		self
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self.modified()
	}

	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());
		self
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags.extend(tags.into_iter().map(Into::into));
		self
	}

	pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
		self.discriminator = field.into();
		self.modified()
	}

	/// Schema shared by every action, merged with each action's own schema
	pub fn common_schema(mut self, schema: ObjectSchema) -> Self {
		self.common_schema = Some(schema);
		self.modified()
	}

	/// Explicit annotation hints; these override aggregated values
	pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
		self.annotations = Some(annotations);
		self.modified()
	}

	/// Builder-wide middleware, outermost in every action's chain
	pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middleware.push(middleware);
		self.modified()
	}

	pub fn description_style(mut self, style: DescriptionStyle) -> Self {
		self.description_style = style;
		self.modified()
	}

	pub fn action(mut self, action: ActionDefinition) -> Self {
		self.actions.push(action);
		self.modified()
	}

	/// Declare a group; its actions are keyed `name.action` and run the
	/// group's middleware between builder and action middleware.
	pub fn group<F>(mut self, name: impl Into<String>, configure: F) -> Self
	where
		F: FnOnce(GroupBuilder) -> GroupBuilder,
	{
		let group = configure(GroupBuilder::new(name.into()));
		let info = Arc::new(GroupInfo {
			name: group.name,
			description: group.description,
			middleware: group.middleware,
		});
		for mut action in group.actions {
			action.key = format!("{}{}{}", info.name, GROUP_SEPARATOR, action.key);
			action.group = Some(info.clone());
			self.actions.push(action);
		}
		self.has_group = true;
		self.modified()
	}

	pub fn actions(&self) -> &[ActionDefinition] {
		&self.actions
	}

	fn compile(&self) -> Result<CompiledBuilder, CompileError> {
		compile_builder(CompileInput {
			name: &self.name,
			description: self.description.as_deref(),
			actions: &self.actions,
			middleware: &self.middleware,
			discriminator: &self.discriminator,
			common_schema: self.common_schema.as_ref(),
			annotations: self.annotations.as_ref(),
			has_group: self.has_group,
			description_style: self.description_style,
		})
	}
}

#[async_trait::async_trait]
impl ToolBuilder for ActionBuilder {
	fn name(&self) -> &str {
		&self.name
	}

	fn tags(&self) -> &[String] {
		&self.tags
	}

	fn discriminator(&self) -> &str {
		&self.discriminator
	}

	fn action_metadata(&self) -> Vec<ActionMetadata> {
		match self.compiled.get() {
			Some(compiled) => compiled.metadata.clone(),
			None => self
				.actions
				.iter()
				.map(|a| {
					let merged = merge_schemas(
						self.common_schema.as_ref(),
						&a.omit_common_fields,
						a.schema.as_ref(),
					);
					a.metadata(merged.as_ref())
				})
				.collect(),
		}
	}

	fn build_tool_definition(&self) -> Result<Arc<CompiledBuilder>, CompileError> {
		self
			.compiled
			.get_or_try_init(|| self.compile().map(Arc::new))
			.cloned()
	}

	async fn execute(&self, ctx: CallContext, args: Value) -> Result<CallToolResult, ActionError> {
		let compiled = self.build_tool_definition()?;
		compiled.context.execute(ctx, args).await
	}
}

/// Actions and middleware of one group, see [`ActionBuilder::group`]
pub struct GroupBuilder {
	name: String,
	description: Option<String>,
	middleware: Vec<Arc<dyn Middleware>>,
	actions: Vec<ActionDefinition>,
}

impl GroupBuilder {
	fn new(name: String) -> Self {
		Self {
			name,
			description: None,
			middleware: Vec::new(),
			actions: Vec::new(),
		}
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middleware.push(middleware);
		self
	}

	pub fn action(mut self, action: ActionDefinition) -> Self {
		self.actions.push(action);
		self
	}
}
