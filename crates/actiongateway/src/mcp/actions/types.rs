// Action model types
//
// Declarative description of one builder's actions:
// - Action definitions (key, schema, behavioral flags, middleware, presenter)
// - Group membership for compound `group.action` keys
// - Read-only metadata views handed to description strategies and expositions

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::middleware::{ActionHandler, Middleware};
use super::response::Presenter;
use super::schema::ObjectSchema;

/// Field name used to select an action in grouped calls
pub const DEFAULT_DISCRIMINATOR: &str = "action";

/// Separator between builder name and action key in flat tool names
pub const DEFAULT_SEPARATOR: &str = "_";

/// Separator between group name and action name in compound keys
pub const GROUP_SEPARATOR: &str = ".";

/// How builders are projected onto the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolExposition {
	/// One tool per action
	#[default]
	Flat,
	/// One tool per builder, routed by the discriminator field
	Grouped,
}

/// Behavioral flags of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
	pub read_only: bool,
	pub destructive: bool,
	pub idempotent: bool,
}

/// Group an action was declared in
pub struct GroupInfo {
	pub name: String,
	pub description: Option<String>,
	pub middleware: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for GroupInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GroupInfo")
			.field("name", &self.name)
			.field("description", &self.description)
			.field("middleware", &self.middleware.len())
			.finish()
	}
}

/// A single action: key, input schema, flags, middleware and handler
#[derive(Clone)]
pub struct ActionDefinition {
	pub key: String,
	pub description: Option<String>,
	pub schema: Option<ObjectSchema>,
	/// Common-schema fields this action does not take
	pub omit_common_fields: Vec<String>,
	pub flags: ActionFlags,
	pub middleware: Vec<Arc<dyn Middleware>>,
	pub presenter: Option<Arc<dyn Presenter>>,
	pub group: Option<Arc<GroupInfo>>,
	pub handler: Arc<dyn ActionHandler>,
}

impl ActionDefinition {
	pub fn new(key: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
		Self {
			key: key.into(),
			description: None,
			schema: None,
			omit_common_fields: Vec::new(),
			flags: ActionFlags::default(),
			middleware: Vec::new(),
			presenter: None,
			group: None,
			handler,
		}
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn schema(mut self, schema: ObjectSchema) -> Self {
		self.schema = Some(schema);
		self
	}

	pub fn omit_common<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.omit_common_fields.extend(fields.into_iter().map(Into::into));
		self
	}

	pub fn read_only(mut self) -> Self {
		self.flags.read_only = true;
		self
	}

	pub fn destructive(mut self) -> Self {
		self.flags.destructive = true;
		self
	}

	pub fn idempotent(mut self) -> Self {
		self.flags.idempotent = true;
		self
	}

	/// Append action-level middleware (runs after global and group middleware)
	pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middleware.push(middleware);
		self
	}

	pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
		self.presenter = Some(presenter);
		self
	}

	/// Metadata view of this action; `required_fields` comes from the
	/// merged validation schema when one is known.
	pub fn metadata(&self, merged: Option<&ObjectSchema>) -> ActionMetadata {
		ActionMetadata {
			key: self.key.clone(),
			description: self.description.clone(),
			flags: self.flags,
			group: self.group.as_ref().map(|g| g.name.clone()),
			group_description: self.group.as_ref().and_then(|g| g.description.clone()),
			required_fields: merged.map(ObjectSchema::required_fields).unwrap_or_default(),
		}
	}
}

impl fmt::Debug for ActionDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionDefinition")
			.field("key", &self.key)
			.field("description", &self.description)
			.field("schema", &self.schema)
			.field("omit_common_fields", &self.omit_common_fields)
			.field("flags", &self.flags)
			.field("middleware", &self.middleware.len())
			.field("presenter", &self.presenter.is_some())
			.field("group", &self.group)
			.finish()
	}
}

/// Read-only description of an action, independent of its handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMetadata {
	pub key: String,
	pub description: Option<String>,
	pub flags: ActionFlags,
	pub group: Option<String>,
	pub group_description: Option<String>,
	pub required_fields: Vec<String>,
}
