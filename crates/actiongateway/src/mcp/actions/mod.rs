// Action Compilation & Exposition
//
// Exposes named, grouped actions as MCP tools:
// - Builders declare actions with schemas, flags, middleware and presenters
// - Each builder compiles once into a tool plus an immutable execution context
// - Builders are exposed grouped (one tool each, routed by a discriminator)
//   or flat (one tool per action) with identical dispatch semantics
// - Calls are validated, run through their middleware chain and shaped into
//   a `CallToolResult`

mod annotations;
mod builder;
mod compiled;
mod config;
mod context;
mod description;
mod dispatch;
mod error;
mod exposition;
mod format;
pub mod middleware;
mod response;
pub mod schema;
mod store;
mod types;

pub use annotations::aggregate_annotations;
pub use builder::{ActionBuilder, GroupBuilder, ToolBuilder};
pub use compiled::{CompileInput, CompiledBuilder, ExecutionContext, compile_builder};
pub use config::{ExpositionConfig, TagFilter};
pub use context::CallContext;
pub use description::{DescriptionFn, DescriptionStyle, flag_markers, flat_description};
pub use error::{ActionError, CompileError, ConfigError};
pub use exposition::{ExpositionResult, Route, compile_exposition, validate_separator};
pub use format::{describe_value, format_validation_error};
pub use middleware::{
	ActionHandler, ActionResult, CompiledChain, Middleware, Next, compile_chains, handler_fn,
	middleware_fn,
};
pub use response::{
	ActionOutput, EMPTY_RESULT_TEXT, Presenter, ResponseBuilder, error, post_process, presenter_fn,
	success, tool_error,
};
pub use schema::{Field, FieldKind, Issue, IssueKind, ObjectSchema, StringFormat, merge_schemas};
pub use store::ToolRegistry;
pub use types::{
	ActionDefinition, ActionFlags, ActionMetadata, DEFAULT_DISCRIMINATOR, DEFAULT_SEPARATOR,
	GROUP_SEPARATOR, GroupInfo, ToolExposition,
};
