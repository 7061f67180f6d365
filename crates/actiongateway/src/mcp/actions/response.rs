// Result shaping
//
// Handlers return an `ActionOutput`; `post_process` turns it into the wire
// `CallToolResult` using a fixed priority:
//   1. already a wire response -> unchanged
//   2. a response builder -> build()
//   3. the action has a presenter -> presenter.make(value).build()
//   4. plain text / pretty JSON / fallback text

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

use super::context::CallContext;

/// Text returned when a handler produces an empty string
pub const EMPTY_RESULT_TEXT: &str = "OK";

/// What a handler (or middleware) hands back to the dispatcher
#[derive(Debug, Clone)]
pub enum ActionOutput {
	Response(CallToolResult),
	Builder(ResponseBuilder),
	Value(Value),
	Text(String),
}

impl From<CallToolResult> for ActionOutput {
	fn from(value: CallToolResult) -> Self {
		ActionOutput::Response(value)
	}
}

impl From<ResponseBuilder> for ActionOutput {
	fn from(value: ResponseBuilder) -> Self {
		ActionOutput::Builder(value)
	}
}

impl From<Value> for ActionOutput {
	fn from(value: Value) -> Self {
		ActionOutput::Value(value)
	}
}

impl From<String> for ActionOutput {
	fn from(value: String) -> Self {
		ActionOutput::Text(value)
	}
}

impl From<&str> for ActionOutput {
	fn from(value: &str) -> Self {
		ActionOutput::Text(value.to_string())
	}
}

/// Shapes raw handler data into a response
pub trait Presenter: Send + Sync {
	fn make(&self, data: Value, ctx: &CallContext) -> ResponseBuilder;
}

struct PresenterFn<F>(F);

impl<F> Presenter for PresenterFn<F>
where
	F: Fn(Value, &CallContext) -> ResponseBuilder + Send + Sync,
{
	fn make(&self, data: Value, ctx: &CallContext) -> ResponseBuilder {
		(self.0)(data, ctx)
	}
}

pub fn presenter_fn<F>(f: F) -> Arc<dyn Presenter>
where
	F: Fn(Value, &CallContext) -> ResponseBuilder + Send + Sync + 'static,
{
	Arc::new(PresenterFn(f))
}

/// Incremental builder for a `CallToolResult`
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
	content: Vec<Content>,
	structured: Option<Value>,
	is_error: bool,
}

impl ResponseBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.content.push(Content::text(text.into()));
		self
	}

	/// Append `value` as pretty-printed JSON text
	pub fn json(self, value: &Value) -> Self {
		let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
		self.text(text)
	}

	pub fn structured(mut self, value: Value) -> Self {
		self.structured = Some(value);
		self
	}

	pub fn error(mut self) -> Self {
		self.is_error = true;
		self
	}

	pub fn is_error(&self) -> bool {
		self.is_error
	}

	pub fn build(self) -> CallToolResult {
		CallToolResult {
			content: self.content,
			structured_content: self.structured,
			is_error: Some(self.is_error),
			meta: None,
		}
	}
}

/// Plain text success response
pub fn success(text: impl Into<String>) -> CallToolResult {
	ResponseBuilder::new().text(text).build()
}

/// Plain text error response (`is_error: true`)
pub fn error(text: impl Into<String>) -> CallToolResult {
	ResponseBuilder::new().text(text).error().build()
}

/// Error response carrying a machine-readable code and an optional recovery
/// hint, both as text and as structured content.
pub fn tool_error(code: &str, message: &str, suggestion: Option<&str>) -> CallToolResult {
	let mut text = format!("[{code}] {message}");
	let mut structured = serde_json::json!({
		"code": code,
		"message": message,
	});
	if let Some(suggestion) = suggestion {
		text.push_str("\nSuggestion: ");
		text.push_str(suggestion);
		structured["suggestion"] = Value::String(suggestion.to_string());
	}
	ResponseBuilder::new()
		.text(text)
		.structured(structured)
		.error()
		.build()
}

/// Shape a handler output into the wire response
pub fn post_process(
	output: ActionOutput,
	presenter: Option<&dyn Presenter>,
	ctx: &CallContext,
) -> CallToolResult {
	match output {
		ActionOutput::Response(result) => result,
		ActionOutput::Builder(builder) => builder.build(),
		ActionOutput::Value(value) => {
			if let Some(result) = as_wire_response(&value) {
				return result;
			}
			match presenter {
				Some(presenter) => presenter.make(value, ctx).build(),
				None => render_value(value),
			}
		},
		ActionOutput::Text(text) => match presenter {
			Some(presenter) => presenter.make(Value::String(text), ctx).build(),
			None => render_value(Value::String(text)),
		},
	}
}

/// A JSON value that is already shaped like a `CallToolResult`
fn as_wire_response(value: &Value) -> Option<CallToolResult> {
	if !value.get("content").is_some_and(Value::is_array) {
		return None;
	}
	match serde_json::from_value::<CallToolResult>(value.clone()) {
		Ok(result) => Some(result),
		Err(e) => {
			tracing::debug!(
				target: "actions",
				error = %e,
				"value has a content array but is not a tool result"
			);
			None
		},
	}
}

fn render_value(value: Value) -> CallToolResult {
	match value {
		Value::String(s) if s.is_empty() => success(EMPTY_RESULT_TEXT),
		Value::String(s) => success(s),
		other => ResponseBuilder::new().json(&other).build(),
	}
}
