// Call dispatch: resolve -> validate -> execute chain -> post-process

use rmcp::model::CallToolResult;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::compiled::ExecutionContext;
use super::context::CallContext;
use super::error::ActionError;
use super::format::{describe_value, format_validation_error};
use super::response::{error, post_process};
use super::schema::json_type_name;

impl ExecutionContext {
	/// Execute one call against this builder.
	///
	/// Caller mistakes (missing or unknown action, invalid arguments) come
	/// back as `is_error` responses. Only handler and middleware failures are
	/// returned as `Err`.
	pub async fn execute(
		&self,
		mut ctx: CallContext,
		args: Value,
	) -> Result<CallToolResult, ActionError> {
		let mut args: Map<String, Value> = match args {
			Value::Null => Map::new(),
			Value::Object(map) => map,
			other => {
				return Ok(error(format!(
					"Arguments for tool {} must be an object, got {}.",
					self.tool_name(),
					json_type_name(&other)
				)));
			},
		};

		// The discriminator only routes; it is not part of the action's input
		let key = match args.remove(self.discriminator()) {
			None | Some(Value::Null) => {
				return Ok(error(format!(
					"`{}` is missing. Available actions: {}",
					self.discriminator(),
					self.action_keys_string()
				)));
			},
			Some(Value::String(key)) => key,
			Some(other) => return Ok(self.unknown_action(&other)),
		};

		let (Some(action), Some(chain)) = (self.action(&key), self.chain(&key)) else {
			return Ok(self.unknown_action(&Value::String(key)));
		};

		let sent = Value::Object(args);
		let validated = match self.validator(&key) {
			None => sent,
			Some(validator) => match validator.safe_validate(&sent) {
				Ok(cleaned) => cleaned,
				Err(issues) => {
					let path = format!("{}/{}", self.tool_name(), key);
					warn!(
						target: "actions",
						action = %path,
						issues = issues.len(),
						"argument validation failed"
					);
					return Ok(error(format_validation_error(&issues, &path, &sent)));
				},
			},
		};

		ctx.tool_name = self.tool_name().to_string();
		ctx.action = Some(key);
		debug!(target: "actions", action = %ctx.action_path(), "dispatching");

		let output = chain.invoke(ctx.clone(), validated).await?;
		Ok(post_process(output, action.presenter.as_deref(), &ctx))
	}

	fn unknown_action(&self, requested: &Value) -> CallToolResult {
		error(format!(
			"Unknown action {} for tool {}. Available actions: {}",
			describe_value(requested),
			self.tool_name(),
			self.action_keys_string()
		))
	}
}
