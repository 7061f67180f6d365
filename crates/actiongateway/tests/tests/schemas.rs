// Rendered input schemas cross-checked against a JSON Schema validator

use std::sync::Arc;

use actiongateway::mcp::actions::{
	ActionBuilder, ActionDefinition, ActionOutput, CallContext, Field, ObjectSchema, ToolBuilder,
	ToolExposition, compile_exposition, handler_fn,
};
use jsonschema::{Draft, Validator};
use rmcp::model::Tool;
use serde_json::{Value, json};

fn validator(tool: &Tool) -> anyhow::Result<Validator> {
	let schema = Value::Object(tool.input_schema.as_ref().clone());
	jsonschema::options()
		.with_draft(Draft::Draft202012)
		.build(&schema)
		.map_err(|e| anyhow::anyhow!("invalid schema for {}: {e}", tool.name))
}

fn tasks() -> Arc<dyn ToolBuilder> {
	let echo = |key: &str| {
		let handler = handler_fn(|_ctx, args| async move { Ok(ActionOutput::Value(args)) });
		ActionDefinition::new(key, handler)
	};
	Arc::new(
		ActionBuilder::new("tasks")
			.common_schema(
				ObjectSchema::new()
					.field("project_id", Field::string())
					.field("verbose", Field::boolean().optional()),
			)
			.action(
				echo("search").schema(
					ObjectSchema::new()
						.field("query", Field::string().min_length(2))
						.field("limit", Field::integer().minimum(1.0).maximum(50.0).optional())
						.field("status", Field::enumeration(["open", "done"]).optional())
						.field("labels", Field::array(Field::string()).max_items(3).optional()),
				),
			)
			.action(echo("health").omit_common(["project_id", "verbose"])),
	)
}

/// Arguments paired with whether they should pass `tasks_search` validation
fn search_cases() -> Vec<(Value, bool)> {
	vec![
		(json!({"project_id": "p", "query": "bug"}), true),
		(json!({"project_id": "p", "query": "bug", "limit": 10, "status": "open"}), true),
		(json!({"project_id": "p", "query": "bug", "labels": ["a", "b"]}), true),
		(json!({"query": "bug"}), false),
		(json!({"project_id": "p", "query": "b"}), false),
		(json!({"project_id": "p", "query": "bug", "limit": 0}), false),
		(json!({"project_id": "p", "query": "bug", "limit": 2.5}), false),
		(json!({"project_id": "p", "query": "bug", "status": "later"}), false),
		(json!({"project_id": "p", "query": "bug", "labels": ["a", "b", "c", "d"]}), false),
		(json!({"project_id": "p", "query": "bug", "unknown": 1}), false),
		(json!({"project_id": 7, "query": "bug"}), false),
	]
}

#[tokio::test]
async fn test_flat_schema_agrees_with_dispatch_validation() -> anyhow::Result<()> {
	let builder = tasks();
	let exposition = compile_exposition(&[builder], ToolExposition::Flat, "_")?;
	let tool = exposition
		.tools
		.iter()
		.find(|t| t.name == "tasks_search")
		.expect("tasks_search");
	let schema = validator(tool)?;
	let route = exposition.route("tasks_search").expect("route");

	for (args, valid) in search_cases() {
		assert_eq!(schema.is_valid(&args), valid, "schema disagrees on {args}");
		let result = route.execute(CallContext::new(), args.clone()).await?;
		assert_eq!(result.is_error, Some(!valid), "dispatch disagrees on {args}");
	}
	Ok(())
}

#[test]
fn test_grouped_schema_accepts_every_valid_flat_call() -> anyhow::Result<()> {
	let builder = tasks();
	let grouped = compile_exposition(&[builder], ToolExposition::Grouped, "_")?;
	let schema = validator(&grouped.tools[0])?;

	for (mut args, valid) in search_cases() {
		if !valid {
			continue;
		}
		args["action"] = json!("search");
		assert!(schema.is_valid(&args), "grouped schema rejects {args}");
	}
	assert!(schema.is_valid(&json!({"action": "health"})));
	assert!(!schema.is_valid(&json!({"action": "reindex"})));
	assert!(!schema.is_valid(&json!({"project_id": "p"})));
	Ok(())
}

#[test]
fn test_fully_omitted_common_schema() -> anyhow::Result<()> {
	let builder = tasks();
	let exposition = compile_exposition(&[builder], ToolExposition::Flat, "_")?;
	let health = exposition
		.tools
		.iter()
		.find(|t| t.name == "tasks_health")
		.expect("tasks_health");

	assert_eq!(
		Value::Object(health.input_schema.as_ref().clone()),
		json!({"type": "object", "properties": {}})
	);
	let search = exposition
		.tools
		.iter()
		.find(|t| t.name == "tasks_search")
		.expect("tasks_search");
	let required = search.input_schema.get("required").cloned().unwrap_or_default();
	assert_eq!(required, json!(["project_id", "query"]));
	Ok(())
}
