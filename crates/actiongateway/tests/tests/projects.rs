// End-to-end tests: a `projects` builder served through the tool registry

use std::sync::Arc;

use actiongateway::mcp::actions::{
	ActionBuilder, ActionDefinition, ActionError, ActionOutput, CallContext, ExpositionConfig,
	Field, ObjectSchema, ResponseBuilder, ToolBuilder, ToolRegistry, handler_fn, middleware_fn,
	presenter_fn, tool_error,
};
use parking_lot::Mutex;
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Caller(String);

fn text_of(result: &CallToolResult) -> String {
	result
		.content
		.iter()
		.filter_map(|c| match &c.raw {
			RawContent::Text(t) => Some(t.text.clone()),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Builder with an in-memory project store and an audit trail
fn projects(audit: Arc<Mutex<Vec<String>>>) -> Arc<dyn ToolBuilder> {
	let store = Arc::new(Mutex::new(vec![json!({"id": "p1", "name": "Alpha"})]));

	let list = {
		let store = store.clone();
		ActionDefinition::new(
			"list",
			handler_fn(move |_ctx, _args| {
				let store = store.clone();
				async move { Ok(ActionOutput::Value(Value::Array(store.lock().clone()))) }
			}),
		)
		.describe("List projects")
		.read_only()
		.presenter(presenter_fn(|data, _ctx| {
			let count = data.as_array().map(Vec::len).unwrap_or_default();
			ResponseBuilder::new()
				.text(format!("{count} project(s)"))
				.structured(data)
		}))
	};

	let create = {
		let store = store.clone();
		ActionDefinition::new(
			"create",
			handler_fn(move |_ctx, args| {
				let store = store.clone();
				async move {
					let mut store = store.lock();
					let project = json!({
						"id": format!("p{}", store.len() + 1),
						"name": args["name"],
						"workspace": args["workspace_id"],
					});
					store.push(project.clone());
					Ok(ActionOutput::Value(project))
				}
			}),
		)
		.describe("Create a project")
		.schema(ObjectSchema::new().field("name", Field::string().min_length(1)))
	};

	let delete = ActionDefinition::new(
		"delete",
		handler_fn(|_ctx, args| async move {
			Ok(tool_error(
				"NOT_FOUND",
				&format!("Project {} does not exist", args["id"]),
				Some("Call projects_list to see valid ids"),
			)
			.into())
		}),
	)
	.schema(ObjectSchema::new().field("id", Field::string()))
	.destructive()
	.idempotent();

	let audited = middleware_fn(move |ctx, args, next| {
		let audit = audit.clone();
		async move {
			let caller = ctx
				.extension::<Caller>()
				.map(|c| c.0.clone())
				.unwrap_or_else(|| "anonymous".to_string());
			audit.lock().push(format!("{caller} {}", ctx.action_path()));
			next.run(ctx, args).await
		}
	});

	Arc::new(
		ActionBuilder::new("projects")
			.describe("Project management")
			.tag("core")
			.common_schema(ObjectSchema::new().field("workspace_id", Field::string()))
			.middleware(audited)
			.action(list)
			.action(create)
			.action(delete),
	)
}

#[tokio::test]
async fn test_flat_projects_scenario() -> anyhow::Result<()> {
	let audit = Arc::new(Mutex::new(Vec::new()));
	let registry = ToolRegistry::new(ExpositionConfig::flat())?;
	registry.register(projects(audit.clone()))?;

	let names: Vec<String> = registry.list_tools().iter().map(|t| t.name.to_string()).collect();
	assert_eq!(names, vec!["projects_list", "projects_create", "projects_delete"]);

	// Missing common field is reported as (missing); nothing reaches the handler
	let result = registry
		.call_tool("projects_create", json!({"name": "X"}), CallContext::new())
		.await?;
	assert_eq!(result.is_error, Some(true));
	let text = text_of(&result);
	assert!(text.starts_with("VALIDATION FAILED: PROJECTS/CREATE"));
	assert!(text.contains("workspace_id: (missing)"));
	assert!(audit.lock().is_empty());

	let ctx = CallContext::new().with_extension(Caller("alice".to_string()));
	let result = registry
		.call_tool("projects_create", json!({"name": "Beta", "workspace_id": "w1"}), ctx)
		.await?;
	assert_eq!(result.is_error, Some(false));
	let created: Value = serde_json::from_str(&text_of(&result))?;
	assert_eq!(created, json!({"id": "p2", "name": "Beta", "workspace": "w1"}));

	let result = registry
		.call_tool("projects_list", json!({"workspace_id": "w1"}), CallContext::new())
		.await?;
	assert_eq!(text_of(&result), "2 project(s)");
	assert_eq!(result.structured_content.as_ref().and_then(Value::as_array).map(Vec::len), Some(2));

	assert_eq!(
		*audit.lock(),
		vec!["alice projects/create", "anonymous projects/list"]
	);
	Ok(())
}

#[tokio::test]
async fn test_handler_returned_tool_error() -> anyhow::Result<()> {
	let registry = ToolRegistry::new(ExpositionConfig::grouped())?;
	registry.register(projects(Arc::new(Mutex::new(Vec::new()))))?;

	let result = registry
		.call_tool(
			"projects",
			json!({"action": "delete", "workspace_id": "w1", "id": "p9"}),
			CallContext::new(),
		)
		.await?;

	assert_eq!(result.is_error, Some(true));
	assert_eq!(
		text_of(&result),
		"[NOT_FOUND] Project \"p9\" does not exist\nSuggestion: Call projects_list to see valid ids"
	);
	Ok(())
}

#[tokio::test]
async fn test_flat_and_grouped_registries_respond_identically() -> anyhow::Result<()> {
	let flat = ToolRegistry::new(ExpositionConfig::flat())?;
	let grouped = ToolRegistry::new(ExpositionConfig::grouped())?;
	flat.register(projects(Arc::new(Mutex::new(Vec::new()))))?;
	grouped.register(projects(Arc::new(Mutex::new(Vec::new()))))?;

	let calls = [
		("list", json!({"workspace_id": "w1"})),
		("list", json!({})),
		("create", json!({"workspace_id": "w1", "name": ""})),
		("create", json!({"workspace_id": "w1", "name": "Gamma", "extra": true})),
		("create", json!({"workspace_id": "w1", "name": "Gamma"})),
		("delete", json!({"workspace_id": "w1", "id": "p1"})),
	];

	for (action, args) in calls {
		let via_flat = flat
			.call_tool(&format!("projects_{action}"), args.clone(), CallContext::new())
			.await?;
		let mut grouped_args = args.clone();
		grouped_args["action"] = json!(action);
		let via_grouped = grouped
			.call_tool("projects", grouped_args, CallContext::new())
			.await?;
		assert_eq!(via_flat, via_grouped, "{action} {args}");
	}
	Ok(())
}

#[tokio::test]
async fn test_concurrent_calls_share_one_context() -> anyhow::Result<()> {
	let registry = Arc::new(ToolRegistry::default());
	registry.register(projects(Arc::new(Mutex::new(Vec::new()))))?;

	let calls = (0..16).map(|i| {
		let registry = registry.clone();
		async move {
			registry
				.call_tool(
					"projects_create",
					json!({"workspace_id": "w", "name": format!("n{i}")}),
					CallContext::new(),
				)
				.await
		}
	});
	let results = futures::future::join_all(calls).await;

	for result in results {
		assert_eq!(result?.is_error, Some(false));
	}
	let result = registry
		.call_tool("projects_list", json!({"workspace_id": "w"}), CallContext::new())
		.await?;
	assert_eq!(text_of(&result), "17 project(s)");
	Ok(())
}

#[tokio::test]
async fn test_handler_failures_propagate_as_errors() -> anyhow::Result<()> {
	let builder: Arc<dyn ToolBuilder> = Arc::new(
		ActionBuilder::new("jobs").action(ActionDefinition::new(
			"run",
			handler_fn(|_ctx, _args| async {
				Err(ActionError::Other(anyhow::anyhow!("worker pool exhausted")))
			}),
		)),
	);
	let registry = ToolRegistry::default();
	registry.register(builder)?;

	let err = registry
		.call_tool("jobs_run", Value::Null, CallContext::new())
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), "worker pool exhausted");
	Ok(())
}
