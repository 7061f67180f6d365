// Exposition of grouped builders: names, descriptions, annotations and middleware order

use std::sync::Arc;

use actiongateway::mcp::actions::{
	ActionBuilder, ActionDefinition, ActionOutput, CallContext, CompileError, DescriptionStyle,
	Field, ObjectSchema, ToolBuilder, ToolExposition, compile_exposition, handler_fn,
	middleware_fn,
};
use assert_matches::assert_matches;
use parking_lot::Mutex;
use rmcp::model::ToolAnnotations;
use serde_json::json;

fn ok(key: &str) -> ActionDefinition {
	ActionDefinition::new(key, handler_fn(|_ctx, _args| async { Ok(ActionOutput::from("done")) }))
}

fn teams(log: Arc<Mutex<Vec<&'static str>>>) -> ActionBuilder {
	let tracer = |name: &'static str| {
		let log = log.clone();
		middleware_fn(move |ctx, args, next| {
			let log = log.clone();
			async move {
				log.lock().push(name);
				next.run(ctx, args).await
			}
		})
	};

	ActionBuilder::new("teams")
		.describe("Team administration")
		.description_style(DescriptionStyle::Detailed)
		.middleware(tracer("builder"))
		.action(ok("list").describe("List teams").read_only().idempotent())
		.group("members", |g| {
			g.describe("Team membership")
				.middleware(tracer("group"))
				.action(
					ok("add")
						.describe("Add a member")
						.schema(ObjectSchema::new().field("user", Field::string().email()))
						.middleware(tracer("action")),
				)
				.action(ok("remove").describe("Remove a member").destructive().idempotent())
		})
}

#[test]
fn test_grouped_tool_shape() -> anyhow::Result<()> {
	let builder: Arc<dyn ToolBuilder> = Arc::new(teams(Arc::new(Mutex::new(Vec::new()))));
	let exposition = compile_exposition(&[builder], ToolExposition::Grouped, "_")?;
	let tool = &exposition.tools[0];

	assert_eq!(tool.name, "teams");
	assert_eq!(
		tool.description.as_deref(),
		Some(
			"Team administration.\n\nActions:\n\
			 - list: List teams [READ-ONLY] [IDEMPOTENT]\n\n\
			 members: Team membership\n\
			 - members.add: Add a member (requires: user)\n\
			 - members.remove: Remove a member [DESTRUCTIVE] [IDEMPOTENT]"
		)
	);
	assert_eq!(
		tool.input_schema.get("properties").and_then(|p| p.get("action")),
		Some(&json!({
			"type": "string",
			"enum": ["list", "members.add", "members.remove"],
			"description": "The action to perform"
		}))
	);

	let hints = tool.annotations.as_ref().expect("annotations");
	assert_eq!(hints.read_only_hint, Some(false));
	assert_eq!(hints.destructive_hint, Some(true));
	assert_eq!(hints.idempotent_hint, Some(false));
	Ok(())
}

#[test]
fn test_explicit_annotations_override_aggregation() -> anyhow::Result<()> {
	let builder: Arc<dyn ToolBuilder> = Arc::new(
		teams(Arc::new(Mutex::new(Vec::new()))).annotations(ToolAnnotations {
			title: Some("Teams".to_string()),
			read_only_hint: None,
			destructive_hint: Some(false),
			idempotent_hint: None,
			open_world_hint: Some(false),
		}),
	);
	let exposition = compile_exposition(&[builder], ToolExposition::Grouped, "_")?;
	let tool = &exposition.tools[0];
	let hints = tool.annotations.as_ref().expect("annotations");

	assert_eq!(tool.title.as_deref(), Some("Teams"));
	assert_eq!(hints.destructive_hint, Some(false));
	assert_eq!(hints.open_world_hint, Some(false));
	assert_eq!(hints.read_only_hint, Some(false));
	Ok(())
}

#[test]
fn test_flat_keeps_compound_keys() -> anyhow::Result<()> {
	let builder: Arc<dyn ToolBuilder> = Arc::new(teams(Arc::new(Mutex::new(Vec::new()))));
	let exposition = compile_exposition(&[builder], ToolExposition::Flat, "__")?;

	let names: Vec<_> = exposition.tool_names().collect();
	assert_eq!(names, vec!["teams__list", "teams__members.add", "teams__members.remove"]);

	let remove = &exposition.tools[2];
	assert_eq!(
		remove.description.as_deref(),
		Some("Remove a member [DESTRUCTIVE] [IDEMPOTENT]")
	);
	let hints = remove.annotations.as_ref().expect("annotations");
	assert_eq!(hints.destructive_hint, Some(true));
	assert_eq!(hints.read_only_hint, Some(false));
	Ok(())
}

#[tokio::test]
async fn test_middleware_runs_outermost_first() -> anyhow::Result<()> {
	let log = Arc::new(Mutex::new(Vec::new()));
	let builder: Arc<dyn ToolBuilder> = Arc::new(teams(log.clone()));
	let exposition = compile_exposition(&[builder], ToolExposition::Flat, "_")?;

	exposition
		.route("teams_members.add")
		.expect("route")
		.execute(CallContext::new(), json!({"user": "a@example.com"}))
		.await?;
	assert_eq!(*log.lock(), vec!["builder", "group", "action"]);

	log.lock().clear();
	exposition
		.route("teams_list")
		.expect("route")
		.execute(CallContext::new(), json!({}))
		.await?;
	assert_eq!(*log.lock(), vec!["builder"]);
	Ok(())
}

#[test]
fn test_build_tool_definition_is_cached_and_matches_grouped() -> anyhow::Result<()> {
	let builder: Arc<dyn ToolBuilder> = Arc::new(teams(Arc::new(Mutex::new(Vec::new()))));
	let first = builder.build_tool_definition()?;
	let second = builder.build_tool_definition()?;
	assert!(Arc::ptr_eq(&first, &second));

	let exposition = compile_exposition(&[builder.clone()], ToolExposition::Grouped, "_")?;
	assert_eq!(
		serde_json::to_string(&exposition.tools[0])?,
		serde_json::to_string(&first.tool)?
	);
	Ok(())
}

#[test]
fn test_name_collisions_between_builders() {
	let a: Arc<dyn ToolBuilder> = Arc::new(ActionBuilder::new("teams").action(ok("members.add")));
	let b: Arc<dyn ToolBuilder> = Arc::new(teams(Arc::new(Mutex::new(Vec::new()))));
	let err = compile_exposition(&[a, b], ToolExposition::Flat, "_").unwrap_err();
	assert_matches!(err, CompileError::DuplicateToolName(ref name) if name == "teams_members.add");
}
