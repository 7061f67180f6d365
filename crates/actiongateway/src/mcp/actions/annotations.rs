// Tool annotation aggregation

use rmcp::model::ToolAnnotations;

use super::types::ActionFlags;

/// Compute `readOnly` / `destructive` / `idempotent` hints for a set of actions.
///
/// Explicit values always win. Otherwise a tool is read-only or idempotent
/// only if every action is, and destructive if any action is. Passing a
/// single action yields that action's own flags.
pub fn aggregate_annotations<'a, I>(
	actions: I,
	explicit: Option<&ToolAnnotations>,
) -> ToolAnnotations
where
	I: IntoIterator<Item = &'a ActionFlags>,
{
	let mut count = 0usize;
	let mut all_read_only = true;
	let mut all_idempotent = true;
	let mut any_destructive = false;
	for flags in actions {
		count += 1;
		all_read_only &= flags.read_only;
		all_idempotent &= flags.idempotent;
		any_destructive |= flags.destructive;
	}

	let read_only = count > 0 && all_read_only;
	let idempotent = count > 0 && all_idempotent;

	ToolAnnotations {
		title: explicit.and_then(|e| e.title.clone()),
		read_only_hint: explicit.and_then(|e| e.read_only_hint).or(Some(read_only)),
		destructive_hint: explicit
			.and_then(|e| e.destructive_hint)
			.or(Some(any_destructive)),
		idempotent_hint: explicit.and_then(|e| e.idempotent_hint).or(Some(idempotent)),
		open_world_hint: explicit.and_then(|e| e.open_world_hint),
	}
}
