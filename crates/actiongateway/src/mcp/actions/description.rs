// Tool description rendering

use itertools::Itertools;

use super::types::{ActionFlags, ActionMetadata};

/// Custom renderer: `(actions, tool name, explicit description, has groups)`
pub type DescriptionFn = fn(&[ActionMetadata], &str, Option<&str>, bool) -> String;

/// How a grouped tool's description is generated from its actions
#[derive(Debug, Clone, Copy, Default)]
pub enum DescriptionStyle {
	/// One line: base description plus the list of action keys
	#[default]
	Compact,
	/// One line per action with requirements and markers, grouped under headings
	Detailed,
	Custom(DescriptionFn),
}

impl DescriptionStyle {
	pub fn render(
		&self,
		actions: &[ActionMetadata],
		name: &str,
		explicit: Option<&str>,
		has_group: bool,
	) -> String {
		match self {
			DescriptionStyle::Compact => compact(actions, name, explicit),
			DescriptionStyle::Detailed => detailed(actions, name, explicit, has_group),
			DescriptionStyle::Custom(f) => f(actions, name, explicit, has_group),
		}
	}
}

/// ` [READ-ONLY]`, ` [DESTRUCTIVE]` and ` [IDEMPOTENT]` suffixes for the set flags
pub fn flag_markers(flags: &ActionFlags) -> String {
	let mut out = String::new();
	if flags.read_only {
		out.push_str(" [READ-ONLY]");
	}
	if flags.destructive {
		out.push_str(" [DESTRUCTIVE]");
	}
	if flags.idempotent {
		out.push_str(" [IDEMPOTENT]");
	}
	out
}

/// Description of a single action exposed as its own tool
pub fn flat_description(builder_name: &str, action: &ActionMetadata) -> String {
	let base = match action.description {
		Some(ref d) => d.clone(),
		None => format!("{} action of {}", action.key, builder_name),
	};
	format!("{base}{}", flag_markers(&action.flags))
}

fn base_description(name: &str, explicit: Option<&str>) -> String {
	match explicit {
		Some(d) => d.trim_end_matches('.').to_string(),
		None => format!("Manage {name}"),
	}
}

fn compact(actions: &[ActionMetadata], name: &str, explicit: Option<&str>) -> String {
	format!(
		"{}. Actions: {}",
		base_description(name, explicit),
		actions.iter().map(|a| a.key.as_str()).join(", ")
	)
}

fn action_line(action: &ActionMetadata) -> String {
	let mut line = format!("- {}", action.key);
	if let Some(ref d) = action.description {
		line.push_str(": ");
		line.push_str(d);
	}
	if !action.required_fields.is_empty() {
		line.push_str(&format!(" (requires: {})", action.required_fields.join(", ")));
	}
	line.push_str(&flag_markers(&action.flags));
	line
}

fn detailed(
	actions: &[ActionMetadata],
	name: &str,
	explicit: Option<&str>,
	has_group: bool,
) -> String {
	let mut out = format!("{}.\n\nActions:", base_description(name, explicit));

	if !has_group {
		for action in actions {
			out.push('\n');
			out.push_str(&action_line(action));
		}
		return out;
	}

	// Ungrouped actions first, then one heading per group in declaration order
	for action in actions.iter().filter(|a| a.group.is_none()) {
		out.push('\n');
		out.push_str(&action_line(action));
	}
	let groups = actions
		.iter()
		.filter_map(|a| a.group.as_deref().map(|g| (g, a.group_description.as_deref())))
		.unique_by(|(g, _)| *g)
		.collect::<Vec<_>>();
	for (group, group_description) in groups {
		out.push_str("\n\n");
		match group_description {
			Some(d) => out.push_str(&format!("{group}: {d}")),
			None => out.push_str(&format!("{group}:")),
		}
		for action in actions.iter().filter(|a| a.group.as_deref() == Some(group)) {
			out.push('\n');
			out.push_str(&action_line(action));
		}
	}
	out
}
