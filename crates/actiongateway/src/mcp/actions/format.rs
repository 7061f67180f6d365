// Validation error formatting
//
// Turns validator issues into one caller-facing message: a banner naming the
// action, one line per offending field (what was sent, what is expected),
// and a closing remediation sentence.

use serde_json::Value;

use super::schema::{Issue, IssueKind, Limit, StringFormat, limit_value, lookup};

/// Longest string value echoed back before truncation
const MAX_ECHO_CHARS: usize = 100;

const REMEDIATION: &str =
	"Fix the fields above and call the action again with corrected arguments.";

/// Format validation issues for `action_path` against the object the caller sent
pub fn format_validation_error(issues: &[Issue], action_path: &str, sent: &Value) -> String {
	let mut out = format!("VALIDATION FAILED: {}\n", action_path.to_uppercase());
	for issue in issues {
		out.push_str("  - ");
		out.push_str(&format_issue(issue, sent));
		out.push('\n');
	}
	out.push_str(REMEDIATION);
	out
}

fn format_issue(issue: &Issue, sent: &Value) -> String {
	let received = match lookup(sent, &issue.path) {
		None => "(missing)".to_string(),
		Some(value) => format!("You sent: {}", describe_value(value)),
	};
	format!("{}: {}. {}", issue.field_path(), received, hint(&issue.kind))
}

/// Short, caller-facing rendering of a sent value
pub fn describe_value(value: &Value) -> String {
	match value {
		Value::String(s) => {
			let shown = if s.chars().count() > MAX_ECHO_CHARS {
				let truncated: String = s.chars().take(MAX_ECHO_CHARS).collect();
				format!("{truncated}...")
			} else {
				s.clone()
			};
			// JSON quoting keeps quotes and newlines from breaking the line layout
			Value::String(shown).to_string()
		},
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		Value::Null => "null".to_string(),
		Value::Array(arr) => format!("array({})", arr.len()),
		Value::Object(_) => "object".to_string(),
	}
}

fn hint(kind: &IssueKind) -> String {
	match kind {
		IssueKind::InvalidType { expected, .. } => format!("Expected type: {expected}."),
		IssueKind::TooSmall(limit) => match limit {
			Limit::Value(_) => format!("Must be >= {}.", limit_value(limit)),
			Limit::Length(n) => format!("Must be at least {n} characters."),
			Limit::Items(n) => format!("Must contain at least {n} items."),
		},
		IssueKind::TooBig(limit) => match limit {
			Limit::Value(_) => format!("Must be <= {}.", limit_value(limit)),
			Limit::Length(n) => format!("Must be at most {n} characters."),
			Limit::Items(n) => format!("Must contain at most {n} items."),
		},
		IssueKind::InvalidEnum { options } => {
			let quoted: Vec<String> = options.iter().map(|o| format!("\"{o}\"")).collect();
			format!("Valid values: {}.", quoted.join(", "))
		},
		IssueKind::InvalidFormat(format) => match format {
			StringFormat::Email => {
				"Expected a valid email address (e.g. user@example.com).".to_string()
			},
			StringFormat::Url => "Expected a full URL (e.g. https://example.com).".to_string(),
			StringFormat::Uuid => {
				"Expected a UUID (e.g. 123e4567-e89b-12d3-a456-426614174000).".to_string()
			},
			StringFormat::DateTime => {
				"Expected an ISO 8601 datetime (e.g. 2024-01-15T10:30:00Z).".to_string()
			},
		},
		IssueKind::PatternMismatch { pattern } => format!("Must match the pattern /{pattern}/."),
		IssueKind::UnrecognizedKey => "Unknown field; remove it.".to_string(),
		IssueKind::Other(message) => format!("{}.", message.trim_end_matches('.')),
	}
}
