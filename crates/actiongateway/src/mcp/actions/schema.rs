// Declarative object schemas for action inputs
//
// Provides the schema handle the action compiler works with:
// - JSON Schema rendering for tool input schemas
// - Field omission and merging (common + action-specific)
// - Strict mode (unknown fields are rejected)
// - Compiled validators reporting structured issues for the error formatter

use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::paths::LocationSegment;
use jsonschema::{Draft, ValidationError, Validator};
use regex::Regex;
use rmcp::model::JsonObject;
use serde_json::{Map, Value};

/// Well-known string formats, checked through the JSON Schema `format` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
	Email,
	Url,
	Uuid,
	DateTime,
}

impl StringFormat {
	/// Name used for the JSON Schema `format` keyword
	pub fn json_schema_name(self) -> &'static str {
		match self {
			StringFormat::Email => "email",
			StringFormat::Url => "uri",
			StringFormat::Uuid => "uuid",
			StringFormat::DateTime => "date-time",
		}
	}

	fn from_json_schema_name(name: &str) -> Option<Self> {
		match name {
			"email" => Some(StringFormat::Email),
			"uri" => Some(StringFormat::Url),
			"uuid" => Some(StringFormat::Uuid),
			"date-time" => Some(StringFormat::DateTime),
			_ => None,
		}
	}
}

/// The shape of a single field
#[derive(Debug, Clone)]
pub enum FieldKind {
	String {
		min_length: Option<usize>,
		max_length: Option<usize>,
		format: Option<StringFormat>,
		pattern: Option<Regex>,
	},
	Number {
		integer: bool,
		minimum: Option<f64>,
		maximum: Option<f64>,
	},
	Boolean,
	Enum(Vec<String>),
	Array {
		items: Box<Field>,
		min_items: Option<usize>,
		max_items: Option<usize>,
	},
	Object(ObjectSchema),
	Any,
}

impl FieldKind {
	/// Type name shown to callers in schemas and error hints
	pub fn type_name(&self) -> &'static str {
		match self {
			FieldKind::String { .. } | FieldKind::Enum(_) => "string",
			FieldKind::Number { integer: true, .. } => "integer",
			FieldKind::Number { .. } => "number",
			FieldKind::Boolean => "boolean",
			FieldKind::Array { .. } => "array",
			FieldKind::Object(_) => "object",
			FieldKind::Any => "any",
		}
	}
}

/// A field definition inside an [`ObjectSchema`]
#[derive(Debug, Clone)]
pub struct Field {
	pub kind: FieldKind,
	pub description: Option<String>,
	pub optional: bool,
}

impl Field {
	fn of(kind: FieldKind) -> Self {
		Self {
			kind,
			description: None,
			optional: false,
		}
	}

	pub fn string() -> Self {
		Self::of(FieldKind::String {
			min_length: None,
			max_length: None,
			format: None,
			pattern: None,
		})
	}

	pub fn number() -> Self {
		Self::of(FieldKind::Number {
			integer: false,
			minimum: None,
			maximum: None,
		})
	}

	pub fn integer() -> Self {
		Self::of(FieldKind::Number {
			integer: true,
			minimum: None,
			maximum: None,
		})
	}

	pub fn boolean() -> Self {
		Self::of(FieldKind::Boolean)
	}

	pub fn enumeration<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::of(FieldKind::Enum(values.into_iter().map(Into::into).collect()))
	}

	pub fn array(items: Field) -> Self {
		Self::of(FieldKind::Array {
			items: Box::new(items),
			min_items: None,
			max_items: None,
		})
	}

	pub fn object(schema: ObjectSchema) -> Self {
		Self::of(FieldKind::Object(schema))
	}

	pub fn any() -> Self {
		Self::of(FieldKind::Any)
	}

	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn min_length(mut self, n: usize) -> Self {
		if let FieldKind::String { min_length, .. } = &mut self.kind {
			*min_length = Some(n);
		}
		self
	}

	pub fn max_length(mut self, n: usize) -> Self {
		if let FieldKind::String { max_length, .. } = &mut self.kind {
			*max_length = Some(n);
		}
		self
	}

	pub fn format(mut self, f: StringFormat) -> Self {
		if let FieldKind::String { format, .. } = &mut self.kind {
			*format = Some(f);
		}
		self
	}

	pub fn email(self) -> Self {
		self.format(StringFormat::Email)
	}

	pub fn url(self) -> Self {
		self.format(StringFormat::Url)
	}

	pub fn uuid(self) -> Self {
		self.format(StringFormat::Uuid)
	}

	pub fn datetime(self) -> Self {
		self.format(StringFormat::DateTime)
	}

	pub fn pattern(mut self, re: Regex) -> Self {
		if let FieldKind::String { pattern, .. } = &mut self.kind {
			*pattern = Some(re);
		}
		self
	}

	pub fn minimum(mut self, n: f64) -> Self {
		if let FieldKind::Number { minimum, .. } = &mut self.kind {
			*minimum = Some(n);
		}
		self
	}

	pub fn maximum(mut self, n: f64) -> Self {
		if let FieldKind::Number { maximum, .. } = &mut self.kind {
			*maximum = Some(n);
		}
		self
	}

	pub fn min_items(mut self, n: usize) -> Self {
		if let FieldKind::Array { min_items, .. } = &mut self.kind {
			*min_items = Some(n);
		}
		self
	}

	pub fn max_items(mut self, n: usize) -> Self {
		if let FieldKind::Array { max_items, .. } = &mut self.kind {
			*max_items = Some(n);
		}
		self
	}

	/// Render this field as a JSON Schema fragment
	pub fn to_json_schema(&self) -> Value {
		let mut obj = Map::new();
		match &self.kind {
			FieldKind::String {
				min_length,
				max_length,
				format,
				pattern,
			} => {
				obj.insert("type".into(), "string".into());
				if let Some(n) = min_length {
					obj.insert("minLength".into(), (*n).into());
				}
				if let Some(n) = max_length {
					obj.insert("maxLength".into(), (*n).into());
				}
				if let Some(f) = format {
					obj.insert("format".into(), f.json_schema_name().into());
				}
				if let Some(re) = pattern {
					obj.insert("pattern".into(), re.as_str().into());
				}
			},
			FieldKind::Number {
				integer,
				minimum,
				maximum,
			} => {
				let ty = if *integer { "integer" } else { "number" };
				obj.insert("type".into(), ty.into());
				if let Some(n) = minimum {
					obj.insert("minimum".into(), number_value(*n));
				}
				if let Some(n) = maximum {
					obj.insert("maximum".into(), number_value(*n));
				}
			},
			FieldKind::Boolean => {
				obj.insert("type".into(), "boolean".into());
			},
			FieldKind::Enum(values) => {
				obj.insert("type".into(), "string".into());
				obj.insert(
					"enum".into(),
					Value::Array(values.iter().cloned().map(Value::String).collect()),
				);
			},
			FieldKind::Array {
				items,
				min_items,
				max_items,
			} => {
				obj.insert("type".into(), "array".into());
				obj.insert("items".into(), items.to_json_schema());
				if let Some(n) = min_items {
					obj.insert("minItems".into(), (*n).into());
				}
				if let Some(n) = max_items {
					obj.insert("maxItems".into(), (*n).into());
				}
			},
			FieldKind::Object(schema) => {
				obj = schema.to_json_schema();
			},
			FieldKind::Any => {},
		}
		if let Some(ref description) = self.description {
			obj.insert("description".into(), description.clone().into());
		}
		Value::Object(obj)
	}
}

/// Object schema: an ordered set of named fields
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
	fields: IndexMap<String, Field>,
	strict: bool,
}

impl ObjectSchema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add (or replace) a field
	pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
		self.fields.insert(name.into(), field);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Field> {
		self.fields.get(name)
	}

	pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Names of fields that must be present
	pub fn required_fields(&self) -> Vec<String> {
		self
			.fields
			.iter()
			.filter(|(_, f)| !f.optional)
			.map(|(k, _)| k.clone())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Reject unknown fields during validation
	pub fn strict(mut self) -> Self {
		self.strict = true;
		self
	}

	/// Copy of this schema without the named fields
	pub fn omit<S: AsRef<str>>(&self, names: &[S]) -> Self {
		let mut schema = self.clone();
		schema
			.fields
			.retain(|k, _| !names.iter().any(|n| n.as_ref() == k));
		schema
	}

	/// Merge `other` on top of this schema.
	///
	/// Fields from `other` win, except that two object fields with the same
	/// name are merged recursively.
	pub fn merge(&self, other: &ObjectSchema) -> Self {
		let mut merged = self.clone();
		for (name, field) in &other.fields {
			let combined = match (merged.fields.get(name), &field.kind) {
				(
					Some(Field {
						kind: FieldKind::Object(base),
						..
					}),
					FieldKind::Object(overlay),
				) => Field {
					kind: FieldKind::Object(base.merge(overlay)),
					description: field.description.clone(),
					optional: field.optional,
				},
				_ => field.clone(),
			};
			merged.fields.insert(name.clone(), combined);
		}
		merged.strict = self.strict || other.strict;
		merged
	}

	/// Render as a JSON Schema object
	pub fn to_json_schema(&self) -> JsonObject {
		let mut properties = Map::new();
		for (name, field) in &self.fields {
			properties.insert(name.clone(), field.to_json_schema());
		}
		let mut schema = Map::new();
		schema.insert("type".into(), "object".into());
		schema.insert("properties".into(), Value::Object(properties));
		let required = self.required_fields();
		if !required.is_empty() {
			schema.insert(
				"required".into(),
				Value::Array(required.into_iter().map(Value::String).collect()),
			);
		}
		if self.strict {
			schema.insert("additionalProperties".into(), Value::Bool(false));
		}
		schema
	}

	/// Field at `path`, descending through object fields and array items
	pub fn field_at(&self, path: &[PathSegment]) -> Option<&Field> {
		let (PathSegment::Key(first), rest) = path.split_first()? else {
			return None;
		};
		let mut field = self.fields.get(first)?;
		for segment in rest {
			field = match (segment, &field.kind) {
				(PathSegment::Key(key), FieldKind::Object(schema)) => schema.fields.get(key)?,
				(PathSegment::Index(_), FieldKind::Array { items, .. }) => items,
				_ => return None,
			};
		}
		Some(field)
	}

	/// Compile a reusable validator for this schema
	pub fn compile(&self) -> Result<SchemaValidator, ValidationError<'static>> {
		let validator = jsonschema::options()
			.with_draft(Draft::Draft202012)
			.should_validate_formats(true)
			.build(&Value::Object(self.to_json_schema()))?;
		Ok(SchemaValidator {
			schema: self.clone(),
			validator,
		})
	}

	/// Validate `value`, returning the cleaned value or every issue found.
	///
	/// Compiles a validator on each call; hot paths should hold on to a
	/// [`SchemaValidator`] instead.
	pub fn safe_validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
		match self.compile() {
			Ok(validator) => validator.safe_validate(value),
			Err(e) => Err(vec![Issue::new(
				Vec::new(),
				IssueKind::Other(format!("invalid schema: {e}")),
			)]),
		}
	}
}

/// Merge a builder's common schema with one action's schema.
///
/// `omit` is applied to the common schema first; a common schema left with
/// no fields contributes nothing. Returns `None` when neither side
/// contributes, meaning the action accepts its arguments unvalidated.
pub fn merge_schemas<S: AsRef<str>>(
	common: Option<&ObjectSchema>,
	omit: &[S],
	specific: Option<&ObjectSchema>,
) -> Option<ObjectSchema> {
	let common = common
		.map(|c| if omit.is_empty() { c.clone() } else { c.omit(omit) })
		.filter(|c| !c.is_empty());
	let merged = match (common, specific) {
		(None, None) => return None,
		(Some(c), None) => c,
		(None, Some(s)) => s.clone(),
		(Some(c), Some(s)) => c.merge(s),
	};
	Some(merged.strict())
}

/// One element of an issue path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}

/// Numeric, length or item-count bound that was violated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
	Value(f64),
	Length(usize),
	Items(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
	InvalidType { expected: String, received: String },
	TooSmall(Limit),
	TooBig(Limit),
	InvalidEnum { options: Vec<String> },
	InvalidFormat(StringFormat),
	PatternMismatch { pattern: String },
	UnrecognizedKey,
	/// Any other failure, carrying the validator's message
	Other(String),
}

impl fmt::Display for IssueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IssueKind::InvalidType { expected, received } => {
				write!(f, "expected {expected}, received {received}")
			},
			IssueKind::TooSmall(limit) => write!(f, "below minimum {}", limit_value(limit)),
			IssueKind::TooBig(limit) => write!(f, "above maximum {}", limit_value(limit)),
			IssueKind::InvalidEnum { options } => {
				write!(f, "expected one of {}", options.join(", "))
			},
			IssueKind::InvalidFormat(format) => write!(f, "invalid {}", format.json_schema_name()),
			IssueKind::PatternMismatch { pattern } => write!(f, "does not match /{pattern}/"),
			IssueKind::UnrecognizedKey => write!(f, "unrecognized field"),
			IssueKind::Other(message) => f.write_str(message),
		}
	}
}

/// A single validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
	pub path: Vec<PathSegment>,
	pub kind: IssueKind,
}

impl Issue {
	pub fn new(path: Vec<PathSegment>, kind: IssueKind) -> Self {
		Self { path, kind }
	}

	/// Dotted field path, or `(root)` for issues on the value itself
	pub fn field_path(&self) -> String {
		if self.path.is_empty() {
			return "(root)".to_string();
		}
		let mut out = String::new();
		for segment in &self.path {
			match segment {
				PathSegment::Key(key) => {
					if !out.is_empty() {
						out.push('.');
					}
					out.push_str(key);
				},
				PathSegment::Index(i) => {
					out.push_str(&format!("[{i}]"));
				},
			}
		}
		out
	}
}

impl fmt::Display for Issue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.field_path(), self.kind)
	}
}

/// JSON type name of a value, as reported in issues
pub fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Render whole floats as integers so `5.0` shows up as `5`
pub(crate) fn number_value(n: f64) -> Value {
	if n.fract() == 0.0 && n.abs() < 1e15 {
		Value::from(n as i64)
	} else {
		Value::from(n)
	}
}

pub(crate) fn limit_value(limit: &Limit) -> String {
	match limit {
		Limit::Value(n) => number_value(*n).to_string(),
		Limit::Length(n) | Limit::Items(n) => n.to_string(),
	}
}

/// An [`ObjectSchema`] paired with its compiled JSON Schema validator
#[derive(Debug, Clone)]
pub struct SchemaValidator {
	schema: ObjectSchema,
	validator: Validator,
}

impl SchemaValidator {
	pub fn schema(&self) -> &ObjectSchema {
		&self.schema
	}

	/// Validate `value`.
	///
	/// On success returns the cleaned value: explicit nulls for optional
	/// fields and unknown fields of non-strict objects are dropped. On failure
	/// returns every issue, ordered by field declaration.
	pub fn safe_validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
		let cleaned = prune_object(&self.schema, value);
		let mut issues: Vec<Issue> = self
			.validator
			.iter_errors(&cleaned)
			.flat_map(|e| self.issues_from(&e, &cleaned))
			.collect();
		if issues.is_empty() {
			return Ok(cleaned);
		}

		// A type mismatch makes other failures at the same path noise
		let mistyped: Vec<Vec<PathSegment>> = issues
			.iter()
			.filter(|i| matches!(i.kind, IssueKind::InvalidType { .. }))
			.map(|i| i.path.clone())
			.collect();
		issues.retain(|i| {
			matches!(i.kind, IssueKind::InvalidType { .. }) || !mistyped.contains(&i.path)
		});
		issues.sort_by_key(|i| (self.declaration_index(&i.path), i.path.len()));
		Err(issues)
	}

	fn declaration_index(&self, path: &[PathSegment]) -> usize {
		match path.first() {
			Some(PathSegment::Key(key)) => self
				.schema
				.fields
				.get_index_of(key)
				.unwrap_or(self.schema.fields.len()),
			_ => 0,
		}
	}

	fn issues_from(&self, error: &ValidationError<'_>, instance: &Value) -> Vec<Issue> {
		let path: Vec<PathSegment> = error
			.instance_path()
			.iter()
			.map(|segment| match segment {
				LocationSegment::Property(key) => PathSegment::Key(key.into_owned()),
				LocationSegment::Index(i) => PathSegment::Index(i),
			})
			.collect();
		let at = |kind: IssueKind| vec![Issue::new(path.clone(), kind)];

		match error.kind() {
			ValidationErrorKind::Required { property } => {
				let mut field_path = path.clone();
				field_path.push(PathSegment::Key(
					property.as_str().map_or_else(|| property.to_string(), str::to_string),
				));
				let expected = self
					.schema
					.field_at(&field_path)
					.map_or("any", |f| f.kind.type_name());
				vec![Issue::new(
					field_path,
					IssueKind::InvalidType {
						expected: expected.to_string(),
						received: "missing".to_string(),
					},
				)]
			},
			ValidationErrorKind::Type { kind } => {
				let expected = match kind {
					TypeKind::Single(ty) => ty.to_string(),
					TypeKind::Multiple(types) => types.iter().join(" or "),
				};
				let received = lookup(instance, &path).map_or("missing", json_type_name);
				at(IssueKind::InvalidType {
					expected,
					received: received.to_string(),
				})
			},
			ValidationErrorKind::Minimum { limit } => {
				at(IssueKind::TooSmall(Limit::Value(limit.as_f64().unwrap_or_default())))
			},
			ValidationErrorKind::Maximum { limit } => {
				at(IssueKind::TooBig(Limit::Value(limit.as_f64().unwrap_or_default())))
			},
			ValidationErrorKind::MinLength { limit } => {
				at(IssueKind::TooSmall(Limit::Length(*limit as usize)))
			},
			ValidationErrorKind::MaxLength { limit } => {
				at(IssueKind::TooBig(Limit::Length(*limit as usize)))
			},
			ValidationErrorKind::MinItems { limit } => {
				at(IssueKind::TooSmall(Limit::Items(*limit as usize)))
			},
			ValidationErrorKind::MaxItems { limit } => {
				at(IssueKind::TooBig(Limit::Items(*limit as usize)))
			},
			ValidationErrorKind::Enum { options } => at(IssueKind::InvalidEnum {
				options: options
					.as_array()
					.map(|values| {
						values
							.iter()
							.map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
							.collect()
					})
					.unwrap_or_default(),
			}),
			ValidationErrorKind::Format { format } => {
				match StringFormat::from_json_schema_name(format) {
					Some(format) => at(IssueKind::InvalidFormat(format)),
					None => at(IssueKind::Other(error.to_string())),
				}
			},
			ValidationErrorKind::Pattern { pattern } => at(IssueKind::PatternMismatch {
				pattern: pattern.clone(),
			}),
			ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
				.iter()
				.map(|key| {
					let mut key_path = path.clone();
					key_path.push(PathSegment::Key(key.clone()));
					Issue::new(key_path, IssueKind::UnrecognizedKey)
				})
				.collect(),
			_ => at(IssueKind::Other(error.to_string())),
		}
	}
}

pub(crate) fn lookup<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
	path.iter().try_fold(root, |value, segment| match segment {
		PathSegment::Key(key) => value.get(key.as_str()),
		PathSegment::Index(i) => value.get(*i),
	})
}

/// Drop explicit nulls of optional fields and unknown fields of non-strict
/// objects. Unknown fields of strict objects stay so the validator reports them.
fn prune_object(schema: &ObjectSchema, value: &Value) -> Value {
	let Some(obj) = value.as_object() else {
		return value.clone();
	};
	let mut cleaned = Map::new();
	for (name, v) in obj {
		match schema.fields.get(name) {
			Some(field) if field.optional && v.is_null() => {},
			Some(field) => {
				cleaned.insert(name.clone(), prune_field(field, v));
			},
			None if schema.strict => {
				cleaned.insert(name.clone(), v.clone());
			},
			None => {},
		}
	}
	Value::Object(cleaned)
}

fn prune_field(field: &Field, value: &Value) -> Value {
	match (&field.kind, value) {
		(FieldKind::Object(schema), _) => prune_object(schema, value),
		(FieldKind::Array { items, .. }, Value::Array(values)) => {
			Value::Array(values.iter().map(|v| prune_field(items, v)).collect())
		},
		_ => value.clone(),
	}
}
