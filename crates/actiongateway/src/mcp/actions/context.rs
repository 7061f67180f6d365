// Per-call context passed through middleware, handlers and presenters

/// Context for a single action invocation.
///
/// The transport creates one per call and may attach request-scoped values
/// (caller identity, session ids, ...) as typed extensions. The dispatcher
/// fills in the tool and action once the call is resolved.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
	/// Name of the builder (grouped tool) handling the call
	pub tool_name: String,
	/// Resolved action key
	pub action: Option<String>,
	/// Request-scoped values supplied by the caller of `execute()`
	pub extensions: http::Extensions,
}

impl CallContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attach a typed request-scoped value
	pub fn with_extension<T>(mut self, value: T) -> Self
	where
		T: Clone + Send + Sync + 'static,
	{
		self.extensions.insert(value);
		self
	}

	pub fn extension<T>(&self) -> Option<&T>
	where
		T: Send + Sync + 'static,
	{
		self.extensions.get::<T>()
	}

	/// `tool/action` path used in logs and validation banners
	pub fn action_path(&self) -> String {
		match self.action {
			Some(ref action) => format!("{}/{}", self.tool_name, action),
			None => self.tool_name.clone(),
		}
	}
}
