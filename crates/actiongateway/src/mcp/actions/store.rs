// Tool registry with atomically swapped exposition state

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use itertools::Itertools;
use parking_lot::Mutex;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::builder::ToolBuilder;
use super::config::{ExpositionConfig, TagFilter};
use super::context::CallContext;
use super::error::{ActionError, CompileError, ConfigError};
use super::exposition::{ExpositionResult, compile_exposition};
use super::response::error;
use super::types::ToolExposition;

/// One immutable generation of the registry
struct RegistryState {
	config: ExpositionConfig,
	builders: Vec<Arc<dyn ToolBuilder>>,
	exposition: ExpositionResult,
	/// Exposed tool name -> owning builder
	owners: HashMap<String, Arc<dyn ToolBuilder>>,
}

impl RegistryState {
	fn compile(
		config: ExpositionConfig,
		builders: Vec<Arc<dyn ToolBuilder>>,
	) -> Result<Self, CompileError> {
		let exposition =
			compile_exposition(&builders, config.tool_exposition, &config.action_separator)?;
		let owners = if exposition.is_flat {
			exposition
				.routing_map
				.iter()
				.map(|(name, route)| (name.clone(), route.builder.clone()))
				.collect()
		} else {
			builders
				.iter()
				.map(|b| (b.name().to_string(), b.clone()))
				.collect()
		};
		Ok(Self {
			config,
			builders,
			exposition,
			owners,
		})
	}

	fn empty(config: ExpositionConfig) -> Self {
		Self {
			exposition: ExpositionResult {
				is_flat: config.tool_exposition == ToolExposition::Flat,
				..Default::default()
			},
			config,
			builders: Vec::new(),
			owners: HashMap::new(),
		}
	}

	fn visible(&self, tool_name: &str, filter: &TagFilter) -> bool {
		self
			.owners
			.get(tool_name)
			.is_some_and(|b| filter.matches(b.tags()))
	}
}

/// Registry of builders, exposed according to an [`ExpositionConfig`]
///
/// Readers never block: every change compiles a new generation and swaps it
/// in atomically. A failed compilation leaves the current generation in place.
pub struct ToolRegistry {
	current: ArcSwap<RegistryState>,
	/// Serializes writers so concurrent registrations are not lost
	write_lock: Mutex<()>,
}

impl Default for ToolRegistry {
	fn default() -> Self {
		Self::empty(ExpositionConfig::default())
	}
}

impl ToolRegistry {
	pub fn new(config: ExpositionConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self::empty(config))
	}

	fn empty(config: ExpositionConfig) -> Self {
		Self {
			current: ArcSwap::from_pointee(RegistryState::empty(config)),
			write_lock: Mutex::new(()),
		}
	}

	pub fn config(&self) -> ExpositionConfig {
		self.current.load().config.clone()
	}

	/// Attach a builder. A builder with the same name is replaced.
	pub fn register(&self, builder: Arc<dyn ToolBuilder>) -> Result<(), CompileError> {
		self.register_all([builder])
	}

	pub fn register_all<I>(&self, builders: I) -> Result<(), CompileError>
	where
		I: IntoIterator<Item = Arc<dyn ToolBuilder>>,
	{
		let _guard = self.write_lock.lock();
		let current = self.current.load();
		let mut next = current.builders.clone();
		for builder in builders {
			match next.iter().position(|b| b.name() == builder.name()) {
				Some(idx) => {
					warn!(
						target: "actions",
						builder = %builder.name(),
						"builder already registered, replacing it"
					);
					next[idx] = builder;
				},
				None => next.push(builder),
			}
		}
		self.swap(current.config.clone(), next)
	}

	/// Detach a builder by name; returns whether it was registered
	pub fn unregister(&self, name: &str) -> Result<bool, CompileError> {
		let _guard = self.write_lock.lock();
		let current = self.current.load();
		let next: Vec<_> = current
			.builders
			.iter()
			.filter(|b| b.name() != name)
			.cloned()
			.collect();
		if next.len() == current.builders.len() {
			return Ok(false);
		}
		self.swap(current.config.clone(), next)?;
		Ok(true)
	}

	/// Re-expose the registered builders under a new configuration
	pub fn reconfigure(&self, config: ExpositionConfig) -> Result<(), CompileError> {
		let _guard = self.write_lock.lock();
		let builders = self.current.load().builders.clone();
		self.swap(config, builders)
	}

	/// Detach every builder, keeping the configuration
	pub fn clear(&self) {
		let _guard = self.write_lock.lock();
		let config = self.current.load().config.clone();
		self.current.store(Arc::new(RegistryState::empty(config)));
		info!(target: "actions", "Tool registry cleared");
	}

	fn swap(
		&self,
		config: ExpositionConfig,
		builders: Vec<Arc<dyn ToolBuilder>>,
	) -> Result<(), CompileError> {
		let state = RegistryState::compile(config, builders)?;
		info!(
			target: "actions",
			builders = state.builders.len(),
			tools = state.exposition.tools.len(),
			flat = state.exposition.is_flat,
			"Tool registry updated"
		);
		self.current.store(Arc::new(state));
		Ok(())
	}

	pub fn builder_names(&self) -> Vec<String> {
		self
			.current
			.load()
			.builders
			.iter()
			.map(|b| b.name().to_string())
			.collect()
	}

	/// Tools visible under the configured tag filter
	pub fn list_tools(&self) -> Vec<Tool> {
		let state = self.current.load();
		self.filtered(&state, &state.config.tags)
	}

	/// Tools whose builders match `filter`, ignoring the configured filter
	pub fn tools_for(&self, filter: &TagFilter) -> Vec<Tool> {
		let state = self.current.load();
		self.filtered(&state, filter)
	}

	fn filtered(&self, state: &RegistryState, filter: &TagFilter) -> Vec<Tool> {
		state
			.exposition
			.tools
			.iter()
			.filter(|t| state.visible(&t.name, filter))
			.cloned()
			.collect()
	}

	/// Route a call by exposed tool name.
	///
	/// Unknown (or filtered out) tools produce an error response listing the
	/// visible tool names.
	pub async fn call_tool(
		&self,
		name: &str,
		args: Value,
		ctx: CallContext,
	) -> Result<CallToolResult, ActionError> {
		let state = self.current.load_full();
		if !state.visible(name, &state.config.tags) {
			let known = state
				.exposition
				.tool_names()
				.filter(|n| state.visible(n, &state.config.tags))
				.join(", ");
			debug!(target: "actions", tool = %name, "unknown tool");
			return Ok(error(format!("Unknown tool \"{name}\". Available tools: {known}")));
		}

		if let Some(route) = state.exposition.route(name) {
			return route.execute(ctx, args).await;
		}
		match state.owners.get(name) {
			Some(builder) => builder.execute(ctx, args).await,
			None => Ok(error(format!("Unknown tool \"{name}\""))),
		}
	}
}
