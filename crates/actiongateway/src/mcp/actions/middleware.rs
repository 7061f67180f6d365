// Middleware compilation
//
// Every action gets one pre-bound chain, built once at compile time:
//   [global middleware..., group middleware..., action middleware..., handler]
// The first-declared middleware is outermost. Each stage receives a `Next`
// continuation and decides whether (and with what arguments) to call it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use super::context::CallContext;
use super::error::ActionError;
use super::response::ActionOutput;
use super::types::ActionDefinition;

pub type ActionResult = Result<ActionOutput, ActionError>;

/// Terminal stage of a chain: the action's business logic
#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
	async fn call(&self, ctx: CallContext, args: Value) -> ActionResult;
}

/// A stage wrapping everything after it in the chain
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
	async fn handle(&self, ctx: CallContext, args: Value, next: Next) -> ActionResult;
}

struct ChainInner {
	stages: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn ActionHandler>,
}

/// Continuation to the rest of a chain
pub struct Next {
	chain: Arc<ChainInner>,
	index: usize,
}

impl Next {
	/// Run the remaining stages, ending in the handler
	pub fn run(self, ctx: CallContext, args: Value) -> BoxFuture<'static, ActionResult> {
		Box::pin(async move {
			match self.chain.stages.get(self.index).cloned() {
				Some(stage) => {
					let next = Next {
						chain: self.chain.clone(),
						index: self.index + 1,
					};
					stage.handle(ctx, args, next).await
				},
				None => self.chain.handler.call(ctx, args).await,
			}
		})
	}
}

/// An immutable, reusable middleware chain for one action
#[derive(Clone)]
pub struct CompiledChain {
	inner: Arc<ChainInner>,
}

impl CompiledChain {
	pub fn new(stages: Vec<Arc<dyn Middleware>>, handler: Arc<dyn ActionHandler>) -> Self {
		Self {
			inner: Arc::new(ChainInner { stages, handler }),
		}
	}

	pub async fn invoke(&self, ctx: CallContext, args: Value) -> ActionResult {
		Next {
			chain: self.inner.clone(),
			index: 0,
		}
		.run(ctx, args)
		.await
	}

	/// Number of middleware stages before the handler
	pub fn len(&self) -> usize {
		self.inner.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.stages.is_empty()
	}
}

impl std::fmt::Debug for CompiledChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompiledChain")
			.field("stages", &self.inner.stages.len())
			.finish()
	}
}

/// Compile one chain per action key
pub fn compile_chains(
	actions: &[ActionDefinition],
	global: &[Arc<dyn Middleware>],
) -> HashMap<String, CompiledChain> {
	actions
		.iter()
		.map(|action| {
			let mut stages = global.to_vec();
			if let Some(ref group) = action.group {
				stages.extend(group.middleware.iter().cloned());
			}
			stages.extend(action.middleware.iter().cloned());
			(
				action.key.clone(),
				CompiledChain::new(stages, action.handler.clone()),
			)
		})
		.collect()
}

struct HandlerFn<F>(F);

#[async_trait::async_trait]
impl<F, Fut> ActionHandler for HandlerFn<F>
where
	F: Fn(CallContext, Value) -> Fut + Send + Sync,
	Fut: Future<Output = ActionResult> + Send + 'static,
{
	async fn call(&self, ctx: CallContext, args: Value) -> ActionResult {
		(self.0)(ctx, args).await
	}
}

/// Wrap an async closure as an action handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ActionHandler>
where
	F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ActionResult> + Send + 'static,
{
	Arc::new(HandlerFn(f))
}

struct MiddlewareFn<F>(F);

#[async_trait::async_trait]
impl<F, Fut> Middleware for MiddlewareFn<F>
where
	F: Fn(CallContext, Value, Next) -> Fut + Send + Sync,
	Fut: Future<Output = ActionResult> + Send + 'static,
{
	async fn handle(&self, ctx: CallContext, args: Value, next: Next) -> ActionResult {
		(self.0)(ctx, args, next).await
	}
}

/// Wrap an async closure as middleware
pub fn middleware_fn<F, Fut>(f: F) -> Arc<dyn Middleware>
where
	F: Fn(CallContext, Value, Next) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ActionResult> + Send + 'static,
{
	Arc::new(MiddlewareFn(f))
}
