// nodeflow/src/core/node.rs

//! Defines the `Node<TData>` trait: one stage with prepare / execute / finalize phases.

use crate::core::control::Transition;
use crate::error::StageResult;
use crate::retry::RetryPolicy;
use async_trait::async_trait;

/// A single stage of a flow operating on the shared context `TData`.
///
/// Phases run in order for every visit:
/// 1. `prep` reads what the stage needs out of the context.
/// 2. `exec` does the work, possibly calling external services. It never sees
///    the context and is retried on `StageError::Transient` according to
///    `retry_policy()`, so it must be safe to call again with the same input.
/// 3. `post` writes results back and returns the label of the outgoing edge.
///
/// `prep` and `post` are synchronous on purpose: the engine holds the context
/// lock while they run and releases it before `exec` is awaited.
#[async_trait]
pub trait Node<TData>: Send + Sync + 'static
where
  TData: Send + Sync + 'static,
{
  type Prep: Send + Sync + 'static;
  type Exec: Send + 'static;

  /// Unique name of the stage inside its flow; used for edges and logging.
  fn name(&self) -> &str;

  fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::default()
  }

  fn prep(&self, ctx: &TData) -> StageResult<Self::Prep>;

  async fn exec(&self, prep: &Self::Prep) -> StageResult<Self::Exec>;

  fn post(&self, ctx: &mut TData, prep: Self::Prep, exec: Self::Exec) -> StageResult<Transition>;
}
