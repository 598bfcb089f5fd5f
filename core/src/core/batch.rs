// nodeflow/src/core/batch.rs

//! Defines the `BatchNode<TData>` trait: a stage that fans `exec` out over
//! independent work items and fans the results back in.

use crate::core::control::Transition;
use crate::error::StageResult;
use crate::retry::RetryPolicy;
use async_trait::async_trait;

/// A stage whose `prep` yields a list of items, whose `exec` runs once per
/// item, and whose `post` receives every result in item order.
///
/// Each item's `exec` is retried on its own. Items must not share mutable
/// state: with `concurrency() > 1` several of them are in flight at once.
/// An empty item list is valid; `post` then receives two empty vectors.
#[async_trait]
pub trait BatchNode<TData>: Send + Sync + 'static
where
  TData: Send + Sync + 'static,
{
  type Item: Send + Sync + 'static;
  type Exec: Send + 'static;

  fn name(&self) -> &str;

  fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::default()
  }

  /// Maximum number of items executing at the same time. `1` means sequential.
  fn concurrency(&self) -> usize {
    1
  }

  fn prep(&self, ctx: &TData) -> StageResult<Vec<Self::Item>>;

  async fn exec(&self, item: &Self::Item) -> StageResult<Self::Exec>;

  /// `results[i]` is the output of `exec(&items[i])`.
  fn post(&self, ctx: &mut TData, items: Vec<Self::Item>, results: Vec<Self::Exec>) -> StageResult<Transition>;
}
