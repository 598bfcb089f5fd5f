// nodeflow/src/core/stage.rs

//! Defines the `AnyStage<TData>` trait for type-erased stage execution by a
//! `Flow`, and the adapters that erase `Node` and `BatchNode`.

use crate::core::batch::BatchNode;
use crate::core::context_data::ContextData;
use crate::core::control::StepRecord;
use crate::core::node::Node;
use crate::error::{FlowResult, Phase};
use crate::retry::{run_with_retry, Attempted, RetryPolicy};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::time::Instant;
use tracing::{event, span, Instrument, Level};

/// Lets a `Flow` hold stages with different `Prep` / `Exec` / `Item` types
/// behind one object type.
///
/// `run` performs one full visit: prep, retried exec, post.
#[async_trait]
pub trait AnyStage<TData>: Send + Sync
where
  TData: Send + Sync + 'static,
{
  fn name(&self) -> &str;

  fn retry_policy(&self) -> RetryPolicy;

  async fn run(&self, ctx: &ContextData<TData>) -> FlowResult<StepRecord>;
}

pub(crate) struct NodeStage<N>(pub(crate) N);

#[async_trait]
impl<TData, N> AnyStage<TData> for NodeStage<N>
where
  TData: Send + Sync + 'static,
  N: Node<TData>,
{
  fn name(&self) -> &str {
    self.0.name()
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.0.retry_policy()
  }

  async fn run(&self, ctx: &ContextData<TData>) -> FlowResult<StepRecord> {
    let started = Instant::now();
    let name = self.0.name();

    let prep = {
      let guard = ctx.read();
      self.0.prep(&guard).map_err(|e| e.into_flow_error(name, Phase::Prep))?
    }; // read guard dropped before exec is awaited

    let policy = self.0.retry_policy();
    let Attempted { value: exec, attempts } = run_with_retry(name, &policy, |_| self.0.exec(&prep)).await?;

    let transition = {
      let mut guard = ctx.write();
      self
        .0
        .post(&mut guard, prep, exec)
        .map_err(|e| e.into_flow_error(name, Phase::Post))?
    };

    Ok(StepRecord {
      stage: name.to_string(),
      transition,
      attempts,
      items: None,
      elapsed: started.elapsed(),
    })
  }
}

pub(crate) struct BatchStage<B>(pub(crate) B);

#[async_trait]
impl<TData, B> AnyStage<TData> for BatchStage<B>
where
  TData: Send + Sync + 'static,
  B: BatchNode<TData>,
{
  fn name(&self) -> &str {
    self.0.name()
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.0.retry_policy()
  }

  async fn run(&self, ctx: &ContextData<TData>) -> FlowResult<StepRecord> {
    let started = Instant::now();
    let name = self.0.name();

    let items = {
      let guard = ctx.read();
      self.0.prep(&guard).map_err(|e| e.into_flow_error(name, Phase::Prep))?
    };

    let item_count = items.len();
    let concurrency = self.0.concurrency().max(1);
    event!(Level::DEBUG, stage = %name, item_count, concurrency, "Fanning out batch items.");

    let policy = self.0.retry_policy();
    let items_ref = &items;
    let policy_ref = &policy;

    // `buffered` yields in input order whatever order the items finish in,
    // so results line up with `items` index for index.
    let attempted: Vec<Attempted<B::Exec>> = stream::iter(0..item_count)
      .map(|index| {
        let item_span = span!(Level::DEBUG, "batch_item", item_index = index);
        async move { run_with_retry(name, policy_ref, |_| self.0.exec(&items_ref[index])).await }.instrument(item_span)
      })
      .buffered(concurrency)
      .try_collect()
      .await?;

    let mut attempts = 0;
    let results: Vec<B::Exec> = attempted
      .into_iter()
      .map(|a| {
        attempts += a.attempts;
        a.value
      })
      .collect();

    let transition = {
      let mut guard = ctx.write();
      self
        .0
        .post(&mut guard, items, results)
        .map_err(|e| e.into_flow_error(name, Phase::Post))?
    };

    Ok(StepRecord {
      stage: name.to_string(),
      transition,
      attempts,
      items: Some(item_count),
      elapsed: started.elapsed(),
    })
  }
}
