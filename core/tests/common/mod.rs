// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use anyhow::anyhow;
use nodeflow::{async_trait, BatchNode, Node, RetryPolicy, StageError, StageResult, Transition};
use std::sync::{
  atomic::{AtomicU32, AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use tracing::Level;

// --- Common Context Struct ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub route: Option<String>,
  pub numbers: Vec<u64>,
  pub doubled: Option<Vec<u64>>,
}

// --- Plain stages ---

/// Appends `text` to the message and returns `label`.
pub struct AppendNode {
  pub name: &'static str,
  pub text: &'static str,
  pub label: Transition,
}

pub fn append(name: &'static str, text: &'static str) -> AppendNode {
  AppendNode {
    name,
    text,
    label: Transition::DEFAULT,
  }
}

pub fn append_with_label(name: &'static str, text: &'static str, label: &'static str) -> AppendNode {
  AppendNode {
    name,
    text,
    label: Transition::from(label),
  }
}

#[async_trait]
impl Node<TestContext> for AppendNode {
  type Prep = String;
  type Exec = String;

  fn name(&self) -> &str {
    self.name
  }

  fn prep(&self, ctx: &TestContext) -> StageResult<String> {
    Ok(format!("{}{}", ctx.message.len(), self.text))
  }

  async fn exec(&self, prep: &String) -> StageResult<String> {
    Ok(prep.clone())
  }

  fn post(&self, ctx: &mut TestContext, _prep: String, exec: String) -> StageResult<Transition> {
    ctx.counter += 1;
    ctx.message.push_str(&exec);
    ctx.steps_executed.push(self.name.to_string());
    Ok(self.label.clone())
  }
}

/// `exec` fails transiently (or fatally) until `succeed_on` attempts have been made.
pub struct FlakyNode {
  pub name: &'static str,
  pub calls: Arc<AtomicU32>,
  /// 1-based attempt that succeeds; `None` never succeeds.
  pub succeed_on: Option<u32>,
  pub fatal: bool,
  pub policy: RetryPolicy,
  /// Time each attempt takes before reporting its outcome.
  pub attempt_delay: Duration,
}

impl FlakyNode {
  pub fn new(name: &'static str, policy: RetryPolicy, succeed_on: Option<u32>) -> Self {
    Self {
      name,
      calls: Arc::new(AtomicU32::new(0)),
      succeed_on,
      fatal: false,
      policy,
      attempt_delay: Duration::ZERO,
    }
  }
}

#[async_trait]
impl Node<TestContext> for FlakyNode {
  type Prep = ();
  type Exec = u32;

  fn name(&self) -> &str {
    self.name
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn prep(&self, _ctx: &TestContext) -> StageResult<()> {
    Ok(())
  }

  async fn exec(&self, _prep: &()) -> StageResult<u32> {
    let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if !self.attempt_delay.is_zero() {
      tokio::time::sleep(self.attempt_delay).await;
    }
    match self.succeed_on {
      Some(k) if attempt >= k => Ok(attempt),
      _ if self.fatal => Err(StageError::fatal(anyhow!("bad input on attempt {}", attempt))),
      _ => Err(StageError::transient(anyhow!("flaky failure on attempt {}", attempt))),
    }
  }

  fn post(&self, ctx: &mut TestContext, _prep: (), exec: u32) -> StageResult<Transition> {
    ctx.counter += exec as i32;
    ctx.steps_executed.push(self.name.to_string());
    Ok(Transition::DEFAULT)
  }
}

/// Returns the label stored in `ctx.route`.
pub struct RouterNode;

#[async_trait]
impl Node<TestContext> for RouterNode {
  type Prep = Option<String>;
  type Exec = ();

  fn name(&self) -> &str {
    "router"
  }

  fn prep(&self, ctx: &TestContext) -> StageResult<Option<String>> {
    Ok(ctx.route.clone())
  }

  async fn exec(&self, _prep: &Option<String>) -> StageResult<()> {
    Ok(())
  }

  fn post(&self, ctx: &mut TestContext, prep: Option<String>, _exec: ()) -> StageResult<Transition> {
    ctx.steps_executed.push("router".to_string());
    Ok(prep.map(Transition::from).unwrap_or_default())
  }
}

/// Fails in `prep` or `post`, counting `exec` calls in between.
pub struct BrokenPhaseNode {
  pub name: &'static str,
  pub fail_prep: bool,
  pub exec_calls: Arc<AtomicU32>,
}

#[async_trait]
impl Node<TestContext> for BrokenPhaseNode {
  type Prep = ();
  type Exec = ();

  fn name(&self) -> &str {
    self.name
  }

  fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
  }

  fn prep(&self, _ctx: &TestContext) -> StageResult<()> {
    if self.fail_prep {
      // Even a transient-looking prep failure must not be retried.
      return Err(StageError::transient(anyhow!("prep could not read its inputs")));
    }
    Ok(())
  }

  async fn exec(&self, _prep: &()) -> StageResult<()> {
    self.exec_calls.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  fn post(&self, _ctx: &mut TestContext, _prep: (), _exec: ()) -> StageResult<Transition> {
    Err(StageError::transient(anyhow!("post could not write its outputs")))
  }
}

/// Loops back to itself with label "again" until the counter reaches `until`.
pub struct LoopNode {
  pub until: i32,
}

#[async_trait]
impl Node<TestContext> for LoopNode {
  type Prep = i32;
  type Exec = i32;

  fn name(&self) -> &str {
    "loop"
  }

  fn prep(&self, ctx: &TestContext) -> StageResult<i32> {
    Ok(ctx.counter)
  }

  async fn exec(&self, prep: &i32) -> StageResult<i32> {
    Ok(prep + 1)
  }

  fn post(&self, ctx: &mut TestContext, _prep: i32, exec: i32) -> StageResult<Transition> {
    ctx.counter = exec;
    if exec < self.until {
      Ok(Transition::from("again"))
    } else {
      Ok(Transition::DEFAULT)
    }
  }
}

// --- Batch stage ---

/// Doubles every number in `ctx.numbers`; larger numbers finish sooner so
/// completion order is the reverse of input order.
pub struct DoublerBatch {
  pub concurrency: usize,
  pub policy: RetryPolicy,
  pub exec_calls: Arc<AtomicU32>,
  pub post_calls: Arc<AtomicU32>,
  pub in_flight: Arc<AtomicUsize>,
  pub max_in_flight: Arc<AtomicUsize>,
  /// Items equal to this value fail transiently on their first `n` attempts.
  pub flaky_item: Option<(u64, u32)>,
  item_attempts: Arc<AtomicU32>,
}

impl DoublerBatch {
  pub fn new(concurrency: usize) -> Self {
    Self {
      concurrency,
      policy: RetryPolicy::new(2, Duration::ZERO),
      exec_calls: Arc::new(AtomicU32::new(0)),
      post_calls: Arc::new(AtomicU32::new(0)),
      in_flight: Arc::new(AtomicUsize::new(0)),
      max_in_flight: Arc::new(AtomicUsize::new(0)),
      flaky_item: None,
      item_attempts: Arc::new(AtomicU32::new(0)),
    }
  }
}

#[async_trait]
impl BatchNode<TestContext> for DoublerBatch {
  type Item = u64;
  type Exec = u64;

  fn name(&self) -> &str {
    "doubler"
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn concurrency(&self) -> usize {
    self.concurrency
  }

  fn prep(&self, ctx: &TestContext) -> StageResult<Vec<u64>> {
    Ok(ctx.numbers.clone())
  }

  async fn exec(&self, item: &u64) -> StageResult<u64> {
    self.exec_calls.fetch_add(1, Ordering::SeqCst);
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(*item))).await;
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if let Some((flaky, failures)) = self.flaky_item {
      if *item == flaky && self.item_attempts.fetch_add(1, Ordering::SeqCst) < failures {
        return Err(StageError::transient(anyhow!("item {} hiccup", item)));
      }
    }
    Ok(item * 2)
  }

  fn post(&self, ctx: &mut TestContext, items: Vec<u64>, results: Vec<u64>) -> StageResult<Transition> {
    self.post_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(items.len(), results.len());
    ctx.doubled = Some(results);
    ctx.steps_executed.push("doubler".to_string());
    Ok(Transition::DEFAULT)
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
