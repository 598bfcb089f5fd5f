// nodeflow/src/flow/definition.rs

//! Contains the `Flow<TData>` struct and the `FlowBuilder<TData>` that wires
//! stages together and validates the transition table.

use crate::core::batch::BatchNode;
use crate::core::control::Transition;
use crate::core::node::Node;
use crate::core::stage::{AnyStage, BatchStage, NodeStage};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;
use std::fmt;
use tracing::{event, Level};

/// Default bound on stage visits per run; only reachable through a cycle.
pub const DEFAULT_MAX_STEPS: usize = 1000;

/// A validated graph of stages.
///
/// The transition table maps `(stage name, label)` to the next stage name.
/// A label with no entry is a terminal: the run ends after that stage.
pub struct Flow<TData>
where
  TData: Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) stages: HashMap<String, Box<dyn AnyStage<TData>>>,
  /// Registration order, for introspection.
  pub(crate) order: Vec<String>,
  pub(crate) transitions: HashMap<String, HashMap<Transition, String>>,
  pub(crate) start: String,
  pub(crate) max_steps: usize,
}

impl<TData> Flow<TData>
where
  TData: Send + Sync + 'static,
{
  pub fn builder(name: impl Into<String>) -> FlowBuilder<TData> {
    FlowBuilder::new(name)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn stage_count(&self) -> usize {
    self.stages.len()
  }

  /// Stage names in the order they were registered.
  pub fn stage_names(&self) -> impl Iterator<Item = &str> {
    self.order.iter().map(String::as_str)
  }

  /// Looks up the edge for `label` out of `stage`.
  pub fn next_stage(&self, stage: &str, label: &str) -> Option<&str> {
    self
      .transitions
      .get(stage)
      .and_then(|edges| edges.get(label))
      .map(String::as_str)
  }

  /// Labels with an outgoing edge from `stage`, sorted.
  pub fn labels_from(&self, stage: &str) -> Vec<&str> {
    let mut labels: Vec<&str> = self
      .transitions
      .get(stage)
      .map(|edges| edges.keys().map(Transition::as_str).collect())
      .unwrap_or_default();
    labels.sort_unstable();
    labels
  }
}

// Stages are trait objects; show them by name.
impl<TData> fmt::Debug for Flow<TData>
where
  TData: Send + Sync + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Flow")
      .field("name", &self.name)
      .field("start", &self.start)
      .field("stages", &self.order)
      .field("transitions", &self.transitions)
      .field("max_steps", &self.max_steps)
      .finish()
  }
}

/// Builder for `Flow<TData>`. Nothing is checked until `build()`.
pub struct FlowBuilder<TData>
where
  TData: Send + Sync + 'static,
{
  name: String,
  stages: Vec<Box<dyn AnyStage<TData>>>,
  edges: Vec<(String, Transition, String)>,
  start: Option<String>,
  max_steps: usize,
}

impl<TData> FlowBuilder<TData>
where
  TData: Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      stages: Vec::new(),
      edges: Vec::new(),
      start: None,
      max_steps: DEFAULT_MAX_STEPS,
    }
  }

  /// Registers a plain stage under `node.name()`.
  pub fn node<N>(mut self, node: N) -> Self
  where
    N: Node<TData>,
  {
    self.stages.push(Box::new(NodeStage(node)));
    self
  }

  /// Registers a batch stage under `batch.name()`.
  pub fn batch<B>(mut self, batch: B) -> Self
  where
    B: BatchNode<TData>,
  {
    self.stages.push(Box::new(BatchStage(batch)));
    self
  }

  pub fn edge(mut self, from: impl Into<String>, label: impl Into<Transition>, to: impl Into<String>) -> Self {
    self.edges.push((from.into(), label.into(), to.into()));
    self
  }

  /// Wires the `"default"` edge from `from` to `to`.
  pub fn then(self, from: impl Into<String>, to: impl Into<String>) -> Self {
    self.edge(from, Transition::DEFAULT, to)
  }

  /// Wires `"default"` edges along `names`, in order.
  pub fn chain(mut self, names: &[&str]) -> Self {
    for pair in names.windows(2) {
      self = self.then(pair[0], pair[1]);
    }
    self
  }

  /// Sets the entry stage. Defaults to the first registered stage.
  pub fn start(mut self, name: impl Into<String>) -> Self {
    self.start = Some(name.into());
    self
  }

  pub fn max_steps(mut self, max_steps: usize) -> Self {
    self.max_steps = max_steps.max(1);
    self
  }

  /// Validates and freezes the graph.
  ///
  /// Fails on: no stages, duplicate stage names, invalid retry policies,
  /// an unknown start stage, edges touching unknown stages, and the same
  /// label wired twice out of one stage.
  pub fn build(self) -> FlowResult<Flow<TData>> {
    if self.stages.is_empty() {
      return Err(FlowError::EmptyFlow { flow: self.name });
    }

    let mut order = Vec::with_capacity(self.stages.len());
    let mut stages: HashMap<String, Box<dyn AnyStage<TData>>> = HashMap::with_capacity(self.stages.len());
    for stage in self.stages {
      let stage_name = stage.name().to_string();
      stage.retry_policy().validate(&stage_name)?;
      if stages.contains_key(&stage_name) {
        return Err(FlowError::DuplicateStage { stage: stage_name });
      }
      order.push(stage_name.clone());
      stages.insert(stage_name, stage);
    }

    let start = match self.start {
      Some(start) => start,
      None => order[0].clone(),
    };
    if !stages.contains_key(&start) {
      return Err(FlowError::UnknownStage { stage: start });
    }

    let mut transitions: HashMap<String, HashMap<Transition, String>> = HashMap::new();
    for (from, label, to) in self.edges {
      for endpoint in [&from, &to] {
        if !stages.contains_key(endpoint) {
          return Err(FlowError::UnknownStage {
            stage: endpoint.clone(),
          });
        }
      }
      let edges = transitions.entry(from.clone()).or_default();
      if edges.contains_key(&label) {
        return Err(FlowError::DuplicateTransition {
          stage: from,
          label: label.to_string(),
        });
      }
      edges.insert(label, to);
    }

    for stage_name in &order {
      if !transitions.contains_key(stage_name) {
        event!(Level::DEBUG, flow = %self.name, stage = %stage_name, "Stage has no outgoing edges; it is terminal.");
      }
    }

    Ok(Flow {
      name: self.name,
      stages,
      order,
      transitions,
      start,
      max_steps: self.max_steps,
    })
  }
}
