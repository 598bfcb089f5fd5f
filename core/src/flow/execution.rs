// nodeflow/src/flow/execution.rs

//! Contains `Flow::run()`: visit stages, follow returned labels through the
//! transition table, stop at the first label with no edge.

use crate::core::context_data::ContextData;
use crate::core::control::FlowOutcome;
use crate::error::{FlowError, FlowResult};
use crate::flow::definition::Flow;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData> Flow<TData>
where
  TData: Send + Sync + 'static,
{
  /// Runs the flow against the shared context `ctx`.
  ///
  /// Any unrecovered stage failure aborts the run and is returned as is;
  /// the context keeps whatever earlier stages wrote, but nothing is resumed.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(
      flow = %self.name,
      start = %self.start,
      context_type = %std::any::type_name::<TData>(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: ContextData<TData>) -> FlowResult<FlowOutcome> {
    event!(Level::DEBUG, "Flow execution starting.");

    let mut current: &str = &self.start;
    let mut steps = Vec::new();

    loop {
      if steps.len() >= self.max_steps {
        event!(Level::ERROR, limit = self.max_steps, "Step limit reached, aborting.");
        return Err(FlowError::StepLimitExceeded {
          flow: self.name.clone(),
          limit: self.max_steps,
        });
      }

      let stage = self.stages.get(current).ok_or_else(|| FlowError::Internal(format!(
        "stage '{}' vanished from flow '{}' after validation",
        current, self.name
      )))?;

      let stage_span = span!(Level::INFO, "flow_stage", stage = current, step_index = steps.len());
      let record = stage.run(&ctx).instrument(stage_span).await?;

      let next = self.next_stage(current, record.transition.as_str());
      event!(
        Level::DEBUG,
        stage = current,
        transition = %record.transition,
        attempts = record.attempts,
        next = next.unwrap_or("<end>"),
        "Stage finished."
      );
      steps.push(record);

      match next {
        Some(next_stage) => current = next_stage,
        None => break,
      }
    }

    event!(Level::INFO, steps = steps.len(), "Flow execution completed.");
    Ok(FlowOutcome {
      flow: self.name.clone(),
      steps,
    })
  }

  /// Runs the flow on an owned context and hands it back with the report.
  pub async fn run_owned(&self, data: TData) -> FlowResult<(TData, FlowOutcome)> {
    let ctx = ContextData::new(data);
    let outcome = self.run(ctx.clone()).await?;
    let data = ctx
      .into_inner()
      .map_err(|_| FlowError::Internal("context handle still shared after the run".to_string()))?;
    Ok((data, outcome))
  }
}
