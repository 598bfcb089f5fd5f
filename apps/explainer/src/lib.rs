// explainer/src/lib.rs

//! Turns a video into a simplified explainer document.
//!
//! The work is a `nodeflow` flow of four stages (see `pipelines`); the
//! collaborators they call live in `services`.

pub mod config;
pub mod errors;
pub mod models;
pub mod persist;
pub mod pipelines;
pub mod render;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use pipelines::{build_explainer_flow, run_explainer, ExplainerCtxData};
pub use state::AppState;
