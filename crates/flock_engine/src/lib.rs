//! Function execution for the Flock engine: request parsing, the batching
//! engine, the aggregate state machine, and the executor facade the query
//! engine calls into.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod batch;
mod config;
mod executor;
mod scalar;

pub use aggregate::{AggregateKind, AggregateState};
pub use batch::batch_ranges;
pub use config::{FunctionConfig, PromptSource, RequestSpec};
pub use executor::LlmExecutor;
