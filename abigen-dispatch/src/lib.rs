//! # abigen-dispatch
//!
//! Runs the external ABI generator once per registered contract, concurrently,
//! and gathers every result into a [`RunReport`].
//!
//! Build a [`Dispatcher`] around a [`Generator`] (normally [`CommandGenerator`])
//! and call [`Dispatcher::run`] with a validated registry.

pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod report;

pub use dispatcher::{DispatchOptions, Dispatcher};
pub use error::{DispatchError, LaunchError, TaskFailure};
pub use generator::{CommandGenerator, Generator, GeneratorOutput};
pub use report::{RunReport, TaskOutcome, TaskReport};
