//! # formwright-runner
//!
//! Declarative form filling. Describe an application form as YAML (ordered
//! fields, each with a kind and a locator), supply answers, and fill it
//! deterministically against a live page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formwright_runner::{AnswerMap, Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> formwright_runner::Result<()> {
//! let config = Config::load("configs/greenhouse.yaml")?;
//! let answers = AnswerMap::load("answers.yaml")?;
//! let runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config, &answers).await?;
//! println!("Success: {}", result.success);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The engine itself is page-agnostic: [`FillEngine`] and [`Wizard`] work
//! against any [`formwright_page::PageAdapter`].

mod config;
mod runner;

pub use config::{
    validate, AnswerMap, AnswerValue, BooleanChoices, BrowserConfig, Config, FieldDescriptor,
    FieldKind, FormSchema, MatchMode, OnFailure, RepeatableGroup, SchemaError, TargetUrl,
    Timeouts, Transition, Viewport,
};
pub use runner::{
    EntryIndex, EokaPage, FieldOutcome, FieldReport, FillEngine, FillError, FillReport,
    FillStatus, RunResult, Runner, StepReport, TransitionOutcome, Wizard, WizardPhase,
    WizardReport, WizardState,
};

/// Result type for formwright-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid schema: {}", config::validate::join(.0))]
    Schema(Vec<SchemaError>),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("page error: {0}")]
    Page(#[from] formwright_page::PageError),
}
