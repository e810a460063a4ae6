//! # formwright-tools
//!
//! Describe an application form once as data, then fill it the same way every
//! time.
//!
//! - [`page`]: the [`PageAdapter`](page::PageAdapter) seam, locators and
//!   bounded waits.
//! - [`runner`]: schemas, answers, the fill engine, the wizard controller and
//!   the eoka-backed adapter.
//!
//! ```rust,ignore
//! use formwright_tools::runner::{AnswerMap, Config, Runner};
//!
//! # async fn demo() -> formwright_tools::runner::Result<()> {
//! let config = Config::load("configs/greenhouse.yaml")?;
//! let answers = AnswerMap::load("answers.yaml")?;
//!
//! let runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config, &answers).await?;
//! println!("{} in {}ms", if result.success { "filled" } else { "failed" }, result.duration_ms);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```

pub use formwright_page as page;
pub use formwright_runner as runner;

pub use formwright_page::{Locator, PageAdapter};
pub use formwright_runner::{
    AnswerMap, Config, FieldDescriptor, FieldKind, FillEngine, FillReport, FormSchema, Runner,
    Wizard, WizardReport,
};
