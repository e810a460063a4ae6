//! # formwright-page
//!
//! The page side of declarative form filling. The fill engine never talks to a
//! browser directly; it talks to a [`PageAdapter`], which finds elements by
//! [`Locator`], interacts with them, and answers [`Condition`] checks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formwright_page::{Condition, Locator, Lookup, PageAdapter};
//! use std::time::Duration;
//!
//! # async fn demo(page: &impl PageAdapter) -> formwright_page::Result<()> {
//! let first_name = Locator::parse("role:textbox=First Name");
//! if let Lookup::Found(el) = page.find(&first_name).await? {
//!     page.clear(&el).await?;
//!     page.type_text(&el, "Ada").await?;
//!     let ok = page
//!         .wait_for(&Condition::value_equals(&el, "Ada"), Duration::from_secs(2))
//!         .await?;
//!     assert!(ok);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Adapters hold one browser tab. Operations against a page happen in program
//! order, so the trait uses non-`Send` futures.

pub mod locator;
pub mod wait;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use locator::{Locator, NamePattern};
pub use wait::{Condition, DEFAULT_POLL_INTERVAL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result type for page operations.
pub type Result<T> = std::result::Result<T, PageError>;

/// Errors raised by a page adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("stale element: {0}")]
    StaleElement(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PageError {
    fn from(e: std::io::Error) -> Self {
        PageError::Io(e.to_string())
    }
}

/// A resolved element. `handle` is adapter-specific (a unique CSS selector for
/// browser pages) and stays valid until the element leaves the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub handle: String,
    pub tag: String,
    #[serde(default)]
    pub text: String,
}

/// Outcome of resolving a locator that must match one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Element),
    Ambiguous(usize),
    NotFound,
}

impl Lookup {
    /// Classify a list of matches.
    pub fn from_matches(mut matches: Vec<Element>) -> Self {
        match matches.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(matches.remove(0)),
            n => Lookup::Ambiguous(n),
        }
    }
}

/// Element lookup and interaction primitives over one live page.
#[async_trait(?Send)]
pub trait PageAdapter {
    /// All visible elements matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>>;

    /// Resolve `locator` to exactly one element.
    async fn find(&self, locator: &Locator) -> Result<Lookup> {
        Ok(Lookup::from_matches(self.find_all(locator).await?))
    }

    async fn click(&self, element: &Element) -> Result<()>;

    /// Select-all and delete the element's current content.
    async fn clear(&self, element: &Element) -> Result<()>;

    async fn type_text(&self, element: &Element, text: &str) -> Result<()>;

    /// Current value of a form control (text content for non-inputs).
    async fn value(&self, element: &Element) -> Result<String>;

    /// Press a key (e.g. "Enter", "Escape") with the element focused.
    async fn press_key(&self, element: &Element, key: &str) -> Result<()>;

    /// Pick a native `<select>` option by visible text. `Ok(false)` if absent.
    async fn select_option(&self, element: &Element, text: &str) -> Result<bool>;

    async fn set_files(&self, element: &Element, paths: &[PathBuf]) -> Result<()>;

    async fn scroll_into_view(&self, element: &Element) -> Result<()>;

    /// Evaluate a condition once.
    async fn check(&self, condition: &Condition) -> Result<bool>;

    /// Wait until `condition` holds. `Ok(false)` on timeout.
    async fn wait_for(&self, condition: &Condition, timeout: Duration) -> Result<bool> {
        wait::poll(self, condition, timeout, DEFAULT_POLL_INTERVAL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(handle: &str) -> Element {
        Element {
            handle: handle.into(),
            tag: "input".into(),
            text: String::new(),
        }
    }

    #[test]
    fn lookup_classifies_matches() {
        assert_eq!(Lookup::from_matches(vec![]), Lookup::NotFound);
        assert_eq!(
            Lookup::from_matches(vec![el("#a")]),
            Lookup::Found(el("#a"))
        );
        assert_eq!(
            Lookup::from_matches(vec![el("#a"), el("#b"), el("#c")]),
            Lookup::Ambiguous(3)
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: PageError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, PageError::Io(ref m) if m.contains("gone")));
    }
}
