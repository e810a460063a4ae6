//! Observable page conditions and bounded polling.

use crate::{Element, Locator, PageAdapter, Result};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Interval between condition checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A page state that can be checked at any moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// At least one visible element matches.
    Visible { locator: Locator },
    /// At least `count` visible elements match.
    CountAtLeast { locator: Locator, count: usize },
    /// Visible page text contains `text`.
    TextPresent { text: String },
    /// The element's value equals `value`.
    ValueEquals { element: Element, value: String },
    /// The element's checked state equals `checked`.
    Checked { element: Element, checked: bool },
}

impl Condition {
    pub fn visible(locator: &Locator) -> Self {
        Condition::Visible {
            locator: locator.clone(),
        }
    }

    pub fn count_at_least(locator: &Locator, count: usize) -> Self {
        Condition::CountAtLeast {
            locator: locator.clone(),
            count,
        }
    }

    pub fn text_present(text: impl Into<String>) -> Self {
        Condition::TextPresent { text: text.into() }
    }

    pub fn value_equals(element: &Element, value: impl Into<String>) -> Self {
        Condition::ValueEquals {
            element: element.clone(),
            value: value.into(),
        }
    }

    pub fn checked(element: &Element, checked: bool) -> Self {
        Condition::Checked {
            element: element.clone(),
            checked,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Visible { locator } => write!(f, "visible {}", locator),
            Condition::CountAtLeast { locator, count } => {
                write!(f, "at least {} of {}", count, locator)
            }
            Condition::TextPresent { text } => write!(f, "text '{}'", text),
            Condition::ValueEquals { element, value } => {
                write!(f, "{} == '{}'", element.handle, value)
            }
            Condition::Checked { element, checked } => {
                write!(f, "{} checked={}", element.handle, checked)
            }
        }
    }
}

/// Check `condition` every `interval` until it holds or `timeout` elapses.
/// Always checks at least once.
pub async fn poll<P>(
    page: &P,
    condition: &Condition,
    timeout: Duration,
    interval: Duration,
) -> Result<bool>
where
    P: PageAdapter + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        if page.check(condition).await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            trace!("condition timed out: {}", condition);
            return Ok(false);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeNode, FakePage};

    #[tokio::test(start_paused = true)]
    async fn poll_returns_true_immediately_when_condition_holds() {
        let page = FakePage::new();
        page.add(FakeNode::text("Thanks for applying"));
        let ok = poll(
            &page,
            &Condition::text_present("Thanks"),
            Duration::from_secs(1),
            DEFAULT_POLL_INTERVAL,
        )
        .await
        .unwrap();
        assert!(ok);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_times_out_after_bounded_checks() {
        let page = FakePage::new();
        let start = Instant::now();
        let ok = poll(
            &page,
            &Condition::text_present("never"),
            Duration::from_millis(450),
            Duration::from_millis(100),
        )
        .await
        .unwrap();
        assert!(!ok);
        assert!(start.elapsed() >= Duration::from_millis(450));
        // initial check + one per interval up to the deadline
        let checks = page.calls().iter().filter(|c| c.starts_with("check")).count();
        assert_eq!(checks, 6);
    }

    #[test]
    fn display_is_readable() {
        let c = Condition::visible(&Locator::parse("role:heading=My Experience"));
        assert_eq!(c.to_string(), "visible role:heading=My Experience");
    }
}
