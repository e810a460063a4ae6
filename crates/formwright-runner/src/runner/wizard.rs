use super::engine::FillEngine;
use super::report::{FillError, FillReport};
use crate::config::{AnswerMap, FormSchema, SchemaError, Timeouts, Transition};
use formwright_page::{wait, Condition, PageAdapter, PageError};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where a wizard run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    NotStarted,
    StepRunning(usize),
    StepSucceeded(usize),
    StepFailed(usize),
    Completed,
    Aborted,
}

impl WizardPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    fn can_move_to(&self, next: &WizardPhase) -> bool {
        use WizardPhase::*;
        match (*self, *next) {
            (NotStarted, StepRunning(0) | Completed | Aborted) => true,
            (StepRunning(i), StepSucceeded(j)) | (StepRunning(i), StepFailed(j)) => i == j,
            (StepSucceeded(i), StepRunning(j)) => j == i + 1,
            (StepSucceeded(_), Completed) | (StepFailed(_), Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::StepRunning(i) => write!(f, "running step {}", i),
            Self::StepSucceeded(i) => write!(f, "step {} succeeded", i),
            Self::StepFailed(i) => write!(f, "step {} failed", i),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// How the last step transition went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Confirmed,
    Failed,
}

/// State carried across the steps of one run.
#[derive(Debug, Clone)]
pub struct WizardState {
    pub step: usize,
    pub phase: WizardPhase,
    /// Entries created so far, per repeatable group.
    pub entry_counts: HashMap<String, usize>,
    pub last_transition: Option<TransitionOutcome>,
    /// Every phase entered, in order.
    pub history: Vec<WizardPhase>,
}

impl WizardState {
    fn new() -> Self {
        Self {
            step: 0,
            phase: WizardPhase::NotStarted,
            entry_counts: HashMap::new(),
            last_transition: None,
            history: vec![WizardPhase::NotStarted],
        }
    }

    fn advance(&mut self, next: WizardPhase) {
        debug_assert!(
            self.phase.can_move_to(&next),
            "illegal wizard transition {} -> {}",
            self.phase,
            next
        );
        debug!("wizard: {} -> {}", self.phase, next);
        if let WizardPhase::StepRunning(i) = next {
            self.step = i;
        }
        self.phase = next;
        self.history.push(next);
    }
}

/// One step's fill and, when declared, its transition.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub index: usize,
    pub name: String,
    pub fill: FillReport,
    pub transition: Option<TransitionOutcome>,
}

/// Result of a wizard run.
#[derive(Debug, Clone)]
pub struct WizardReport {
    /// `Completed` or `Aborted`.
    pub phase: WizardPhase,
    pub steps: Vec<StepReport>,
    pub failed_step: Option<usize>,
    pub error: Option<FillError>,
    pub entry_counts: HashMap<String, usize>,
    pub phases: Vec<WizardPhase>,
    pub duration_ms: u64,
}

impl WizardReport {
    pub fn is_success(&self) -> bool {
        self.phase == WizardPhase::Completed
    }
}

/// Runs form schemas in sequence across step transitions.
pub struct Wizard<'p, P: PageAdapter + ?Sized> {
    engine: FillEngine<'p, P>,
}

impl<'p, P: PageAdapter + ?Sized> Wizard<'p, P> {
    pub fn new(page: &'p P) -> Self {
        Self {
            engine: FillEngine::new(page),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.engine = self.engine.with_timeouts(timeouts);
        self
    }

    /// Run `steps` with one answer map per step.
    pub async fn run(&self, steps: &[FormSchema], answers: &[AnswerMap]) -> WizardReport {
        let start = Instant::now();
        let mut state = WizardState::new();

        if steps.len() != answers.len() {
            let error = FillError::SchemaValidationError(vec![SchemaError::new(
                "",
                format!(
                    "{} steps but {} answer sets",
                    steps.len(),
                    answers.len()
                ),
            )]);
            warn!("wizard not started: {}", error);
            state.advance(WizardPhase::Aborted);
            return Self::finish(state, Vec::new(), None, Some(error), start);
        }

        let mut reports = Vec::with_capacity(steps.len());
        for (i, (step, step_answers)) in steps.iter().zip(answers).enumerate() {
            let name = step.display_name(i);
            state.advance(WizardPhase::StepRunning(i));
            info!("step {}/{}: {}", i + 1, steps.len(), name);

            let fill = self
                .engine
                .fill_with_counts(step, step_answers, &mut state.entry_counts)
                .await;
            if let Some(error) = fill.error().cloned() {
                state.advance(WizardPhase::StepFailed(i));
                state.advance(WizardPhase::Aborted);
                reports.push(StepReport {
                    index: i,
                    name,
                    fill,
                    transition: None,
                });
                return Self::finish(state, reports, Some(i), Some(error), start);
            }

            let mut report = StepReport {
                index: i,
                name: name.clone(),
                fill,
                transition: None,
            };
            if let Some(ref transition) = step.transition {
                let outcome = self.transition(transition, &name).await;
                let confirmed = outcome.is_ok();
                let recorded = if confirmed {
                    TransitionOutcome::Confirmed
                } else {
                    TransitionOutcome::Failed
                };
                state.last_transition = Some(recorded);
                report.transition = Some(recorded);
                if let Err(error) = outcome {
                    state.advance(WizardPhase::StepFailed(i));
                    state.advance(WizardPhase::Aborted);
                    reports.push(report);
                    return Self::finish(state, reports, Some(i), Some(error), start);
                }
            }
            state.advance(WizardPhase::StepSucceeded(i));
            reports.push(report);
        }

        state.advance(WizardPhase::Completed);
        info!("wizard completed ({} steps)", steps.len());
        Self::finish(state, reports, None, None, start)
    }

    /// Run `steps` with the same answers for every step.
    pub async fn run_shared(&self, steps: &[FormSchema], answers: &AnswerMap) -> WizardReport {
        let per_step = vec![answers.clone(); steps.len()];
        self.run(steps, &per_step).await
    }

    /// Click the step's continue control and wait for the next step.
    async fn transition(&self, transition: &Transition, step: &str) -> Result<(), FillError> {
        let page = self.engine.page();
        let timeouts = self.engine.timeouts();
        let timeout = transition
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| timeouts.transition());
        let page_err = |source: PageError| FillError::Page {
            field: step.to_string(),
            source,
        };

        let button = self.engine.locate(&transition.click, step, None).await?;
        info!("transition: click '{}'", button.text.trim());
        page.click(&button).await.map_err(page_err)?;
        let confirmed = wait::poll(
            page,
            &Condition::visible(&transition.confirm),
            timeout,
            timeouts.poll(),
        )
        .await
        .map_err(page_err)?;
        if confirmed {
            return Ok(());
        }
        warn!("transition from '{}' not confirmed", step);
        Err(FillError::TransitionTimedOut {
            step: step.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn finish(
        state: WizardState,
        steps: Vec<StepReport>,
        failed_step: Option<usize>,
        error: Option<FillError>,
        start: Instant,
    ) -> WizardReport {
        debug_assert!(state.phase.is_terminal(), "wizard finished in {}", state.phase);
        WizardReport {
            phase: state.phase,
            steps,
            failed_step,
            error,
            entry_counts: state.entry_counts,
            phases: state.history,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_phase_moves() {
        use WizardPhase::*;
        assert!(NotStarted.can_move_to(&StepRunning(0)));
        assert!(!NotStarted.can_move_to(&StepRunning(1)));
        assert!(StepRunning(2).can_move_to(&StepSucceeded(2)));
        assert!(!StepRunning(2).can_move_to(&StepSucceeded(3)));
        assert!(StepSucceeded(0).can_move_to(&StepRunning(1)));
        assert!(StepSucceeded(1).can_move_to(&Completed));
        assert!(StepFailed(1).can_move_to(&Aborted));
        assert!(!StepFailed(1).can_move_to(&Completed));
        assert!(Completed.is_terminal() && Aborted.is_terminal());
    }

    #[test]
    fn state_records_history() {
        let mut state = WizardState::new();
        state.advance(WizardPhase::StepRunning(0));
        state.advance(WizardPhase::StepSucceeded(0));
        state.advance(WizardPhase::StepRunning(1));
        assert_eq!(state.step, 1);
        assert_eq!(
            state.history,
            vec![
                WizardPhase::NotStarted,
                WizardPhase::StepRunning(0),
                WizardPhase::StepSucceeded(0),
                WizardPhase::StepRunning(1),
            ]
        );
    }
}
