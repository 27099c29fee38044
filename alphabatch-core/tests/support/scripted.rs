//! In-memory stand-in for the simulation service.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use alphabatch_core::orchestration::{JobReport, RunObserver};
use alphabatch_core::transport::{
    SimulationTransport, SubmitOutcome, TransportError,
};
use alphabatch_model::{
    AlphaId, AlphaResult, CheckResult, InSampleSummary, PollLocator,
    PollSnapshot, RegularCode, SimulationProgress, SimulationRequest,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// How a simulation of a given expression plays out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behaviour {
    Pass,
    FailChecks,
    Error,
    Lost,
}

/// One scripted answer to a submit call; unscripted calls are accepted.
#[derive(Debug, Clone)]
pub enum SubmitStep {
    Accept,
    RateLimit,
    Reject(u16),
}

struct Simulation {
    expression: String,
    polls: usize,
}

#[derive(Default)]
struct State {
    submit_steps: VecDeque<SubmitStep>,
    external_running: VecDeque<usize>,
    simulations: HashMap<String, Simulation>,
    live: HashSet<String>,
    max_live: usize,
    submitted: Vec<String>,
    alphas: HashMap<String, AlphaResult>,
    next: usize,
}

pub struct ScriptedService {
    state: Mutex<State>,
    polls_to_complete: usize,
    behaviour: Box<dyn Fn(&str) -> Behaviour + Send + Sync>,
}

impl ScriptedService {
    pub fn new(polls_to_complete: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            polls_to_complete,
            behaviour: Box::new(|_| Behaviour::Pass),
        }
    }

    pub fn with_behaviour(
        mut self,
        behaviour: impl Fn(&str) -> Behaviour + Send + Sync + 'static,
    ) -> Self {
        self.behaviour = Box::new(behaviour);
        self
    }

    pub fn script_submits(self, steps: impl IntoIterator<Item = SubmitStep>) -> Self {
        self.state.lock().unwrap().submit_steps.extend(steps);
        self
    }

    /// External running counts reported by successive cycles; once the
    /// script runs out the service reports our own live simulations.
    pub fn script_running(self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.state.lock().unwrap().external_running.extend(counts);
        self
    }

    pub fn submitted_expressions(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn max_live(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    fn finish(state: &mut State, locator: &str) {
        state.live.remove(locator);
    }

    fn result_for(alpha_id: &str, expression: &str, passing: bool) -> AlphaResult {
        let second = if passing { "PASS" } else { "FAIL" };
        AlphaResult {
            id: AlphaId::from(alpha_id),
            created_at: "2025-02-03T04:05:06-05:00".to_string(),
            regular: RegularCode {
                code: expression.to_string(),
            },
            in_sample: InSampleSummary {
                checks: vec![
                    CheckResult::new("LOW_SHARPE", "PASS", Some(1.58)),
                    CheckResult::new("LOW_FITNESS", second, Some(1.02)),
                    CheckResult::new("LOW_TURNOVER", "PASS", Some(0.11)),
                    CheckResult::new("SELF_CORRELATION", "PENDING", None),
                ],
            },
        }
    }
}

#[async_trait]
impl SimulationTransport for ScriptedService {
    async fn submit_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SubmitOutcome, TransportError> {
        let mut state = self.state.lock().unwrap();
        match state.submit_steps.pop_front().unwrap_or(SubmitStep::Accept) {
            SubmitStep::RateLimit => Ok(SubmitOutcome::RateLimited),
            SubmitStep::Reject(status) => Ok(SubmitOutcome::Rejected {
                status,
                body: "bad expression".to_string(),
            }),
            SubmitStep::Accept => {
                state.next += 1;
                let locator = format!("simulations/{}", state.next);
                state.simulations.insert(
                    locator.clone(),
                    Simulation {
                        expression: request.expression().to_string(),
                        polls: 0,
                    },
                );
                state.live.insert(locator.clone());
                state.max_live = state.max_live.max(state.live.len());
                state.submitted.push(request.expression().to_string());
                Ok(SubmitOutcome::Accepted(PollLocator::new(locator)))
            }
        }
    }

    async fn poll_simulation(
        &self,
        locator: &PollLocator,
    ) -> Result<PollSnapshot, TransportError> {
        let mut state = self.state.lock().unwrap();
        let key = locator.as_str().to_string();
        let Some(sim) = state.simulations.get_mut(&key) else {
            return Err(TransportError::NotFound(key));
        };
        sim.polls += 1;
        let polls = sim.polls;
        let expression = sim.expression.clone();

        if polls < self.polls_to_complete {
            return Ok(PollSnapshot::new(
                SimulationProgress {
                    progress: Some(polls as f64 / self.polls_to_complete as f64),
                    ..SimulationProgress::default()
                },
                Some(1.0),
            ));
        }

        Self::finish(&mut state, &key);
        match (self.behaviour)(&expression) {
            Behaviour::Lost => {
                state.simulations.remove(&key);
                Err(TransportError::NotFound(key))
            }
            Behaviour::Error => Ok(PollSnapshot::new(
                SimulationProgress {
                    status: Some("ERROR".to_string()),
                    message: Some("unknown variable".to_string()),
                    ..SimulationProgress::default()
                },
                None,
            )),
            behaviour => {
                let alpha_id = format!("A{}", key.trim_start_matches("simulations/"));
                let result = Self::result_for(
                    &alpha_id,
                    &expression,
                    behaviour == Behaviour::Pass,
                );
                state.alphas.insert(alpha_id.clone(), result);
                Ok(PollSnapshot::new(
                    SimulationProgress {
                        status: Some("COMPLETE".to_string()),
                        result_id: Some(AlphaId::from(alpha_id.as_str())),
                        ..SimulationProgress::default()
                    },
                    Some(0.0),
                ))
            }
        }
    }

    async fn fetch_alpha(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<AlphaResult, TransportError> {
        self.state
            .lock()
            .unwrap()
            .alphas
            .get(alpha_id.as_str())
            .cloned()
            .ok_or_else(|| TransportError::NotFound(alpha_id.to_string()))
    }

    async fn running_simulations(&self) -> Result<usize, TransportError> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.external_running.pop_front() {
            Some(count) => count,
            None => state.live.len(),
        })
    }
}

/// Observer that keeps everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    pub reports: Mutex<Vec<JobReport>>,
    pub percents: Mutex<Vec<u8>>,
    pub texts: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    cancel_after_progress: Mutex<Option<(usize, CancellationToken)>>,
}

impl RecordingObserver {
    /// Cancels `token` once `emissions` overall-progress updates were seen.
    pub fn cancelling_after(emissions: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after_progress: Mutex::new(Some((emissions, token))),
            ..Self::default()
        }
    }

    pub fn reports(&self) -> Vec<JobReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.percents.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_progress_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }

    fn on_overall_progress(&self, percent: u8, _retired: usize, _total: usize) {
        let mut percents = self.percents.lock().unwrap();
        percents.push(percent);
        if let Some((after, token)) = self.cancel_after_progress.lock().unwrap().as_ref()
            && percents.len() >= *after
        {
            token.cancel();
        }
    }

    fn on_job_complete(&self, report: &JobReport) {
        self.reports.lock().unwrap().push(report.clone());
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
