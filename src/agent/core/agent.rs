use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Duration;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::config::{AgentConfig, FreeTextPolicy};
use super::messaging::{AgentCommand, AgentResponse};
use super::processor::AgentInner;
use crate::actions::ActionCatalog;
use crate::agent::{
    AgentError, AgentHistoryList, AgentResult, CycleOutcome, CycleReport, DecisionPrompt,
    RunOutcome, RunReport,
};
use crate::browser::BrowserDriver;
use crate::llm::DecisionModel;
use crate::page_extractor::PageExtractor;
use crate::utils::AgentState;

/// Agent handle for controlling async actor (NOT Clone)
pub struct Agent {
    inner: Arc<AgentInner>,
    command_channel: mpsc::Sender<AgentCommand>,
    response_channel: Mutex<mpsc::Receiver<AgentResponse>>,

    /// Background processor task handle
    #[allow(dead_code)]
    processor_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Agent {
    /// Create an agent and spawn its cycle processor.
    ///
    /// The catalog's callbacks are expected to act on the same `driver`.
    pub fn new(
        config: AgentConfig,
        driver: Arc<dyn BrowserDriver>,
        extractor: Arc<dyn PageExtractor>,
        model: Arc<dyn DecisionModel>,
        catalog: ActionCatalog,
        prompt: DecisionPrompt,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (resp_tx, resp_rx) = mpsc::channel(32);

        let schema = catalog.schema();
        let window = config.history_window;
        let inner = Arc::new(AgentInner {
            config,
            driver,
            extractor,
            model,
            catalog,
            schema,
            prompt,
            agent_state: Arc::new(Mutex::new(AgentState::new())),
            recent: Mutex::new(VecDeque::with_capacity(window)),
        });

        let processor_handle = Self::spawn_agent_processor(Arc::clone(&inner), cmd_rx, resp_tx);

        Self {
            inner,
            command_channel: cmd_tx,
            response_channel: Mutex::new(resp_rx),
            processor_handle: Some(processor_handle),
        }
    }

    /// Shared run flags; `request_stop()` on it ends the run before the next cycle.
    pub fn state(&self) -> Arc<Mutex<AgentState>> {
        Arc::clone(&self.inner.agent_state)
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.inner.catalog
    }

    /// Navigate to the start URL once, then cycle until the termination
    /// policy ends the run.
    ///
    /// Rejected decisions and failed actions do not end the run by
    /// themselves; navigation, observation and model failures do.
    pub async fn run(&self) -> AgentResult<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("agent_run", %run_id);

        async move {
            let config = &self.inner.config;
            info!(goal = %config.goal, start_url = %config.start_url, "Starting run");

            self.inner
                .driver
                .navigate(&config.start_url)
                .await
                .map_err(AgentError::Navigation)?;
            self.inner.recent.lock().await.clear();

            let mut history = AgentHistoryList::new();
            let outcome = self.cycle_until_done(&mut history).await?;

            info!(outcome = %outcome, cycles = history.len(), "Run finished");
            Ok(RunReport {
                run_id,
                outcome,
                history,
            })
        }
        .instrument(span)
        .await
    }

    async fn cycle_until_done(&self, history: &mut AgentHistoryList) -> AgentResult<RunOutcome> {
        let policy = &self.inner.config.termination;
        let mut consecutive_rejections = 0usize;

        for cycle in 1..=policy.max_cycles {
            debug!("Running cycle {}/{}", cycle, policy.max_cycles);

            if !self.is_running() {
                info!("Agent processor stopped externally, exiting run loop");
                return Ok(RunOutcome::Stopped);
            }

            if self.is_stop_requested().await {
                info!("Agent run stopped as requested");
                return Ok(RunOutcome::Stopped);
            }

            let report = match self.run_cycle().await {
                Ok(report) => report,
                Err(AgentError::Stopped) => return Ok(RunOutcome::Stopped),
                Err(e) => {
                    error!("Agent cycle error: {}", e);
                    return Err(e);
                }
            };

            let outcome = report.outcome.clone();
            history.record(report);

            match outcome {
                CycleOutcome::Finished { summary } => {
                    return Ok(RunOutcome::GoalAchieved { summary });
                }
                CycleOutcome::Abandoned { reason } => {
                    return Ok(RunOutcome::GoalAbandoned { reason });
                }
                CycleOutcome::Spoke { text } if policy.on_free_text == FreeTextPolicy::Complete => {
                    return Ok(RunOutcome::GoalAchieved { summary: text });
                }
                CycleOutcome::Rejected { error } => {
                    consecutive_rejections += 1;
                    if policy.max_consecutive_rejections > 0
                        && consecutive_rejections >= policy.max_consecutive_rejections
                    {
                        warn!(
                            "Giving up after {} consecutive rejected decisions",
                            consecutive_rejections
                        );
                        return Ok(RunOutcome::GoalAbandoned {
                            reason: format!(
                                "{consecutive_rejections} consecutive invalid decisions; last: {error}"
                            ),
                        });
                    }
                }
                CycleOutcome::Spoke { .. } | CycleOutcome::Executed(_) => {
                    consecutive_rejections = 0;
                }
            }
        }

        Ok(RunOutcome::CycleBudgetExhausted {
            cycles: policy.max_cycles,
        })
    }

    /// Run a single cycle on the processor task
    async fn run_cycle(&self) -> AgentResult<CycleReport> {
        self.command_channel
            .send(AgentCommand::RunCycle)
            .await
            .map_err(|_| AgentError::ChannelClosed("Command channel closed".into()))?;

        let mut receiver = self.response_channel.lock().await;
        match receiver.recv().await {
            Some(AgentResponse::CycleComplete(report)) => Ok(report),
            Some(AgentResponse::Error(e)) => Err(e),
            Some(AgentResponse::Stopped) => Err(AgentError::Stopped),
            None => Err(AgentError::ChannelClosed("Response channel closed".into())),
        }
    }

    async fn is_stop_requested(&self) -> bool {
        self.inner.agent_state.lock().await.is_stop_requested()
    }

    /// Gracefully shut down the agent processor
    ///
    /// Sends Stop and waits up to 5 seconds for the processor to confirm.
    /// Call it only once no `run()` is in flight: both read the same response
    /// channel. To end a run in progress, use `request_stop()` on
    /// [`Agent::state`]; the run then returns [`RunOutcome::Stopped`].
    pub async fn stop(&self) -> AgentResult<()> {
        debug!("Stopping agent processor");

        self.command_channel
            .send(AgentCommand::Stop)
            .await
            .map_err(|_| {
                AgentError::ChannelClosed("Cannot stop agent: command channel already closed".into())
            })?;

        let mut receiver = self.response_channel.lock().await;

        match tokio::time::timeout(Duration::from_secs(5), receiver.recv()).await {
            Ok(Some(AgentResponse::Stopped)) => {
                info!("Agent processor stopped gracefully");
                Ok(())
            }
            Ok(Some(other)) => {
                warn!("Expected Stopped response, got: {:?}", other);
                Err(AgentError::UnexpectedError(
                    "Agent processor sent unexpected response to Stop command".into(),
                ))
            }
            Ok(None) => {
                // processor already gone
                warn!("Agent response channel closed during stop");
                Ok(())
            }
            Err(_) => {
                error!("Agent processor did not respond to Stop within 5 seconds");
                Err(AgentError::UnexpectedError(
                    "Agent processor stop timeout - processor may be stuck".into(),
                ))
            }
        }
    }

    /// `false` once the processor has exited and dropped its command receiver.
    pub fn is_running(&self) -> bool {
        !self.command_channel.is_closed()
    }

    fn spawn_agent_processor(
        inner: Arc<AgentInner>,
        mut cmd_rx: mpsc::Receiver<AgentCommand>,
        resp_tx: mpsc::Sender<AgentResponse>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(
            async move {
                while let Some(cmd) = cmd_rx.recv().await {
                    match cmd {
                        AgentCommand::RunCycle => {
                            let response = match inner.process_cycle().await {
                                Ok(report) => AgentResponse::CycleComplete(report),
                                Err(e) => AgentResponse::Error(e),
                            };

                            if let Err(e) = resp_tx.send(response).await {
                                error!("Failed to send response: {}", e);
                                break;
                            }
                        }
                        AgentCommand::Stop => {
                            if let Err(e) = resp_tx.send(AgentResponse::Stopped).await {
                                error!("Failed to send stopped response: {}", e);
                            }
                            break;
                        }
                    }
                }
                debug!("Agent processor shutting down cleanly");
            }
            .in_current_span(),
        )
    }
}
