use crate::agent::{AgentError, CycleReport};

/// Agent command enum for internal message passing
pub(super) enum AgentCommand {
    RunCycle,
    Stop,
}

/// Agent response enum for internal message passing
#[derive(Debug)]
pub(super) enum AgentResponse {
    CycleComplete(CycleReport),
    Error(AgentError),
    Stopped,
}
