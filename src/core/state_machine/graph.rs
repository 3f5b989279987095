//! Compiled artifact: a chain of states plus the rule that triggers it.

use crate::core::pipeline::resource::{EventBusRef, FunctionRef, QueueRef};
use crate::core::state_machine::paths::JsonPath;
use serde::Serialize;

/// Error matcher catching every runtime failure of a state.
pub const ALL_ERRORS: &str = "States.ALL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub id: String,
    pub input_path: JsonPath,
    pub kind: StateKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub catch: Vec<CatchBranch>,
}

impl State {
    pub fn new(id: impl Into<String>, input_path: JsonPath, kind: StateKind) -> Self {
        Self {
            id: id.into(),
            input_path,
            kind,
            catch: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateKind {
    Invoke {
        function: FunctionRef,
    },
    ForEach {
        items_path: JsonPath,
        concurrency: usize,
        iterator: Chain,
    },
    SendToQueue {
        queue: QueueRef,
    },
    SendToEventBus {
        bus: EventBusRef,
        source: String,
        detail_type: String,
    },
    CatchAndForward {
        target: QueueRef,
    },
    Fail,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Invoke { .. } => "Invoke",
            StateKind::ForEach { .. } => "ForEach",
            StateKind::SendToQueue { .. } => "SendToQueue",
            StateKind::SendToEventBus { .. } => "SendToEventBus",
            StateKind::CatchAndForward { .. } => "CatchAndForward",
            StateKind::Fail => "Fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StateKind::SendToQueue { .. } | StateKind::SendToEventBus { .. } | StateKind::Fail
        )
    }
}

/// Error interception attached to a state: on any matching failure the
/// state input, extended with the error at `result_path`, flows into
/// `states`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchBranch {
    pub errors: Vec<String>,
    pub result_path: JsonPath,
    pub states: Chain,
}

/// Linear sequence of states; each state transitions to the next one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Chain {
    pub states: Vec<State>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn start_at(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Every state reachable from this chain, including iterator and catch
    /// branch states, in depth-first order.
    pub fn all_states(&self) -> Vec<&State> {
        let mut out = Vec::new();
        collect_states(self, &mut out);
        out
    }
}

impl From<Vec<State>> for Chain {
    fn from(states: Vec<State>) -> Self {
        Self { states }
    }
}

fn collect_states<'a>(chain: &'a Chain, out: &mut Vec<&'a State>) {
    for state in &chain.states {
        out.push(state);
        if let StateKind::ForEach { iterator, .. } = &state.kind {
            collect_states(iterator, out);
        }
        for branch in &state.catch {
            collect_states(&branch.states, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMachine {
    pub name: String,
    pub chain: Chain,
}

impl StateMachine {
    pub fn start_at(&self) -> Option<&str> {
        self.chain.start_at().map(|state| state.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPattern {
    pub detail_type: Vec<String>,
}

/// Subscription starting the state machine for matching events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerRule {
    pub name: String,
    pub event_bus: EventBusRef,
    pub pattern: EventPattern,
    /// Name of the state machine started by the rule.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPipeline {
    pub state_machine: StateMachine,
    pub rule: TriggerRule,
}
