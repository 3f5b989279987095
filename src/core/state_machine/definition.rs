//! Rendering of compiled pipelines into States-Language JSON.

use crate::core::state_machine::graph::{Chain, CompiledPipeline, State, StateKind, StateMachine};
use serde_json::{json, Map, Value};

pub const FUNCTION_INVOKE_RESOURCE: &str = "arn:aws:states:::lambda:invoke";
pub const QUEUE_SEND_RESOURCE: &str = "arn:aws:states:::sqs:sendMessage";
pub const EVENT_BUS_PUT_RESOURCE: &str = "arn:aws:states:::events:putEvents";

/// Definition body of the state machine.
pub fn render(machine: &StateMachine) -> Value {
    render_chain(&machine.chain)
}

impl CompiledPipeline {
    /// Deployable document: the state machine definition and its trigger.
    pub fn to_document(&self) -> Value {
        json!({
            "StateMachine": {
                "Name": self.state_machine.name,
                "Definition": render(&self.state_machine),
            },
            "Rule": {
                "Name": self.rule.name,
                "EventBusName": self.rule.event_bus.uri,
                "EventPattern": {
                    "detail-type": self.rule.pattern.detail_type,
                },
                "Targets": [
                    { "Id": "Target0", "StateMachine": self.rule.target },
                ],
            },
        })
    }
}

fn render_chain(chain: &Chain) -> Value {
    let mut states = Map::new();
    insert_chain(&mut states, chain);
    json!({
        "StartAt": chain.start_at().map(|state| state.id.as_str()).unwrap_or_default(),
        "States": states,
    })
}

/// Catch branch states share the scope of the state they protect, so they
/// are inserted into the same `States` map.
fn insert_chain(states: &mut Map<String, Value>, chain: &Chain) {
    for (index, state) in chain.states.iter().enumerate() {
        let next = chain.states.get(index + 1).map(|next| next.id.as_str());
        states.insert(state.id.clone(), render_state(state, next));
        for branch in &state.catch {
            insert_chain(states, &branch.states);
        }
    }
}

fn render_state(state: &State, next: Option<&str>) -> Value {
    let mut body = Map::new();
    match &state.kind {
        StateKind::Invoke { function } => {
            body.insert("Type".into(), json!("Task"));
            body.insert("Resource".into(), json!(FUNCTION_INVOKE_RESOURCE));
            body.insert("InputPath".into(), json!(state.input_path));
            body.insert(
                "Parameters".into(),
                json!({ "FunctionName": function.uri, "Payload.$": "$" }),
            );
        }
        StateKind::ForEach {
            items_path,
            concurrency,
            iterator,
        } => {
            let mut processor = render_chain(iterator);
            if let Some(processor) = processor.as_object_mut() {
                processor.insert("ProcessorConfig".into(), json!({ "Mode": "INLINE" }));
            }
            body.insert("Type".into(), json!("Map"));
            body.insert("ItemsPath".into(), json!(items_path));
            body.insert("MaxConcurrency".into(), json!(concurrency));
            body.insert("ItemProcessor".into(), processor);
        }
        StateKind::SendToQueue { queue } => {
            body.insert("Type".into(), json!("Task"));
            body.insert("Resource".into(), json!(QUEUE_SEND_RESOURCE));
            body.insert(
                "Parameters".into(),
                json!({ "QueueUrl": queue.uri, "MessageBody.$": state.input_path }),
            );
        }
        StateKind::SendToEventBus {
            bus,
            source,
            detail_type,
        } => {
            body.insert("Type".into(), json!("Task"));
            body.insert("Resource".into(), json!(EVENT_BUS_PUT_RESOURCE));
            body.insert(
                "Parameters".into(),
                json!({
                    "Entries": [{
                        "Detail.$": state.input_path,
                        "DetailType": detail_type,
                        "Source": source,
                        "EventBusName": bus.uri,
                    }]
                }),
            );
        }
        StateKind::CatchAndForward { target } => {
            body.insert("Type".into(), json!("Task"));
            body.insert("Resource".into(), json!(QUEUE_SEND_RESOURCE));
            body.insert(
                "Parameters".into(),
                json!({ "QueueUrl": target.uri, "MessageBody.$": state.input_path }),
            );
        }
        StateKind::Fail => {
            body.insert("Type".into(), json!("Fail"));
        }
    }

    if !matches!(state.kind, StateKind::Fail) {
        match next {
            Some(next) => body.insert("Next".into(), json!(next)),
            None => body.insert("End".into(), json!(true)),
        };
    }

    if !state.catch.is_empty() {
        let catchers: Vec<Value> = state
            .catch
            .iter()
            .map(|branch| {
                json!({
                    "ErrorEquals": branch.errors,
                    "ResultPath": branch.result_path,
                    "Next": branch.states.start_at().map(|s| s.id.as_str()).unwrap_or_default(),
                })
            })
            .collect();
        body.insert("Catch".into(), Value::Array(catchers));
    }

    Value::Object(body)
}
