use serde::{Serialize, Serializer};
use std::fmt;

/// Well-known JSON paths threaded between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonPath {
    /// The whole state input.
    Root,
    /// Payload of the triggering event.
    EventDetail,
    /// Field holding the unwrapped result of a function invocation.
    InvokeResult,
    /// Field receiving the error description inside a catch branch.
    ErrorResult,
}

impl JsonPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonPath::Root => "$",
            JsonPath::EventDetail => "$.detail",
            JsonPath::InvokeResult => "$.Payload",
            JsonPath::ErrorResult => "$.error",
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Tracks where the next emitted state reads its input from.
///
/// Each open fan-out scope remembers the path of the list it iterates, so
/// the `ForEach` state can be built once the scope closes.
#[derive(Debug, Clone)]
pub struct DataPath {
    current: JsonPath,
    scopes: Vec<JsonPath>,
}

impl Default for DataPath {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPath {
    pub fn new() -> Self {
        Self {
            current: JsonPath::Root,
            scopes: Vec::new(),
        }
    }

    pub fn current(&self) -> JsonPath {
        self.current
    }

    /// Number of open fan-out scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The pipeline source was entered: read the event payload next.
    pub fn enter_event(&mut self) {
        self.current = JsonPath::EventDetail;
    }

    /// A function was invoked: its response is wrapped in an envelope.
    pub fn enter_result(&mut self) {
        self.current = JsonPath::InvokeResult;
    }

    /// Open a fan-out scope. Returns the path of the iterated list; inside
    /// the scope every element is the whole state input.
    pub fn push_scope(&mut self) -> JsonPath {
        let items = self.current;
        self.scopes.push(items);
        self.current = JsonPath::Root;
        items
    }

    /// Close the innermost scope after a `ForEach` state was emitted for it.
    pub fn pop_scope(&mut self) -> Option<JsonPath> {
        let items = self.scopes.pop();
        self.current = JsonPath::InvokeResult;
        items
    }

    /// Close the innermost scope without emitting any state, which leaves
    /// the iterated list where it was.
    pub fn collapse_scope(&mut self) -> Option<JsonPath> {
        let items = self.scopes.pop();
        if let Some(items) = items {
            self.current = items;
        }
        items
    }
}
