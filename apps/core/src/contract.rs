use serde::{Deserialize, Serialize};

use crate::intent::DispatchOutcome;
use crate::presenter::RenderInstruction;
use crate::session::SearchSession;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyRequest {
    /// Chord string such as `Ctrl+J` or `Down`.
    pub chord: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentRequest {
    /// Intent name such as `move-next` or `open-random`.
    pub intent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Query(QueryRequest),
    Key(KeyRequest),
    Intent(IntentRequest),
    Render,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub query: String,
    pub selected_index: usize,
    pub results_info: String,
    pub render: RenderInstruction,
}

impl SessionView {
    pub fn capture(session: &SearchSession) -> Self {
        Self {
            query: session.query().to_string(),
            selected_index: session.cursor(),
            results_info: session.results_info().to_string(),
            render: session.render(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchResponse {
    pub outcome: DispatchOutcome,
    pub launched: bool,
    pub view: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Query(SessionView),
    Key(DispatchResponse),
    Intent(DispatchResponse),
    Render(SessionView),
}
