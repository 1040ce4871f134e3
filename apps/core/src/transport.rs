use serde::{Deserialize, Serialize};

use crate::contract::{CoreRequest, CoreResponse, DispatchResponse, SessionView};
use crate::intent::{DispatchOutcome, Intent, KeyChord};
use crate::navigation::{LaunchError, NavigationSink};
use crate::session::SearchSession;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    Launch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

pub fn handle_request(
    session: &mut SearchSession,
    sink: &mut dyn NavigationSink,
    request: CoreRequest,
) -> TransportResponse {
    let result = match request {
        CoreRequest::Query(query) => {
            session.set_query(&query.text);
            Ok(CoreResponse::Query(SessionView::capture(session)))
        }
        CoreRequest::Render => Ok(CoreResponse::Render(SessionView::capture(session))),
        CoreRequest::Key(key) => KeyChord::parse(&key.chord)
            .map_err(|error| invalid_request(error.to_string()))
            .and_then(|chord| {
                let outcome = session.handle_key(&chord);
                forward(session, sink, outcome).map(CoreResponse::Key)
            }),
        CoreRequest::Intent(intent) => Intent::parse(&intent.intent)
            .ok_or_else(|| invalid_request(format!("unknown intent '{}'", intent.intent)))
            .and_then(|intent| {
                let outcome = session.dispatch(intent);
                forward(session, sink, outcome).map(CoreResponse::Intent)
            }),
    };

    match result {
        Ok(response) => TransportResponse::Ok { response },
        Err(error) => TransportResponse::Err { error },
    }
}

pub fn handle_json(
    session: &mut SearchSession,
    sink: &mut dyn NavigationSink,
    payload: &str,
) -> String {
    let response = match serde_json::from_str::<CoreRequest>(payload) {
        Ok(request) => handle_request(session, sink, request),
        Err(error) => TransportResponse::Err {
            error: ErrorResponse {
                code: ErrorCode::InvalidJson,
                message: error.to_string(),
            },
        },
    };

    serde_json::to_string(&response).expect("transport response should serialize")
}

fn forward(
    session: &SearchSession,
    sink: &mut dyn NavigationSink,
    outcome: DispatchOutcome,
) -> Result<DispatchResponse, ErrorResponse> {
    let launched = match outcome.open_request() {
        Some(request) => {
            sink.open(request).map_err(map_launch_error)?;
            true
        }
        None => false,
    };

    Ok(DispatchResponse {
        outcome,
        launched,
        view: SessionView::capture(session),
    })
}

fn invalid_request(message: String) -> ErrorResponse {
    ErrorResponse {
        code: ErrorCode::InvalidRequest,
        message,
    }
}

fn map_launch_error(error: LaunchError) -> ErrorResponse {
    tracing::warn!(%error, "open request failed");
    ErrorResponse {
        code: ErrorCode::Launch,
        message: error.to_string(),
    }
}
