use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use registry_core::ReadinessHandle;
use serde::Serialize;

/// What `/health/live` and `/health/ready` need: the Consumer Loop's
/// readiness flag/heartbeat, and the staleness budget that turns a stale
/// heartbeat into "not alive" (§4.J, §5 "Liveness vs. readiness"). Neither
/// probe ever touches the database or the Coordinator, so a wedged apply
/// path can't make the health surface hang (§4.J: "the health surface must
/// never slow down apply" — and the converse, apply never slowing health).
#[derive(Clone)]
pub struct HealthState {
    readiness: ReadinessHandle,
    heartbeat_staleness_budget: Duration,
}

impl HealthState {
    pub fn new(readiness: ReadinessHandle, heartbeat_staleness_budget: Duration) -> Self {
        Self {
            readiness,
            heartbeat_staleness_budget,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    ready: bool,
    alive: bool,
}

pub async fn live(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<HealthBody>) {
    let alive = state.readiness.is_alive(state.heartbeat_staleness_budget);
    let body = HealthBody {
        ready: state.readiness.is_ready(),
        alive,
    };
    let status = if alive { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}

pub async fn ready(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<HealthBody>) {
    let is_ready = state.readiness.is_ready();
    let body = HealthBody {
        ready: is_ready,
        alive: state.readiness.is_alive(state.heartbeat_staleness_budget),
    };
    let status = if is_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}
