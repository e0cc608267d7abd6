use crate::config::AppConfig;
use crate::dashboard::{Dashboard, DashboardView};
use crate::map::Tooltip;
use crate::page;
use crate::types::Team;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Either a ready dashboard or the notice explaining why there is none.
pub enum AppState {
    Ready(Mutex<Dashboard>),
    Failed { notice: String },
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct QueryResponse {
    team: Team,
    tooltip: Tooltip,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/teams/:team", get(team_handler))
        .route("/api/query", get(query_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn unavailable(notice: &str) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({ "error": notice }))).into_response()
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.as_ref() {
        AppState::Ready(dashboard) => {
            let mut dashboard = dashboard.lock().await;
            Html(page::render_dashboard(&mut dashboard)).into_response()
        }
        AppState::Failed { notice } => {
            (StatusCode::SERVICE_UNAVAILABLE, Html(page::render_notice(notice))).into_response()
        }
    }
}

async fn team_handler(State(state): State<Arc<AppState>>, Path(team): Path<String>) -> Response {
    let dashboard = match state.as_ref() {
        AppState::Ready(dashboard) => dashboard,
        AppState::Failed { notice } => return unavailable(notice),
    };
    let team: Team = match team.parse() {
        Ok(team) => team,
        Err(e) => {
            return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": e.to_string() })))
                .into_response()
        }
    };

    let mut dashboard = dashboard.lock().await;
    dashboard.select_team(team);
    let view: DashboardView = dashboard.view();
    Json(view).into_response()
}

async fn query_handler(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>) -> Response {
    let dashboard = match state.as_ref() {
        AppState::Ready(dashboard) => dashboard,
        AppState::Failed { notice } => return unavailable(notice),
    };

    let dashboard = dashboard.lock().await;
    let response = dashboard.map().region_at(params.lon, params.lat).map(|layer| QueryResponse {
        team: dashboard.current_team(),
        tooltip: layer.tooltip().clone(),
    });
    Json(response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::data::{parse_features, SAMPLE_GEOJSON};
    use crate::types::{record, Snapshot};
    use axum::body::to_bytes;
    use std::collections::BTreeMap;

    fn ready_state() -> Arc<AppState> {
        let mut datasets = BTreeMap::new();
        datasets.insert(Team::Editor, vec![record("PK02", Some("Ongole"), Some("Dev"), Some("Done"))]);
        let snapshot = Snapshot::new(datasets, parse_features(SAMPLE_GEOJSON, "assem_name").unwrap());
        Arc::new(AppState::Ready(Mutex::new(Dashboard::new(snapshot, &MapConfig::default(), Team::Script))))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn team_route_switches_selection() {
        let state = ready_state();
        let response = team_handler(State(state.clone()), Path("editor".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["team"], "editor");
        assert_eq!(json["max_count"], 1);

        let query = Query(QueryParams { lat: 15.5, lon: 81.5 });
        let json = body_json(query_handler(State(state), query).await).await;
        assert_eq!(json["team"], "editor");
        assert_eq!(json["tooltip"]["detail"]["name"], "Dev");
    }

    #[tokio::test]
    async fn unknown_team_is_not_found() {
        let response = team_handler(State(ready_state()), Path("sales".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn query_outside_map_is_null() {
        let query = Query(QueryParams { lat: 0.0, lon: 0.0 });
        let json = body_json(query_handler(State(ready_state()), query).await).await;
        assert!(json.is_null());
    }

    #[tokio::test]
    async fn failed_initialization_serves_notice() {
        let state = Arc::new(AppState::Failed { notice: crate::data::GEOMETRY_NOTICE.to_string() });
        let response = index_handler(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = team_handler(State(state), Path("script".to_string())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
