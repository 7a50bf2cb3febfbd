//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::aggregate::{ByClass, ByHour, ByStartSite, ByVisitedSite, CountStats, TripTimeStats, routes_stats};
use crate::cache::QueryKey;
use crate::domain::{SiteCode, VehicleClass, timestamp_format};
use crate::export::write_journeys_csv;
use crate::filter::{ClassFilter, TimeWindowFilter};
use crate::route::{FinePass, RouteSpec};
use crate::search::{SearchError, Searcher};
use crate::store::JourneyStore;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sites", get(list_sites))
        .route("/routes/search", post(search_routes))
        .route("/routes/journeys", post(route_journeys))
        .route("/routes/stats", post(route_stats))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Every site seen in the loaded data.
async fn list_sites(State(state): State<AppState>) -> Json<SitesResponse> {
    let sites = state.store.sites().iter().map(SiteCode::to_string).collect();
    Json(SitesResponse { sites })
}

/// Grouped statistics over route journeys.
async fn search_routes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let req: RouteSearchRequest = parse_json(&body)?;
    let key = QueryKey::new("search", &req);

    if let Some(key) = &key {
        if let Some(report) = state.cache.get_report(key).await {
            debug!("search served from cache");
            return Ok(Json(SearchResponse::from(report.as_ref())).into_response());
        }
    }

    let searcher = build_search(&state, &req)?;
    let store = state.store.clone();
    let report = run_blocking(move || searcher.combined(store.as_ref()).map_err(AppError::from)).await?;
    let report = Arc::new(report);

    if let Some(key) = key {
        state.cache.insert_report(key, report.clone()).await;
    }

    Ok(Json(SearchResponse::from(report.as_ref())).into_response())
}

/// The derived route journeys, as JSON or CSV.
async fn route_journeys(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let req: RouteQueryRequest = parse_json(&body)?;
    let pass = filtered_journeys(&state, &req).await?;

    if accepts_csv(&headers) {
        let mut out = Vec::new();
        write_journeys_csv(&pass.journeys, &mut out).map_err(|e| AppError::Internal {
            message: format!("CSV error: {e}"),
        })?;
        Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], out).into_response())
    } else {
        Ok(Json(JourneysResponse::from(pass.as_ref())).into_response())
    }
}

/// Count, class breakdown and mean trip time of route journeys.
async fn route_stats(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RouteStatsResponse>, AppError> {
    let req: RouteQueryRequest = parse_json(&body)?;
    let pass = filtered_journeys(&state, &req).await?;
    Ok(Json(RouteStatsResponse::new(
        routes_stats(&pass.journeys),
        &pass.errors,
    )))
}

/// Run the filters of `req`, through the cache.
async fn filtered_journeys(
    state: &AppState,
    req: &RouteQueryRequest,
) -> Result<Arc<FinePass>, AppError> {
    let key = QueryKey::new("journeys", req);

    if let Some(key) = &key {
        if let Some(pass) = state.cache.get_journeys(key).await {
            debug!("journeys served from cache");
            return Ok(pass);
        }
    }

    let searcher = build_filters(state, req)?;
    let store = state.store.clone();
    let pass = run_blocking(move || {
        searcher
            .get_and_filter(store.as_ref())
            .map_err(AppError::from)
    })
    .await?;
    let pass = Arc::new(pass);

    if let Some(key) = key {
        state.cache.insert_journeys(key, pass.clone()).await;
    }

    Ok(pass)
}

/// A searcher with the route filter first, then class and time filters.
fn build_filters(state: &AppState, req: &RouteQueryRequest) -> Result<Searcher, AppError> {
    let start = parse_site("start", &req.start)?;
    let end = parse_site("end", &req.end)?;
    let via = req
        .via
        .iter()
        .map(|s| parse_site("via", s))
        .collect::<Result<Vec<_>, _>>()?;

    let spec = RouteSpec::new(start, end)
        .with_via(via)
        .indirect(req.indirect_allowed);
    let mut searcher = Searcher::for_route(spec, state.store.as_ref(), state.format)?;

    if !req.classes.is_empty() {
        searcher = searcher.filter(ClassFilter::new(
            req.classes.iter().map(|c| VehicleClass::new(c.trim())),
        ));
    }

    let from = req.from.as_deref().map(|s| parse_time("from", s)).transpose()?;
    let to = req.to.as_deref().map(|s| parse_time("to", s)).transpose()?;
    if from.is_some() || to.is_some() {
        searcher = searcher.filter(TimeWindowFilter::new(from, to));
    }

    Ok(searcher)
}

/// [`build_filters`] plus the requested groupers and stats.
fn build_search(state: &AppState, req: &RouteSearchRequest) -> Result<Searcher, AppError> {
    let mut searcher = build_filters(state, &req.route)?;

    for group in &req.group_by {
        searcher = match group {
            GroupBy::Hour => searcher.group_by(ByHour),
            GroupBy::Class => searcher.group_by(ByClass),
            GroupBy::StartSite => searcher.group_by(ByStartSite),
            GroupBy::VisitedSite { from } => {
                let start_filter = from
                    .as_deref()
                    .map(|s| parse_site("group_by.from", s))
                    .transpose()?;
                searcher.group_by(ByVisitedSite { start_filter })
            }
        };
    }

    let stats = if req.stats.is_empty() {
        &[StatKind::Count, StatKind::TripTime][..]
    } else {
        &req.stats[..]
    };
    for stat in stats {
        searcher = match stat {
            StatKind::Count => searcher.stat(CountStats),
            StatKind::TripTime => searcher.stat(TripTimeStats),
        };
    }

    Ok(searcher)
}

/// Parse a JSON body, turning failures into 400s.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(body = %String::from_utf8_lossy(body), "unparseable request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

fn parse_site(field: &str, s: &str) -> Result<SiteCode, AppError> {
    SiteCode::parse(s).map_err(|e| AppError::BadRequest {
        message: format!("Invalid {field} site: {e}"),
    })
}

fn parse_time(field: &str, s: &str) -> Result<NaiveDateTime, AppError> {
    timestamp_format::parse(s).ok_or_else(|| AppError::BadRequest {
        message: format!("Invalid {field} time: {s}"),
    })
}

/// Check if request accepts CSV.
fn accepts_csv(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/csv"))
}

/// Run CPU-bound search work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("search task failed: {e}"),
        })?
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Route(e) => AppError::BadRequest {
                message: e.to_string(),
            },
            SearchError::Store(e) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
