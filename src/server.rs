// HTTP surface of the dashboard
//
// GET  /, /index          page shell
// POST /_update           re-run the callbacks subscribed to a changed control
// GET  /api/v1/chart      chart specification as JSON
// GET  /api/v1/chart/image  rendered chart (PNG or SVG)
// GET  /api/v1/ppp        mean price per part by year and theme
// GET  /api/v1/health     health check
//
// Chart endpoints take themes either as `themes=A,B` or as repeated
// `theme=A&theme=B`. Names containing a comma need the repeated form.

use crate::context::DashboardContext;
use crate::error::DashboardError;
use crate::graph::render_chart;
use crate::query::{ChartSpec, Selection};
use crate::shell::{render_page, Shell, UpdateRequest, UpdateResponse};
use crate::summary::{ppp_by_year_and_theme, PppSummary};
use crate::{OutputFormat, RenderOptions, VERSION};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<DashboardContext>,
    pub shell: Arc<Shell>,
}

impl AppState {
    pub fn new(ctx: DashboardContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            shell: Arc::new(Shell::with_default_callbacks()),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string of the chart endpoints
#[derive(Debug, Deserialize)]
pub struct ChartParams {
    /// Comma-separated theme names
    #[serde(default)]
    pub themes: String,
    /// Repeated `theme=` values, collected from the raw query pairs
    #[serde(skip)]
    pub theme: Vec<String>,
    #[serde(default = "default_x")]
    pub x: String,
    #[serde(default = "default_y")]
    pub y: String,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

fn default_x() -> String {
    Selection::default().x
}

fn default_y() -> String {
    Selection::default().y
}

impl ChartParams {
    /// Take every repeated `theme` pair from the raw query
    pub fn with_repeated_themes(mut self, pairs: Vec<(String, String)>) -> Self {
        self.theme
            .extend(pairs.into_iter().filter(|(key, _)| key == "theme").map(|(_, value)| value));
        self
    }

    pub fn selection(&self) -> Selection {
        let themes: Vec<&str> = self
            .themes
            .split(',')
            .chain(self.theme.iter().map(String::as_str))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        Selection::new(themes, &self.x, &self.y)
    }

    pub fn render_options(&self) -> Result<RenderOptions, DashboardError> {
        let defaults = RenderOptions::default();
        let options = RenderOptions {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            format: self.format.clone(),
            title: None,
        };
        options.validate()?;
        Ok(options)
    }
}

/// Successful API response
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
        })
    }
}

/// Error API response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: String,
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub records: usize,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Error type for API responses
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<DashboardError> for ApiErrorResponse {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::InvalidField(_) | DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::DataUnavailable(_)
            | DashboardError::ConfigurationError(_)
            | DashboardError::RenderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiErrorResponse {
            status,
            error: ApiError {
                status: "error".to_string(),
                error: ErrorDetails {
                    message: err.to_string(),
                    error_type: err.kind().to_string(),
                },
            },
        }
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET / - Page shell
async fn page_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.ctx))
}

/// POST /_update - Run subscribed callbacks
async fn update_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiErrorResponse> {
    info!("Update triggered by {:?}", request.changed);
    let response = state.shell.dispatch(&state.ctx, &request)?;
    Ok(Json(response))
}

/// GET /api/v1/chart - Chart specification
async fn chart_handler(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ApiSuccess<ChartSpec>>, ApiErrorResponse> {
    let params = params.with_repeated_themes(pairs);
    let spec = state.ctx.query(&params.selection())?;
    info!("Chart query returned {} points", spec.points.len());
    Ok(ApiSuccess::new(spec))
}

/// GET /api/v1/chart/image - Rendered chart
async fn chart_image_handler(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiErrorResponse> {
    let params = params.with_repeated_themes(pairs);
    let options = params.render_options()?;
    let spec = state.ctx.query(&params.selection())?;
    let bytes = render_chart(&spec, &state.ctx.colors, &options)
        .map_err(|e| DashboardError::RenderError(format!("{:#}", e)))?;

    let content_type = match options.format {
        OutputFormat::Png => "image/png",
        OutputFormat::Svg => "image/svg+xml",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// GET /api/v1/ppp - Price per part summary
async fn ppp_handler(State(state): State<AppState>) -> Json<ApiSuccess<Vec<PppSummary>>> {
    ApiSuccess::new(ppp_by_year_and_theme(&state.ctx.dataset))
}

/// GET /api/v1/health - Health check
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        records: state.ctx.dataset.len(),
    })
}

// ============================================================================
// Main Server
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/index", get(page_handler))
        .route("/_update", post(update_handler))
        .route("/api/v1/chart", get(chart_handler))
        .route("/api/v1/chart/image", get(chart_image_handler))
        .route("/api/v1/ppp", get(ppp_handler))
        .route("/api/v1/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(ctx: DashboardContext, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(AppState::new(ctx));

    info!("Starting dashboard on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
