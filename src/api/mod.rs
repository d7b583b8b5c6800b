mod error;
mod payload;

use axum::{
    Router,
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use error::{ApiError, ApiResult};
pub use payload::{HouseholdPayload, build_household, coerce_number, parse_date};

use crate::core::{
    Cents, HouseholdYear, UserId, UserProjection, YearProjection, assemble, project_household,
    retirement_row,
};

#[derive(Parser, Debug)]
#[command(
    name = "glidepath",
    about = "Deterministic household retirement projections"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "info", help = "Log level for this crate")]
    pub log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON projection API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[command(flatten)]
        defaults: ProjectionDefaults,
    },
    /// Project a household file and print the result as JSON.
    Project {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, help = "Projection date (YYYY-MM-DD); defaults to the file's asOf or today")]
        as_of: Option<String>,
        #[arg(long)]
        pretty: bool,
        #[command(flatten)]
        defaults: ProjectionDefaults,
    },
}

/// Fallbacks applied when a request leaves a field out. Percent values are
/// whole percents (`4.0` is 4%).
#[derive(Args, Clone, Debug)]
pub struct ProjectionDefaults {
    #[arg(long = "default-retirement-age", default_value_t = 65)]
    pub retirement_age: u32,
    #[arg(long = "default-death-age", default_value_t = 90)]
    pub death_age: u32,
    #[arg(
        long = "default-inflation",
        default_value_t = 2.5,
        help = "Annual inflation percent"
    )]
    pub inflation_rate: f64,
    #[arg(
        long = "default-withdrawal-rate",
        default_value_t = 4.0,
        help = "Percent of the portfolio withdrawn each retired year"
    )]
    pub withdrawal_rate: f64,
    #[arg(
        long = "default-retirement-return",
        default_value_t = 5.0,
        help = "Return floor once the glide path reaches retirement"
    )]
    pub retirement_return_rate: f64,
    #[arg(long = "default-salary-increase", default_value_t = 3.0)]
    pub salary_increase: f64,
}

pub fn default_parameters_for_api() -> ProjectionDefaults {
    ProjectionDefaults {
        retirement_age: 65,
        death_age: 90,
        inflation_rate: 2.5,
        withdrawal_rate: 4.0,
        retirement_return_rate: 5.0,
        salary_increase: 3.0,
    }
}

impl Default for ProjectionDefaults {
    fn default() -> Self {
        default_parameters_for_api()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user: UserId,
    pub retirement_age: u32,
    pub degraded: bool,
    pub at_retirement: Option<YearProjection>,
    pub final_balance: Cents,
}

impl From<&UserProjection> for UserSummary {
    fn from(projection: &UserProjection) -> Self {
        Self {
            user: projection.user.clone(),
            retirement_age: projection.retirement_age,
            degraded: projection.degraded,
            at_retirement: retirement_row(projection).copied(),
            final_balance: projection
                .years
                .last()
                .map_or(Cents::ZERO, |row| row.total_balance),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    pub as_of: String,
    pub users: Vec<UserSummary>,
    pub projections: Vec<UserProjection>,
    pub series: BTreeMap<i16, HouseholdYear>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Runs a full household projection from a decoded payload.
pub fn project_payload(
    payload: HouseholdPayload,
    defaults: &ProjectionDefaults,
    as_of: Option<Date>,
) -> ApiResult<ProjectionResponse> {
    let household = build_household(payload, defaults, as_of)?;
    let projections = project_household(&household);
    info!(
        as_of = %household.as_of,
        users = projections.len(),
        "projected household"
    );

    Ok(ProjectionResponse {
        as_of: household.as_of.to_string(),
        users: projections.iter().map(UserSummary::from).collect(),
        series: assemble(&projections),
        projections,
    })
}

pub fn project_from_json(
    json: &str,
    defaults: &ProjectionDefaults,
    as_of: Option<Date>,
) -> ApiResult<ProjectionResponse> {
    let payload = serde_json::from_str::<HouseholdPayload>(json)?;
    project_payload(payload, defaults, as_of)
}

pub async fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port, defaults } => run_http_server(port, defaults)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Project {
            input,
            as_of,
            pretty,
            defaults,
        } => run_project_file(&input, as_of.as_deref(), pretty, &defaults),
    }
}

fn run_project_file(
    input: &Path,
    as_of: Option<&str>,
    pretty: bool,
    defaults: &ProjectionDefaults,
) -> Result<(), String> {
    let json = std::fs::read_to_string(input)
        .map_err(|e| format!("Cannot read {}: {e}", input.display()))?;
    let as_of = as_of
        .map(|raw| parse_date("--as-of", raw))
        .transpose()
        .map_err(|e| e.to_string())?;

    let response = project_from_json(&json, defaults, as_of).map_err(|e| e.to_string())?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|e| format!("Cannot render projection: {e}"))?;

    println!("{rendered}");
    Ok(())
}

pub async fn run_http_server(port: u16, defaults: ProjectionDefaults) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection API listening");

    axum::serve(listener, router(defaults)).await
}

fn router(defaults: ProjectionDefaults) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/project", post(project_handler))
        .fallback(not_found_handler)
        .with_state(Arc::new(defaults))
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        serde_json::json!({ "error": "Not found" }),
    )
}

// The body is taken as text so malformed JSON goes through ApiError rather
// than axum's plain-text rejection.
async fn project_handler(
    State(defaults): State<Arc<ProjectionDefaults>>,
    body: String,
) -> Response {
    match project_from_json(&body, &defaults, None) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => with_cache_control(err),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
