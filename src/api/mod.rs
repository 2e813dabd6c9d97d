mod error;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

pub use error::{ApiError, ApiResult};

use crate::config::Config;
use crate::core::{
    AllocationBreakdown, DEFAULT_INITIAL_PRINCIPAL, RiskProfile, SimulationCache, SimulationPoint,
    SimulationSeries, TaxRule, default_horizon, simulate,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_RISK_PROFILE: RiskProfile = RiskProfile::High;

const MAX_HORIZON_YEARS: i32 = 100;
const EARLIEST_HORIZON_YEAR: i32 = 1900;
const LATEST_HORIZON_YEAR: i32 = 2200;
const MAX_INITIAL_PRINCIPAL: f64 = 1e12;

const PERFORMANCE_CAPTION: &str = "The 'Home Country' portfolio simulates the effect of a 12.5% \
long-term capital gains tax on annual gains above a set threshold, based on India's 2025 tax \
regulations. This is for illustrative purposes only.";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Nationality {
    Indian,
    Filipino,
    British,
    SouthAfrican,
}

impl Nationality {
    const ALL: [Nationality; 4] = [
        Nationality::Indian,
        Nationality::Filipino,
        Nationality::British,
        Nationality::SouthAfrican,
    ];

    fn label(self) -> &'static str {
        match self {
            Nationality::Indian => "Indian",
            Nationality::Filipino => "Filipino",
            Nationality::British => "British",
            Nationality::SouthAfrican => "South African",
        }
    }

    /// Only the Indian LTCG regime is modeled.
    fn is_supported(self) -> bool {
        matches!(self, Nationality::Indian)
    }

    fn parse(raw: &str) -> ApiResult<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        let key = key.strip_suffix(" (coming soon)").unwrap_or(&key);
        match key {
            "indian" | "india" => Ok(Nationality::Indian),
            "filipino" | "philippines" => Ok(Nationality::Filipino),
            "british" | "uk" => Ok(Nationality::British),
            "south african" | "southafrican" => Ok(Nationality::SouthAfrican),
            _ => Err(ApiError::BadRequest(format!("unknown nationality '{raw}'"))),
        }
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    cache: Arc<SimulationCache>,
}

impl AppState {
    pub fn new(cache: Arc<SimulationCache>) -> Self {
        Self { cache }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfileQuery {
    risk_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DashboardQuery {
    nationality: Option<String>,
    risk_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    risk_profile: Option<String>,
    horizon_start: Option<NaiveDate>,
    horizon_end: Option<NaiveDate>,
    initial_principal: Option<f64>,
    tax_rate: Option<f64>,
    exemption_local: Option<f64>,
    fx_rate: Option<f64>,
}

#[derive(Debug)]
struct SimulationRequest {
    risk_profile: RiskProfile,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    initial_principal: f64,
    tax_rule: TaxRule,
}

impl SimulationRequest {
    /// True when only the risk profile differs from the dashboard scenario.
    fn uses_dashboard_defaults(&self) -> bool {
        let defaults = default_simulation_request();
        self.horizon_start == defaults.horizon_start
            && self.horizon_end == defaults.horizon_end
            && self.initial_principal.to_bits() == defaults.initial_principal.to_bits()
            && self.tax_rule == defaults.tax_rule
    }

    fn check_bounds(&self) -> ApiResult<()> {
        for date in [self.horizon_start, self.horizon_end] {
            if !(EARLIEST_HORIZON_YEAR..=LATEST_HORIZON_YEAR).contains(&date.year()) {
                return Err(ApiError::BadRequest(format!(
                    "horizon dates must fall between {EARLIEST_HORIZON_YEAR} and \
                     {LATEST_HORIZON_YEAR}, got {date}"
                )));
            }
        }
        if self.horizon_end.year() - self.horizon_start.year() > MAX_HORIZON_YEARS {
            return Err(ApiError::BadRequest(format!(
                "horizon may span at most {MAX_HORIZON_YEARS} years"
            )));
        }
        if self.initial_principal > MAX_INITIAL_PRINCIPAL {
            return Err(ApiError::BadRequest(format!(
                "initial principal may not exceed {MAX_INITIAL_PRINCIPAL}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileInfo {
    id: RiskProfile,
    label: &'static str,
    return_mean: f64,
    return_vol: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NationalityInfo {
    id: Nationality,
    label: &'static str,
    supported: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfilesResponse {
    default_risk_profile: RiskProfile,
    risk_profiles: Vec<ProfileInfo>,
    nationalities: Vec<NationalityInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    risk_profile: RiskProfile,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    initial_principal: f64,
    tax_rule: TaxRule,
    exemption_in_sim_currency: f64,
    final_sheltered_value: f64,
    final_taxed_value: f64,
    tax_drag: f64,
    total_tax_paid: f64,
    points: Vec<SimulationPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    nationality: Nationality,
    risk_label: &'static str,
    allocation: AllocationBreakdown,
    simulation: SimulateResponse,
    caption: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/profiles", get(profiles_handler))
        .route("/api/allocation", get(allocation_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/dashboard", get(dashboard_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: &Config) -> std::io::Result<()> {
    let addr = config.listen_addr;
    let app = router(AppState::new(Arc::new(SimulationCache::new())));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HorizonOne dashboard listening");
    info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn profiles_handler() -> Response {
    let body = ProfilesResponse {
        default_risk_profile: DEFAULT_RISK_PROFILE,
        risk_profiles: RiskProfile::ALL
            .iter()
            .map(|&p| ProfileInfo {
                id: p,
                label: p.label(),
                return_mean: p.return_mean(),
                return_vol: p.return_vol(),
            })
            .collect(),
        nationalities: Nationality::ALL
            .iter()
            .map(|&n| NationalityInfo {
                id: n,
                label: n.label(),
                supported: n.is_supported(),
            })
            .collect(),
    };
    json_response(body)
}

async fn allocation_handler(Query(query): Query<ProfileQuery>) -> ApiResult<Response> {
    let risk_profile = parse_risk_profile(query.risk_profile.as_deref())?;
    Ok(json_response(AllocationBreakdown::for_profile(risk_profile)))
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<SimulatePayload>,
) -> ApiResult<Response> {
    simulate_handler_impl(&state, payload)
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> ApiResult<Response> {
    simulate_handler_impl(&state, payload)
}

fn simulate_handler_impl(state: &AppState, payload: SimulatePayload) -> ApiResult<Response> {
    let request = simulation_request_from_payload(payload)?;
    let response = run_simulation(state, &request)?;
    Ok(json_response(response))
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Response> {
    let nationality = match query.nationality.as_deref() {
        Some(raw) => Nationality::parse(raw)?,
        None => Nationality::Indian,
    };
    if !nationality.is_supported() {
        return Err(ApiError::UnsupportedNationality(
            nationality.label().to_string(),
        ));
    }

    let risk_profile = parse_risk_profile(query.risk_profile.as_deref())?;
    let request = SimulationRequest {
        risk_profile,
        ..default_simulation_request()
    };
    let simulation = run_simulation(&state, &request)?;

    Ok(json_response(DashboardResponse {
        nationality,
        risk_label: risk_profile.label(),
        allocation: AllocationBreakdown::for_profile(risk_profile),
        simulation,
        caption: PERFORMANCE_CAPTION,
    }))
}

fn parse_risk_profile(raw: Option<&str>) -> ApiResult<RiskProfile> {
    match raw {
        Some(raw) => Ok(raw.parse::<RiskProfile>()?),
        None => Ok(DEFAULT_RISK_PROFILE),
    }
}

fn default_simulation_request() -> SimulationRequest {
    let (horizon_start, horizon_end) = default_horizon();
    SimulationRequest {
        risk_profile: DEFAULT_RISK_PROFILE,
        horizon_start,
        horizon_end,
        initial_principal: DEFAULT_INITIAL_PRINCIPAL,
        tax_rule: TaxRule::india_ltcg(),
    }
}

fn simulation_request_from_payload(payload: SimulatePayload) -> ApiResult<SimulationRequest> {
    let mut request = default_simulation_request();
    request.risk_profile = parse_risk_profile(payload.risk_profile.as_deref())?;

    if let Some(v) = payload.horizon_start {
        request.horizon_start = v;
    }
    if let Some(v) = payload.horizon_end {
        request.horizon_end = v;
    }
    if let Some(v) = payload.initial_principal {
        request.initial_principal = v;
    }
    if let Some(v) = payload.tax_rate {
        request.tax_rule.rate = v;
    }
    if let Some(v) = payload.exemption_local {
        request.tax_rule.exemption_local_currency = v;
    }
    if let Some(v) = payload.fx_rate {
        request.tax_rule.fx_rate_to_sim_currency = v;
    }

    request.check_bounds()?;
    Ok(request)
}

fn run_simulation(state: &AppState, request: &SimulationRequest) -> ApiResult<SimulateResponse> {
    debug!(profile = %request.risk_profile, "simulation requested");
    // Only the dashboard scenario is memoized; custom inputs are one-off.
    let series = if request.uses_dashboard_defaults() {
        state.cache.get_or_simulate(
            request.risk_profile,
            request.horizon_start,
            request.horizon_end,
            request.initial_principal,
            &request.tax_rule,
        )?
    } else {
        Arc::new(simulate(
            request.risk_profile,
            request.horizon_start,
            request.horizon_end,
            request.initial_principal,
            &request.tax_rule,
        )?)
    };
    Ok(build_simulate_response(request, &series))
}

fn build_simulate_response(
    request: &SimulationRequest,
    series: &SimulationSeries,
) -> SimulateResponse {
    let (final_sheltered_value, final_taxed_value) = series
        .final_point()
        .map(|p| (p.sheltered_value, p.taxed_value))
        .unwrap_or((request.initial_principal, request.initial_principal));

    SimulateResponse {
        risk_profile: series.risk_profile,
        horizon_start: request.horizon_start,
        horizon_end: request.horizon_end,
        initial_principal: request.initial_principal,
        tax_rule: request.tax_rule,
        exemption_in_sim_currency: request.tax_rule.exemption_in_sim_currency(),
        final_sheltered_value,
        final_taxed_value,
        tax_drag: series.tax_drag(),
        total_tax_paid: series.total_tax_paid(),
        points: series.points.clone(),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(body: T) -> Response {
    with_cache_control(Json(body))
}
