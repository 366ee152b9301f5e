use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::consistency::{ConsistencyChecker, ConsistencyReport};
use super::domain::{DiscountQuery, DiscountRequest, DiscountResponse};
use super::DiscountStrategy;
use crate::error::AppError;

/// Bearer credential callers must present.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into().trim()))
    }

    fn matches(&self, presented: &str) -> bool {
        presented.trim() == &*self.0
    }
}

/// Router builder exposing the calculation and diagnostic endpoints.
pub fn discount_router<S>(checker: Arc<ConsistencyChecker<S>>, api_key: ApiKey) -> Router
where
    S: DiscountStrategy + 'static,
{
    Router::new()
        .route("/discount/calculate", post(calculate_handler::<S>))
        .route("/discount/validate", post(validate_handler::<S>))
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key))
        .with_state(checker)
}

pub(crate) async fn calculate_handler<S>(
    State(checker): State<Arc<ConsistencyChecker<S>>>,
    Json(request): Json<DiscountRequest>,
) -> Result<Json<DiscountResponse>, AppError>
where
    S: DiscountStrategy + 'static,
{
    let query = DiscountQuery::try_from(request)?;
    let decision = checker.primary().decide(&query).await;
    Ok(Json(DiscountResponse::from(&decision)))
}

pub(crate) async fn validate_handler<S>(
    State(checker): State<Arc<ConsistencyChecker<S>>>,
    Json(request): Json<DiscountRequest>,
) -> Result<Json<ConsistencyReport>, AppError>
where
    S: DiscountStrategy + 'static,
{
    let query = DiscountQuery::try_from(request)?;
    Ok(Json(checker.check(&query).await))
}

pub(crate) async fn require_api_key(
    State(api_key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, credentials)| credentials.trim())
        .filter(|credentials| !credentials.is_empty());

    let rejection = match presented {
        None => Some("API key is required"),
        Some(credentials) if !api_key.matches(credentials) => Some("Invalid API key"),
        Some(_) => None,
    };

    match rejection {
        Some(detail) => unauthorized(detail),
        None => next.run(request).await,
    }
}

fn unauthorized(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "detail": detail })),
    )
        .into_response()
}
