use anyhow::{Context as _, Result};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{Actor, RequestContext};
use crate::demo::DemoSchema;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";
pub const USER_PERMISSIONS_HEADER: &str = "x-user-permissions";

#[derive(Clone)]
pub struct AppState {
    pub schema: DemoSchema,
}

pub fn create_app(schema: DemoSchema, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState { schema };

    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mutation-guard",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = request_context(&headers);
    tracing::debug!(user = ?request.user_id(), "GraphQL request received");
    let response = state.schema.execute(req.into_inner().data(request)).await;
    tracing::debug!("GraphQL request completed");
    response.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// Build the acting user from the identity headers set by an upstream
/// authentication proxy. Requests without a valid user id are anonymous.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    let Some(user_id) = header(USER_ID_HEADER).and_then(|id| id.trim().parse::<i32>().ok()) else {
        return RequestContext::anonymous();
    };

    let mut actor = Actor::user(user_id);
    for role in list(header(USER_ROLES_HEADER)) {
        actor = actor.with_role(role);
    }
    for scope in list(header(USER_PERMISSIONS_HEADER)) {
        actor = actor.with_scope(scope);
    }
    RequestContext::new(actor)
}

fn list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}
