use crate::agent::ChatAgent;
use crate::models::chat::{ ChatRequest, ChatResponse, ErrorResponse, LogQuery, LogResponse };
use super::error::ApiError;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ State, Query },
    extract::rejection::{ JsonRejection, QueryRejection },
};
use tower_http::cors::{ Any, CorsLayer };
use utoipa::OpenApi;
use log::{ info, warn };

#[derive(OpenApi)]
#[openapi(
    info(title = "Chat API", version = "1.0.0"),
    paths(chat_handler, log_handler),
    components(schemas(ChatRequest, ChatResponse, LogResponse, ErrorResponse)),
    tags(
        (name = "chat", description = "Talking to the model"),
        (name = "log", description = "Reading conversation logs")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub agent: ChatAgent,
}

pub fn create_router(agent: ChatAgent) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/log", get(log_handler))
        .route("/openapi.json", get(openapi_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

/// Send a prompt to the model and get its reply.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Model reply", body = ChatResponse),
        (status = 400, description = "Missing prompt or malformed body", body = ErrorResponse),
        (status = 500, description = "Store or model failure", body = ErrorResponse)
    )
)]
async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body.map_err(|e| {
        warn!("Rejected /chat body: {}", e.body_text());
        ApiError::BadRequest(e.body_text())
    })?;
    info!("POST /chat conversation_id={:?}", req.conversation_id);

    let resp = state.agent.chat(req).await?;
    Ok(Json(resp))
}

/// Fetch the turns of one conversation.
#[utoipa::path(
    get,
    path = "/log",
    tag = "log",
    params(LogQuery),
    responses(
        (status = 200, description = "Conversation turns", body = LogResponse),
        (status = 400, description = "Missing id or unknown conversation", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
async fn log_handler(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<LogResponse>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!("Rejected /log query: {}", e.body_text());
        ApiError::BadRequest(e.body_text())
    })?;
    info!("GET /log conversation_id={:?}", query.conversation_id);

    let resp = state.agent.log(query).await?;
    Ok(Json(resp))
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
