use serde::{ Serialize, Deserialize };
use utoipa::{ IntoParams, ToSchema };
use crate::history::ConversationId;

/// Body of `POST /chat`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Conversation to continue. A new id is issued when omitted.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub conversation_id: Option<ConversationId>,
    /// Text sent to the model. Must not be empty.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    #[schema(value_type = i64)]
    pub conversation_id: ConversationId,
    pub response: String,
}

/// Query string of `GET /log`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    /// Conversation whose turns are returned.
    #[serde(default)]
    #[param(value_type = Option<i64>)]
    pub conversation_id: Option<ConversationId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogResponse {
    #[schema(value_type = i64)]
    pub conversation_id: ConversationId,
    /// Turns in the order they were recorded, each `"<label>: <text>"`.
    pub log: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
