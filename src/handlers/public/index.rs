// handlers/public/index.rs - GET /api

use serde_json::Value;

use crate::middleware::ApiResponse;

pub async fn api_index() -> ApiResponse<Value> {
    ApiResponse::message("Welcome to the plot device.")
}
