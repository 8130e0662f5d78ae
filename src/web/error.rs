use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidRiotId(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PlayerNotFound { .. } => {
                (StatusCode::NOT_FOUND, "summoner not found".to_string())
            }
            other => {
                if other.is_remote() {
                    warn!(error = %other, "🌐 ⚠️ Riot API call failed");
                } else {
                    error!(error = ?other, "🌐 ❌ Request failed");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_riot_id_is_bad_request_with_its_message() {
        let response = AppError::InvalidRiotId("enter a summoner name".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await["error"], "enter a summoner name");
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let response = AppError::PlayerNotFound {
            game_name: "ghost".into(),
            tag_line: "000".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await["error"], "summoner not found");
    }

    #[tokio::test]
    async fn other_errors_are_internal() {
        let response = AppError::RateLimited { attempts: 6 }.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_of(response).await["error"].is_string());
    }
}
