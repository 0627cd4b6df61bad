//! JSON envelopes shared by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `{"success": false, "message": message}`
pub fn failure_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// `{"success": true, "message": message}` merged with the fields of `extra`.
pub fn success_response(status: StatusCode, message: &str, extra: Value) -> Response {
    let mut body = json!({ "success": true, "message": message });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_merges_extra_fields() {
        let response = success_response(StatusCode::CREATED, "Created", json!({ "id": 7 }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "message": "Created", "id": 7 })
        );
    }

    #[tokio::test]
    async fn failure_and_error_shapes() {
        let response = failure_response(StatusCode::CONFLICT, "Taken");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "message": "Taken" })
        );

        let response = error_response(StatusCode::NOT_FOUND, "Song not found");
        assert_eq!(body_json(response).await, json!({ "error": "Song not found" }));
    }
}
