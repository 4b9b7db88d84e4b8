use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use learnhub::{ApiError, models::is_completed};

#[test]
fn completion_starts_at_ninety_five_percent() {
    assert!(!is_completed(94, 100));
    assert!(is_completed(95, 100));
    assert!(is_completed(100, 100));
    assert!(!is_completed(569, 600));
    assert!(is_completed(570, 600));
}

#[test]
fn zero_duration_counts_as_completed() {
    assert!(is_completed(0, 0));
}

#[tokio::test]
async fn authentication_required_is_401_json() {
    let response = ApiError::authentication_required().into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_code"], "authentication_required");
}

#[test]
fn not_found_carries_message() {
    let err = ApiError::not_found("Course not found");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.message, "Course not found");
}
