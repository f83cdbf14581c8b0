#[cfg(test)]
mod tests {
    use crate::error::{AppError, AppResult, OptionExt};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::io;

    async fn body_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::InvalidArgument("page must be >= 1".to_string());
        assert_eq!(format!("{}", error), "Invalid argument: page must be >= 1");

        let error = AppError::NotFound("log file x.log does not exist".to_string());
        assert_eq!(format!("{}", error), "Not found: log file x.log does not exist");

        let error = AppError::Load { module: "v1/demo.rs".into(), message: "boom".into() };
        assert_eq!(format!("{}", error), "Failed to load route module v1/demo.rs: boom");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidArgument("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Io("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let (status, body) = body_json(AppError::NotFound("missing".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
        assert_eq!(body["message"], "missing");
        assert!(body["data"].is_null());
        assert!(!body["request_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
        assert!(!body["message"].as_str().unwrap().contains("secret"));
        assert!(body["data"]["error_id"].is_string());
    }

    #[test]
    fn test_from_io_error() {
        let app_error: AppError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(app_error, AppError::NotFound(_)));

        let app_error: AppError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        match app_error {
            AppError::Io(msg) => {
                assert!(msg.contains("permission denied"));
                assert!(msg.contains("denied"));
            }
            other => panic!("Expected Io variant, got {:?}", other),
        }
    }

    #[test]
    fn test_option_ext() {
        let result: AppResult<i32> = Some(42).ok_or_not_found("answer");
        assert_eq!(result.unwrap(), 42);

        let result: AppResult<i32> = None.ok_or_not_found("log file");
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "log file not found"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
