//! Presign endpoint contract integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{http_client, presign, test_user_id};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_issue_namespaced_key() {
        let user = test_user_id("presign");
        let (status, body) = presign(
            &http_client(),
            Some(&user),
            &json!({"fileName": "cat.png", "contentType": "image/png", "size": 1024}),
        )
        .await;

        assert_eq!(status, reqwest::StatusCode::OK);
        let key = body["key"].as_str().unwrap();
        assert!(key.starts_with(&format!("{user}/")));
        assert!(key.ends_with(".png"));
        assert_eq!(body["method"], "PUT");
        assert_eq!(body["headers"]["Content-Type"], "image/png");
        assert!(
            body["uploadUrl"]
                .as_str()
                .unwrap()
                .contains("X-Amz-Signature=")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_require_identity() {
        let (status, body) = presign(
            &http_client(),
            None,
            &json!({"fileName": "cat.png", "contentType": "image/png", "size": 1024}),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsupported_media_type() {
        let (status, body) = presign(
            &http_client(),
            Some("integration"),
            &json!({"fileName": "doc.pdf", "contentType": "application/pdf", "size": 1024}),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["data"]["allowedMimeTypes"].is_array());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_oversized_upload() {
        let (status, body) = presign(
            &http_client(),
            Some("integration"),
            &json!({"fileName": "big.png", "contentType": "image/png", "size": u64::MAX / 2}),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["data"]["maxSizeBytes"].is_u64());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_traversal_key() {
        let (status, body) = presign(
            &http_client(),
            Some("integration"),
            &json!({
                "fileName": "cat.png",
                "contentType": "image/png",
                "size": 1,
                "key": "../other-user/cat.png",
            }),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert!(body["data"]["key"].is_array());
    }
}
