//! Health check and routing integration tests.

#[cfg(test)]
mod tests {
    use crate::{http_client, server_url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let resp = http_client()
            .get(format!("{}/health", server_url()))
            .send()
            .await
            .expect("health request");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers().get("server").unwrap(), "RustDrop");
        let body: serde_json::Value = resp.json().await.expect("health body");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_cors_preflight() {
        let resp = http_client()
            .request(
                reqwest::Method::OPTIONS,
                format!("{}/api/presign", server_url()),
            )
            .send()
            .await
            .expect("preflight request");

        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_unknown_path() {
        let resp = http_client()
            .get(format!("{}/nope", server_url()))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
