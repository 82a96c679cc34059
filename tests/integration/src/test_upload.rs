//! End-to-end upload tests: presign, then PUT straight to the object store.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{bucket_name, ensure_bucket, http_client, presign, s3_client, test_user_id};

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

    #[tokio::test]
    #[ignore = "requires running server and object store"]
    async fn test_should_upload_through_presigned_url() {
        let s3 = s3_client();
        ensure_bucket(&s3).await;
        let http = http_client();
        let user = test_user_id("upload");

        let (status, body) = presign(
            &http,
            Some(&user),
            &json!({
                "fileName": "cat.png",
                "contentType": "image/png",
                "size": PNG_BYTES.len(),
                "key": "avatars/",
            }),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::OK);
        let key = body["key"].as_str().unwrap().to_owned();
        assert!(key.starts_with(&format!("{user}/avatars/")));

        let put = http
            .put(body["uploadUrl"].as_str().unwrap())
            .header("content-type", body["headers"]["Content-Type"].as_str().unwrap())
            .body(PNG_BYTES.to_vec())
            .send()
            .await
            .expect("presigned PUT");
        assert!(put.status().is_success(), "PUT failed: {}", put.status());

        let head = s3
            .head_object()
            .bucket(bucket_name())
            .key(&key)
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_length(), i64::try_from(PNG_BYTES.len()).ok());
        assert_eq!(head.content_type(), Some("image/png"));

        let _ = s3.delete_object().bucket(bucket_name()).key(&key).send().await;
    }

    #[tokio::test]
    #[ignore = "requires running server and object store"]
    async fn test_should_reject_put_with_different_content_type() {
        let s3 = s3_client();
        ensure_bucket(&s3).await;
        let http = http_client();

        let (status, body) = presign(
            &http,
            Some(&test_user_id("mismatch")),
            &json!({"fileName": "cat.png", "contentType": "image/png", "size": PNG_BYTES.len()}),
        )
        .await;
        assert_eq!(status, reqwest::StatusCode::OK);

        let put = http
            .put(body["uploadUrl"].as_str().unwrap())
            .header("content-type", "image/jpeg")
            .body(PNG_BYTES.to_vec())
            .send()
            .await
            .expect("presigned PUT");
        assert_eq!(put.status(), reqwest::StatusCode::FORBIDDEN);
    }
}
