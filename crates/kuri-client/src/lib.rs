//! Kuri client - send yourself Telegram messages from scripts.

mod client;
mod error;

pub use client::{KuriClient, DEFAULT_API_ROOT};
pub use error::ClientError;

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> KuriClient {
        KuriClient::new(&mock_server.uri(), "secret-token").unwrap()
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/message"))
            .and(query_param("token", "secret-token"))
            .and(query_param("message", "build #12 passed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.send_message("build #12 passed").await.unwrap());
    }

    #[tokio::test]
    async fn test_server_reports_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/message"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.send_message("hi").await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_status_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/message"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "Message too long (max 100 characters)",
                "code": "MESSAGE_TOO_LONG"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.send_message(&"a".repeat(101)).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_json_body_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/message"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.send_message("hi").await.unwrap());
    }

    #[tokio::test]
    async fn test_root_with_path_prefix() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/message"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&mock_server)
            .await;

        let client = KuriClient::new(&format!("{}/api", mock_server.uri()), "t").unwrap();
        assert_eq!(client.api_root(), format!("{}/api/", mock_server.uri()));
        assert!(client.send_message("hi").await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let client = KuriClient::new("http://127.0.0.1:1", "t").unwrap();
        let result = client.send_message("hi").await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }

    #[tokio::test]
    async fn test_error_does_not_leak_token() {
        let client = KuriClient::new("http://127.0.0.1:1/", "SECRET-TOKEN-XYZ").unwrap();

        let err = client.send_message("hi").await.unwrap_err();

        assert!(!err.to_string().contains("SECRET-TOKEN-XYZ"));
        assert!(!format!("{:?}", err).contains("SECRET-TOKEN-XYZ"));
    }
}
