//! Tests for the forecast client
//!
//! These run the client against a local mock metrics endpoint, so no
//! real edge node is needed.

use super::*;
use crate::error::ScoringError;
use crate::models::NodeTarget;
use mockito::{Mock, Server};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const HEALTHY_BODY: &str =
    r#"{"cpu":{"current":0.15,"future":0.2},"mem":{"current":0.25,"future":0.3}}"#;

/// Helper to point a target at the mock server
fn target_for(server: &Server, node_name: &str) -> NodeTarget {
    let host_port = server.host_with_port();
    let (ip, port) = host_port
        .rsplit_once(':')
        .expect("mock server address has a port");
    NodeTarget::new(node_name, ip, port)
}

/// Metrics endpoint that holds the body back for `delay`
async fn slow_endpoint(server: &mut Server, delay: Duration) -> Mock {
    server
        .mock("GET", "/metrics")
        .with_status(200)
        .with_chunked_body(move |w| {
            std::thread::sleep(delay);
            w.write_all(HEALTHY_BODY.as_bytes())
        })
        .create_async()
        .await
}

mod http_client_tests {
    use super::*;

    #[tokio::test]
    async fn test_fetches_and_decodes_forecast() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(HEALTHY_BODY)
            .expect(1)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let forecast = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(forecast.cpu_current, 0.15);
        assert_eq!(forecast.cpu_future, 0.2);
        assert_eq!(forecast.mem_current, 0.25);
        assert_eq!(forecast.mem_future, 0.3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_each_call_is_a_fresh_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(HEALTHY_BODY)
            .expect(2)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let cancel = CancellationToken::new();
        client.fetch_forecast("edge-1", &cancel).await.unwrap();
        client.fetch_forecast("edge-1", &cancel).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_node_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(HEALTHY_BODY)
            .expect(0)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let result = client
            .fetch_forecast("edge-2", &CancellationToken::new())
            .await;

        match result {
            Err(ScoringError::UnknownNode(node)) => assert_eq!(node, "edge-2"),
            other => panic!("expected UnknownNode, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/metrics")
            .with_status(503)
            .with_body("forecaster warming up")
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        match result {
            Err(ScoringError::Transport { node, message }) => {
                assert_eq!(node, "edge-1");
                assert!(message.contains("503"), "message was {}", message);
            }
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(r#"{"cpu":{"current":0.1,"future":0.2}}"#)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_non_numeric_field_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(r#"{"cpu":{"current":"high","future":0.2},"mem":{"current":0.1,"future":0.2}}"#)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body("# HELP node_cpu_seconds_total")
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 1
        let target = NodeTarget::new("edge-1", "127.0.0.1", "1");
        let client = ForecastClient::new(
            &[target],
            ForecastClientConfig {
                request_timeout: Duration::from_millis(500),
                connect_timeout: Duration::from_millis(200),
            },
        )
        .unwrap();

        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let mut server = Server::new_async().await;
        let _mock = slow_endpoint(&mut server, Duration::from_secs(3)).await;

        let client = ForecastClient::new(
            &[target_for(&server, "edge-1")],
            ForecastClientConfig {
                request_timeout: Duration::from_millis(300),
                connect_timeout: Duration::from_millis(200),
            },
        )
        .unwrap();

        let start = Instant::now();
        let result = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        match result {
            Err(ScoringError::Transport { node, message }) => {
                assert_eq!(node, "edge-1");
                assert!(message.contains("timed out"), "message was {}", message);
            }
            other => panic!("expected Transport, got {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancelled_during_request() {
        let mut server = Server::new_async().await;
        let _mock = slow_endpoint(&mut server, Duration::from_secs(3)).await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = client.fetch_forecast("edge-1", &cancel).await;

        match result {
            Err(ScoringError::Cancelled(node)) => assert_eq!(node, "edge-1"),
            other => panic!("expected Cancelled, got {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(HEALTHY_BODY)
            .expect(0)
            .create_async()
            .await;

        let client = ForecastClient::with_defaults(&[target_for(&server, "edge-1")]).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.fetch_forecast("edge-1", &cancel).await;

        assert!(matches!(result, Err(ScoringError::Cancelled(_))));
        mock.assert_async().await;
    }

    #[test]
    fn test_invalid_target_rejected() {
        let target = NodeTarget::new("edge-1", "10.0.0.1", "not-a-port");
        let result = ForecastClient::with_defaults(&[target]);

        assert!(matches!(result, Err(ScoringError::InvalidTarget { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_targets_keep_last() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(HEALTHY_BODY)
            .expect(1)
            .create_async()
            .await;

        // The first entry points at a port nothing listens on
        let targets = [
            NodeTarget::new("edge-1", "127.0.0.1", "1"),
            target_for(&server, "edge-1"),
        ];
        let client = ForecastClient::with_defaults(&targets).unwrap();
        assert_eq!(client.target_count(), 1);

        let forecast = client
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(forecast.cpu_future, 0.2);
        mock.assert_async().await;
    }
}

mod static_source_tests {
    use super::*;
    use crate::models::ResourceForecast;

    fn forecast() -> ResourceForecast {
        ResourceForecast {
            cpu_current: 0.1,
            cpu_future: 0.2,
            mem_current: 0.3,
            mem_future: 0.4,
        }
    }

    #[tokio::test]
    async fn test_returns_configured_forecast() {
        let source = StaticForecastSource::new().with_forecast("edge-1", forecast());
        let result = source
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, forecast());
    }

    #[tokio::test]
    async fn test_unknown_node() {
        let source = StaticForecastSource::new();
        let result = source
            .fetch_forecast("edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::UnknownNode(_))));
    }
}
