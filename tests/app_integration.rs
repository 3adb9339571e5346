use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

use fxcast::AppCommand;
use fxcast::cli::convert::ConvertArgs;
use fxcast::cli::predict::PredictArgs;
use fxcast::core::config::DashboardConfig;
use fxcast::core::session::AuthError;
use fxcast::providers::HttpMarketDataClient;
use fxcast::view::DashboardController;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount_json(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    /// A server answering every endpoint for USD/AUD.
    pub async fn create_market_server() -> MockServer {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/api/v1/exchange-rate",
            200,
            r#"{"rate": 1.52, "timestamp": "2025-03-10T12:00:00Z"}"#,
        )
        .await;
        mount_json(
            &server,
            "/api/v1/exchange-rate/history",
            200,
            r#"{"rates": [
                {"timestamp": "2025-03-08T00:00:00Z", "rate": 1.50},
                {"timestamp": "2025-03-09T00:00:00Z", "rate": 1.53}
            ]}"#,
        )
        .await;
        mount_json(
            &server,
            "/api/v1/news",
            200,
            r#"{"articles": [{"title": "RBA holds rates", "source": "Wire", "publishedAt": "2025-03-10T08:00:00Z"}]}"#,
        )
        .await;
        mount_json(
            &server,
            "/api/v1/predictions/USD/AUD",
            200,
            r#"{
                "currentRate": 1.52,
                "confidenceScore": "81.5",
                "modelUsed": "arima",
                "predictionValues": [
                    {"timestamp": "2025-03-11T00:00:00Z", "mean": 1.53, "lower_bound": 1.51, "upper_bound": 1.55}
                ],
                "backtestValues": [
                    {"timestamp": "2025-03-09T00:00:00Z", "mean": 1.51, "lower_bound": 1.50, "upper_bound": 1.52}
                ]
            }"#,
        )
        .await;
        mount_json(
            &server,
            "/api/v1/analytics/volatility/USD/AUD",
            200,
            r#"{"volatilityLevel": "HIGH", "currentVolatility": 12.1, "averageVolatility": 9.4, "trend": "INCREASING"}"#,
        )
        .await;
        mount_json(
            &server,
            "/api/v1/analytics/anomalies/USD/AUD",
            200,
            r#"{"analysisPeriodDays": 90, "anomalyCount": 0, "anomalyPoints": []}"#,
        )
        .await;
        server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let content = format!(
            r#"
api:
  base_url: "{}"
dashboard:
  base: "USD"
  target: "AUD"
  amount: 200
predictions:
  base: "USD"
  target: "AUD"
data_path: "{}"
"#,
            base_url,
            dir.join("data").display()
        );
        std::fs::write(&config_path, content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_convert_flow_with_mock() {
    let server = test_utils::create_market_server().await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());

    let result = fxcast::run_command(
        AppCommand::Convert(ConvertArgs {
            amount: Some("50".to_string()),
            ..ConvertArgs::default()
        }),
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_predict_flow_survives_failing_panel() {
    let server = test_utils::create_market_server().await;
    test_utils::mount_json(
        &server,
        "/api/v1/analytics/correlation/USD/AUD",
        500,
        "Internal Server Error",
    )
    .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());

    let result = fxcast::run_command(
        AppCommand::Predict(PredictArgs {
            analysis: true,
            ..PredictArgs::default()
        }),
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Predict failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_unknown_currency_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:1");

    let result = fxcast::run_command(
        AppCommand::Convert(ConvertArgs {
            target: Some("QQQ".to_string()),
            ..ConvertArgs::default()
        }),
        config_path.to_str(),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Unknown currency: QQQ"));
}

#[test_log::test(tokio::test)]
async fn test_session_persists_across_commands() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:1");
    let config = config_path.to_str();

    let err = fxcast::run_command(AppCommand::Account, config)
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<AuthError>(),
        Some(&AuthError::NotAuthenticated)
    );

    let wrong = fxcast::run_command(
        AppCommand::Login {
            email: "ada@example.com".to_string(),
            password: Some("hunter22".to_string()),
        },
        config,
    )
    .await;
    assert!(wrong.is_err());

    fxcast::run_command(
        AppCommand::Login {
            email: "ada@example.com".to_string(),
            password: Some("password".to_string()),
        },
        config,
    )
    .await
    .unwrap();
    info!("Logged in, checking guarded commands");

    fxcast::run_command(AppCommand::Account, config).await.unwrap();
    fxcast::run_command(AppCommand::Subscriptions, config)
        .await
        .unwrap();

    fxcast::run_command(AppCommand::Logout, config).await.unwrap();
    assert!(
        fxcast::run_command(AppCommand::Subscriptions, config)
            .await
            .is_err()
    );
}

#[test_log::test(tokio::test)]
async fn test_signup_rejects_mismatched_passwords() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:1");

    let err = fxcast::run_command(
        AppCommand::Signup {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password: Some("password1".to_string()),
            confirm_password: Some("password2".to_string()),
        },
        config_path.to_str(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Passwords do not match");
}

#[test_log::test(tokio::test)]
async fn test_static_commands() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:1");
    let config = config_path.to_str();

    fxcast::run_command(
        AppCommand::Currencies {
            query: Some("dollar".to_string()),
        },
        config,
    )
    .await
    .unwrap();
    fxcast::run_command(
        AppCommand::Pricing {
            predictions: Some(5_000),
            annual: true,
        },
        config,
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_dashboard_over_http() {
    let server = test_utils::create_market_server().await;
    let client = Arc::new(HttpMarketDataClient::new(&server.uri()).unwrap());

    let dashboard = DashboardController::mount(client, &DashboardConfig::default());
    dashboard.settle().await;

    let conversion = dashboard.conversion().expect("conversion available");
    assert_eq!(conversion.rate, 1.52);
    assert_eq!(conversion.converted, 1520.0);
    let news = dashboard.news().data.unwrap();
    assert_eq!(news[0].title, "RBA holds rates");
    let range = dashboard.history_range().expect("history loaded");
    assert_eq!(range.low, 1.50);
    assert_eq!(range.high, 1.53);
}

#[test_log::test(tokio::test)]
async fn test_alerts_across_commands() {
    let server = test_utils::create_market_server().await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());
    let config = config_path.to_str();
    let add = |email: Option<&str>| AppCommand::AlertAdd {
        base: None,
        target: None,
        threshold: 1.6,
        email: email.map(str::to_string),
    };

    let anonymous = fxcast::run_command(add(None), config).await;
    assert!(anonymous.is_err());

    fxcast::run_command(add(Some("ada@example.com")), config)
        .await
        .unwrap();
    fxcast::run_command(AppCommand::AlertList, config)
        .await
        .unwrap();
    fxcast::run_command(AppCommand::Convert(ConvertArgs::default()), config)
        .await
        .unwrap();

    fxcast::run_command(AppCommand::AlertRemove { number: 1 }, config)
        .await
        .unwrap();
    let err = fxcast::run_command(AppCommand::AlertRemove { number: 1 }, config)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No alert number 1");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = fxcast::core::config::AppConfig::load_from_path(&missing).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
