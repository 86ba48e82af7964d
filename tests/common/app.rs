use std::sync::Arc;

use axum::Router;
use tokio::sync::broadcast;

use hermes_backend::config::{Config, HermesEnvConfig, RateLimitConfig};
use hermes_backend::hermes::{HermesConfig, HermesEngine, SystemLoad};
use hermes_backend::routes::build_router;
use hermes_backend::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
}

// Config is built directly; set_var would race across parallel tests.
fn test_config(api_limit: u64) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: api_limit,
        },
        hermes: HermesEnvConfig::default(),
    }
}

fn spawn_with_config(config: Config) -> TestApp {
    let engine = Arc::new(HermesEngine::new(
        HermesConfig::from_env(&config.hermes),
        SystemLoad::IDLE,
    ));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(engine, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp { app, state, config }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_config(test_config(1000))
}

pub async fn spawn_test_app_with_limit(api_limit: u64) -> TestApp {
    spawn_with_config(test_config(api_limit))
}

pub async fn spawn_test_app_behind_proxy(api_limit: u64) -> TestApp {
    let mut config = test_config(api_limit);
    config.trust_proxy = true;
    spawn_with_config(config)
}
