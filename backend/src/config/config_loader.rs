use anyhow::Result;

use super::config_model::{Auth, Database, DotEnvyConfig, PayGate, Server};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let paygate = PayGate {
        api_base_url: std::env::var("PAYGATE_API_BASE_URL")
            .expect("PAYGATE_API_BASE_URL is invalid"),
        public_key: std::env::var("PAYGATE_PUBLIC_KEY").expect("PAYGATE_PUBLIC_KEY is invalid"),
        shared_secret: std::env::var("PAYGATE_SHARED_SECRET")
            .expect("PAYGATE_SHARED_SECRET is invalid"),
        redirect_base_url: std::env::var("PAYGATE_REDIRECT_URL")
            .expect("PAYGATE_REDIRECT_URL is invalid"),
        request_timeout: std::env::var("PAYGATE_REQUEST_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?,
    };

    let auth = Auth {
        jwt_secret: std::env::var("AUTH_JWT_SECRET").expect("AUTH_JWT_SECRET is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        paygate,
        auth,
    })
}
