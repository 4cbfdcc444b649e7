#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub paygate: PayGate,
    pub auth: Auth,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PayGate {
    pub api_base_url: String,
    pub public_key: String,
    pub shared_secret: String,
    pub redirect_base_url: String,
    /// Seconds before an outbound gateway call is treated as a recoverable
    /// failure.
    pub request_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}
