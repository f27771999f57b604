use relay_types::rpc::DEFAULT_CENTRAL_PORT;

pub struct CentralConfig {
    /// HTTP port for the remote-call endpoint (default 1099)
    pub port: u16,
    /// Completed batch reports kept for `GET /reports` (default 32)
    pub report_history: usize,
    /// Messages buffered between the HTTP handlers and the aggregator task
    pub queue_depth: usize,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            port: std::env::var("CENTRAL_PORT")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_CENTRAL_PORT),
            report_history: std::env::var("CENTRAL_REPORT_HISTORY")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(32),
            queue_depth: std::env::var("CENTRAL_QUEUE_DEPTH")
                .ok().and_then(|v| v.parse().ok()).filter(|&d: &usize| d > 0).unwrap_or(1024),
        }
    }
}
