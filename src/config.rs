use crate::server::{DEFAULT_MAX_BODY_BYTES, RegistryOptions};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "rpc-http-gateway")]
#[command(about = "Serve registered RPC services over HTTP+JSON")]
pub struct GatewayConfig {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub addr: String,

    /// Largest request body accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Seconds between metrics reports in the log (0 disables them)
    #[arg(long, default_value_t = 30)]
    pub metrics_interval_secs: u64,
}

impl GatewayConfig {
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn metrics_interval(&self) -> Option<Duration> {
        match self.metrics_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
