use dotenv::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_port: u16,
    pub backend_url: String,
    pub poll_interval_ms: u64,
    pub autostart_strategies: Vec<String>,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // loads `.env` file automatically

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key → value source (env in prod, a closure in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = lookup("SERVER_PORT")
            .ok_or("SERVER_PORT missing from env")?
            .parse::<u16>()
            .map_err(|_| "SERVER_PORT must be a valid u16")?;

        let backend_url = lookup("BACKEND_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or("BACKEND_URL missing")?
            .trim()
            .trim_end_matches('/')
            .to_string();

        let poll_interval_ms = match lookup("POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| "POLL_INTERVAL_MS must be a whole number of milliseconds")?;
                if ms == 0 {
                    return Err("POLL_INTERVAL_MS must be greater than zero".into());
                }
                ms
            }
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        let autostart_strategies = lookup("AUTOSTART_STRATEGIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_port,
            backend_url,
            poll_interval_ms,
            autostart_strategies,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
