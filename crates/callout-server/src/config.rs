//! Startup configuration for the server binary.

/// Configuration consumed at startup. Host and port are the whole surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 12345,
        }
    }
}

impl ServerConfig {
    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses command-line flags into a config. Uses simple `--flag value`
    /// matching — no clap dependency for a two-flag surface.
    ///
    /// # Errors
    /// Returns a human-readable message for unknown flags or bad values;
    /// the caller prints it and exits.
    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--host" => {
                    config.host = args
                        .next()
                        .ok_or_else(|| "--host requires a value".to_string())?;
                }
                "--port" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "--port requires a value".to_string())?;
                    config.port = value
                        .parse()
                        .map_err(|_| format!("--port: \"{value}\" is not a valid port"))?;
                }
                other => {
                    return Err(format!("unknown argument: {other}"));
                }
            }
        }
        Ok(config)
    }
}
