#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown embedding provider: {0}")]
    UnknownProvider(String),

    #[error("{key} required when using the {provider} provider")]
    MissingApiKey {
        provider: &'static str,
        key: &'static str,
    },
}
