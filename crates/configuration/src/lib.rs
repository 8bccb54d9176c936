use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AdminConfig, Config, DatabaseConfig, LoggingConfig, MailConfig, ReportConfig,
    ScheduleConfig, ServerConfig,
};

/// Loads the application configuration from the `config.toml` file.
///
/// Values can be overridden from the environment with the `CPA` prefix and a
/// double underscore between path segments, e.g. `CPA__MAIL__PASSWORD`. The
/// result is validated before it is returned.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("CPA").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
