use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Accounts, Config, Market, Server};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, deserializes it into our strongly-typed `Config`
/// struct, validates the parts the type system cannot, and returns it.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml"))
        // Environment variables win over the file (e.g. BOURSE__SERVER__BIND_ADDR).
        .add_source(config::Environment::with_prefix("BOURSE").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;

    // A UTC offset beyond +/-24h cannot name a real timezone.
    if config.market.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(ConfigError::ValidationError(format!(
            "market.utc_offset_minutes out of range: {}",
            config.market.utc_offset_minutes
        )));
    }

    Ok(config)
}
