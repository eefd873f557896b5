//! Configuration commands.

use crate::config::{ClientConfig, ConnectionOverrides};
use crate::error::{CliError, CliResult};

/// Dump the current configuration to stdout, with inline passwords masked.
pub fn dump(config: &ClientConfig) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, resolving the password reference.
pub fn validate(config: &ClientConfig, overrides: &ConnectionOverrides) -> CliResult<()> {
    let caldav = config.caldav_config(overrides).map_err(CliError::Config)?;
    println!(
        "Configuration is valid: {} as {}",
        caldav.server_url(),
        caldav.credentials.username()
    );
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> CliResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}
