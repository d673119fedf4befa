//! Startup checks. `parkingd` refuses to start on a config it can't honour.

use crate::config::ServerConfig;

/// Verify server configuration before anything is opened.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.server.listen.trim().is_empty() {
        anyhow::bail!("Server listen address is empty in configuration.");
    }
    if config.parking.capacity == 0 {
        anyhow::bail!("Parking capacity must be at least 1.");
    }
    if config.parking.unit_rate == 0 {
        anyhow::bail!("Parking unit_rate must be greater than 0.");
    }
    config
        .pin
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid [pin] settings: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        assert!(verify_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn empty_data_dir_rejected() {
        let mut config = ServerConfig::default();
        config.storage.data_dir = "  ".into();
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn zero_limits_rejected() {
        let mut config = ServerConfig::default();
        config.parking.capacity = 0;
        assert!(verify_config(&config).is_err());

        let mut config = ServerConfig::default();
        config.parking.unit_rate = 0;
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn bad_argon2_params_rejected() {
        let mut config = ServerConfig::default();
        config.pin.iterations = 0;
        let err = verify_config(&config).unwrap_err().to_string();
        assert!(err.contains("[pin]"), "got: {err}");
    }
}
