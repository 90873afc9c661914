use ferrous_mesh_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

/// Logged once the subscriber is up, since loading runs before logging.
pub fn log_config_summary(config: &Config, config_path: Option<&str>) {
    info!(
        config_file = config_path.unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        namespace = %config.namespace,
        recursion = config.recurse.enable,
        naming_backend = config.naming.backend.as_str(),
        resolvers = ?config.enabled_resolvers().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "Configuration loaded"
    );
}
