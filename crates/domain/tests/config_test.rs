use ferrous_mesh_domain::config::{NamingBackend, ResolverConfigEntry};
use ferrous_mesh_domain::{CliOverrides, Config, ConfigError};
use serde::Deserialize;
use std::io::Write;

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.dns_port, 53);
    assert_eq!(config.namespace, "default");
    assert_eq!(config.system_namespace, "Polaris");
    assert!(!config.recurse.enable);
    assert_eq!(config.recurse.timeout_secs, 1);
    assert!(config.recurse.name_servers.is_empty());
    assert!(config.dns.search_domains.is_empty());
    assert!(config.dns.resolver_deadline().is_none());
    assert_eq!(config.naming.backend, NamingBackend::Static);
    assert_eq!(config.logging.level, "info");
    assert!(config.debugger.enable);
    assert_eq!(config.debugger.port, 50000);

    assert_eq!(config.resolvers.len(), 2);
    assert_eq!(config.resolvers[0].name, "dnsagent");
    assert_eq!(config.resolvers[0].dns_ttl, 10);
    assert!(config.resolvers[0].enable);
    assert_eq!(config.resolvers[1].name, "meshproxy");
    assert_eq!(config.resolvers[1].dns_ttl, 120);
    assert!(!config.resolvers[1].enable);
    assert_eq!(config.resolvers[1].option["dns_answer_ip"], "10.4.4.4");

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_parses_resolver_chain_in_order() {
    let toml_str = r#"
        namespace = "ns1"

        [server]
        dns_port = 5353

        [recurse]
        enable = true
        timeout_secs = 2
        name_servers = ["10.0.0.2"]

        [[resolvers]]
        name = "meshproxy"
        dns_ttl = 60
        enable = true
        [resolvers.option]
        registry = "envoy"
        registry_port = 15000

        [[resolvers]]
        name = "dnsagent"
        suffix = ".svc.cluster.local."
        enable = true

        [[resolvers]]
        name = "discovery"
        enable = false
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.namespace, "ns1");
    assert_eq!(config.server.dns_port, 5353);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert!(config.recurse.enable);
    assert_eq!(config.recurse.timeout().as_secs(), 2);

    let names: Vec<&str> = config.enabled_resolvers().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["meshproxy", "dnsagent"]);
    assert_eq!(config.resolvers[0].option["registry_port"], 15000);
    assert_eq!(config.resolvers[1].suffix, ".svc.cluster.local.");
    assert_eq!(config.resolvers[2].suffix, ".");
}

#[test]
fn test_config_validation_errors() {
    let mut config = Config::default();
    config.server.dns_port = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

    let mut config = Config::default();
    config.server.bind_address = " ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.recurse.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.resolvers.clear();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.resolvers[0].name = String::new();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    for entry in &mut config.resolvers {
        entry.enable = false;
    }
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.naming.backend = NamingBackend::Polaris;
    assert!(config.validate().is_err());
    config.naming.addresses.push("127.0.0.1:8090".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_server_socket_addr_handles_ipv6_bind() {
    let mut config = Config::default();
    config.server.bind_address = "::".to_string();

    let addr = config.server.socket_addr(5353).unwrap();

    assert_eq!(addr.to_string(), "[::]:5353");
    assert!(config.server.binds_localhost());
    assert!(config.validate().is_ok());
}

#[test]
fn test_server_rejects_hostname_bind() {
    let mut config = Config::default();
    config.server.bind_address = "localhost".to_string();

    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    assert!(config.server.socket_addr(53).is_err());
    assert!(!config.server.binds_localhost());
}

#[test]
fn test_config_load_from_file_with_cli_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        namespace = "from-file"

        [server]
        dns_port = 8053

        [logging]
        level = "debug"
        "#
    )
    .unwrap();

    let overrides = CliOverrides {
        dns_port: Some(9053),
        namespace: Some("from-cli".to_string()),
        ..Default::default()
    };
    let config = Config::load(file.path().to_str(), overrides).unwrap();

    assert_eq!(config.server.dns_port, 9053);
    assert_eq!(config.namespace, "from-cli");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_config_load_missing_file_fails() {
    let result = Config::load(Some("/nonexistent/ferrous-mesh.toml"), CliOverrides::default());
    assert!(matches!(result, Err(ConfigError::FileRead(_, _))));
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SampleOptions {
    route_labels: String,
    timeout_ms: u64,
}

#[test]
fn test_resolver_entry_decodes_options() {
    let mut entry = ResolverConfigEntry::new("dnsagent");
    entry
        .option
        .insert("route_labels".to_string(), "env:prod".into());

    let options: SampleOptions = entry.options().unwrap();
    assert_eq!(options.route_labels, "env:prod");
    assert_eq!(options.timeout_ms, 0);

    entry.option.insert("timeout_ms".to_string(), "soon".into());
    assert!(entry.options::<SampleOptions>().is_err());
}

#[test]
fn test_resolver_entry_fqdn_suffix() {
    let mut entry = ResolverConfigEntry::new("dnsagent");
    assert_eq!(entry.fqdn_suffix(), ".");

    entry.suffix = ".svc.cluster.local".to_string();
    assert_eq!(entry.fqdn_suffix(), ".svc.cluster.local.");
}
