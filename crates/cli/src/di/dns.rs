use ferrous_mesh_domain::Config;
use ferrous_mesh_infrastructure::dns::resolv_conf::DEFAULT_RESOLV_CONF;
use ferrous_mesh_infrastructure::dns::{DnsServer, ResolvConf};
use ferrous_mesh_infrastructure::naming::create_naming_client;
use ferrous_mesh_infrastructure::resolver::ResolverRegistry;
use tracing::{info, warn};

pub struct DnsServices {
    pub server: DnsServer,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!(backend = config.naming.backend.as_str(), "Initializing naming backend");
        let naming = create_naming_client(&config.naming)?;

        let resolv_conf = Self::load_resolv_conf(config);
        let registry = ResolverRegistry::with_builtin();
        let server = DnsServer::build(config, &registry, naming, &resolv_conf)?;

        Ok(Self { server })
    }

    /// Only consulted when recursion or search domains are left to the system
    /// resolver; an unreadable file then degrades to no upstreams.
    fn load_resolv_conf(config: &Config) -> ResolvConf {
        let needs_system = (config.recurse.enable && config.recurse.name_servers.is_empty())
            || config.dns.search_domains.is_empty();
        if !needs_system {
            return ResolvConf::default();
        }

        match ResolvConf::load(DEFAULT_RESOLV_CONF) {
            Ok(conf) => conf,
            Err(e) => {
                warn!(path = DEFAULT_RESOLV_CONF, error = %e, "System resolver configuration unavailable");
                ResolvConf::default()
            }
        }
    }
}
