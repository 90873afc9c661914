use axum::Router;
use clap::Parser;
use ferrous_mesh_domain::{CliOverrides, Config};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ferrous-mesh")]
#[command(version = "0.1.0")]
#[command(about = "Ferrous Mesh - service-mesh sidecar DNS server")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Debug HTTP server port
    #[arg(long)]
    debugger_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Namespace of the workload this sidecar serves
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        debugger_port: cli.debugger_port,
        namespace: cli.namespace.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);
    bootstrap::config::log_config_summary(&config, cli.config.as_deref());

    info!("Starting Ferrous Mesh v{}", env!("CARGO_PKG_VERSION"));

    let services = di::DnsServices::new(&config)?;
    let Listeners { dns, web } = match bind_listeners(&config, &services).await {
        Ok(listeners) => listeners,
        Err(e) => {
            error!(error = %e, "Failed to start listeners");
            services.server.destroy();
            return Err(e);
        }
    };

    let shutdown = CancellationToken::new();
    services.server.start(&shutdown);

    let dns_handler = services.server.handler();
    let dns_shutdown = shutdown.clone();
    let dns_task = tokio::spawn(async move {
        if let Err(e) =
            server::start_dns_server(dns, dns_handler, dns_shutdown.clone()).await
        {
            error!(error = %e, "DNS server error");
            dns_shutdown.cancel();
        }
    });

    let web_task = web.map(|(listener, app)| {
        let web_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server::start_web_server(listener, app, web_shutdown).await {
                error!(error = %e, "Debug server error");
            }
        })
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();

    let _ = dns_task.await;
    if let Some(web_task) = web_task {
        let _ = web_task.await;
    }
    services.server.destroy();

    info!("Server shutdown complete");
    Ok(())
}

struct Listeners {
    dns: server::dns::DnsListeners,
    web: Option<(TcpListener, Router)>,
}

/// Binds every listener up front so a taken port aborts startup.
async fn bind_listeners(config: &Config, services: &di::DnsServices) -> anyhow::Result<Listeners> {
    let dns = server::bind_dns_listeners(config.server.socket_addr(config.server.dns_port)?)?;

    let web = if config.debugger.enable {
        let app = server::web::create_app(services.server.debug_handlers())?;
        let listener = TcpListener::bind(config.server.socket_addr(config.debugger.port)?).await?;
        Some((listener, app))
    } else {
        None
    };

    Ok(Listeners { dns, web })
}
