use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use xplocal_core::Error;

mod context;
mod routes;

use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "xplocal")]
#[command(author, version, about = "XP Local - venue loyalty ledger service")]
pub struct Args {
    /// Address to which the server will bind
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://xp@localhost:5432/xplocal")]
    pub db_url: String,

    /// Per-request timeout in seconds. Timed-out requests report failure
    /// to the client; no state change is assumed on ambiguity.
    #[arg(long, default_value = "15")]
    pub request_timeout_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("xplocal=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("XP Local starting. bind_addr={}", args.bind_addr);

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
    }
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;
    let event_bus = ctx.event_bus.clone();

    let app = routes::router(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            args.request_timeout_secs,
        )));

    let addr: SocketAddr = args.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            event_bus.shutdown();
        })
        .await?;

    Ok(())
}
