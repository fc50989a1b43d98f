//! The `smithy-ls` binary.

use clap::Parser;
use smithy_ls_server::dispatch::Dispatcher;
use smithy_ls_server::{logging, transport};

#[derive(Parser)]
#[command(name = "smithy-ls")]
#[command(about = "A language server for the Smithy IDL")]
struct Cli {
    /// TCP port to listen on; with no port the server speaks stdio.
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting smithy-ls");

    let dispatcher = Dispatcher::new();
    let code = match cli.port {
        Some(port) => transport::serve_tcp(dispatcher, port).await?,
        None => transport::serve_stdio(dispatcher).await?,
    };

    tracing::info!(code, "server stopped");
    std::process::exit(code);
}
