use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;

use ped_detect::annotate::AnnotateStyle;
use ped_detect::args::ModelArgs;
use ped_detect::web::{self, AppState};

/// Serves the pedestrian detection upload page.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = web::DEFAULT_BIND)]
    bind: SocketAddr,

    /// Largest accepted upload, in bytes
    #[arg(long, default_value_t = web::DEFAULT_MAX_UPLOAD, value_name = "BYTES")]
    max_upload: usize,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let model_config = cli.model.model_config()?;

    let detector = tokio::task::spawn_blocking(move || ped_detect::init_detector(&model_config)).await??;
    let state = AppState::new(Box::new(detector), AnnotateStyle::discover());

    log::info!("🚶 Pedestrian Detection App starting");
    web::serve(cli.bind, state, cli.max_upload).await
}
