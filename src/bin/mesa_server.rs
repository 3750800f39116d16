use clap::Parser;
use mesa::{about, api, config::DesignerConfig};

#[derive(Parser)]
#[command(name = "mesa_server")]
#[command(about = "MESA-Designer HTTP API", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "MESA_CONFIG")]
    config: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:8000
    #[arg(long, env = "MESA_BIND")]
    bind: Option<String>,

    /// Runtime parts library replacing built-in categories
    #[arg(long, value_name = "JSON", env = "MESA_PARTS_LIBRARY")]
    parts: Option<String>,

    /// SAbDab summary TSV for antigen search
    #[arg(long, value_name = "TSV", env = "MESA_SABDAB_TSV")]
    sabdab: Option<String>,

    /// Print version and exit
    #[arg(short = 'V', long)]
    version: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if cli.version {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let mut config = DesignerConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(parts) = cli.parts {
        config.parts_library = Some(parts);
    }
    if let Some(sabdab) = cli.sabdab {
        config.sabdab_tsv = Some(sabdab);
    }

    log::info!("Starting MESA-Designer {}", about::MESA_DISPLAY_VERSION);
    api::serve(config).await
}
