use tollgate::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    tollgate::cli::run_cli()
}
