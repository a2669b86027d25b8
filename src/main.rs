mod cli;

use checked_fetcher::{CancellationToken, DownloadError, Downloader, FsStorage};
use clap::Parser;
use std::{process::ExitCode, sync::Arc};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = cli::Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: cli::Cli) -> Result<(), DownloadError> {
    if cli.parallel {
        log::warn!("Parallel downloads are not supported, using a single connection");
    }
    let download = cli.download()?;
    let mut downloader = Downloader::new(Arc::new(FsStorage))?.with_progress(cli.progress.reporter());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling download");
            on_signal.cancel();
        }
    });

    let downloaded = downloader.download(&download, &cancel).await?;
    println!("{}", downloaded.path.display());
    Ok(())
}
