// src/main.rs

use std::process::ExitCode;

use qahub::errors::QahubError;
use qahub::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("qahub error: {err:#}");
            // Bad input (unknown id, missing suite) vs. everything else.
            let client_error = err
                .downcast_ref::<QahubError>()
                .is_some_and(QahubError::is_client_error);
            ExitCode::from(if client_error { 2 } else { 1 })
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
