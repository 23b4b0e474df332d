use std::process::ExitCode;

use landfall::cli::{App, Args};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();

    let app = match App::from_args(&args) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match app.run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
