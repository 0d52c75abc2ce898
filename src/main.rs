use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use tetue_generic::logging::{self, Severity};
use tetue_generic::{AppSettings, Error, HttpRequester};
use tracing::info;

const DEFAULT_ENV_FILE: &str = "files/.env";
const DEFAULT_OVERRIDE_FILE: &str = "files/.env.local";

fn parse_arg(prefix: &str) -> Option<String> {
    env::args()
        .skip(1)
        .find_map(|arg| arg.strip_prefix(prefix).map(str::to_string))
}

/// Resolves settings and brings up logging. Must run before any request.
fn startup() -> Result<AppSettings, Error> {
    let env_file = parse_arg("--env-file=").unwrap_or_else(|| DEFAULT_ENV_FILE.to_string());
    let override_file =
        parse_arg("--override-file=").unwrap_or_else(|| DEFAULT_OVERRIDE_FILE.to_string());

    let settings = AppSettings::load(&env_file, &override_file)?;
    logging::init(settings.watcher())?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match startup() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Start application in version: {}", env!("CARGO_PKG_VERSION"));
    logging::log(
        Severity::ExtDebug,
        format!(
            "request timeout {:?}, log level {}, log file {}",
            settings.request().timeout(),
            settings.watcher().log_level(),
            settings.watcher().log_file_path().display()
        ),
    );

    let Some(url) = parse_arg("--fetch=") else {
        return ExitCode::SUCCESS;
    };

    let requester = match HttpRequester::new(settings.request()) {
        Ok(requester) => requester,
        Err(e) => {
            eprintln!("Failed to create http client: {}", Error::from(e));
            return ExitCode::FAILURE;
        }
    };

    match requester.fetch(&url, &HashMap::new()).await {
        Ok(response) => {
            info!(url = %url, status = response.status_code(), bytes = response.body.len(), "Fetched");
            ExitCode::SUCCESS
        }
        // Already logged by the requester.
        Err(_) => ExitCode::FAILURE,
    }
}
