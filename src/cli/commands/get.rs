//! Get command - fetch or build the latest release artifact

use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::KilnResult;
use crate::fetch::{FetchOutcome, RemoteFetcher};
use crate::package::RemotePackage;
use crate::ui::{TaskSpinner, UiContext};

/// Execute the get command, printing the artifact location on stdout
pub async fn execute(args: GetArgs, config: &Config) -> KilnResult<()> {
    let package = RemotePackage::parse(&args.package)?;
    let fetcher = RemoteFetcher::from_config(config);

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    let variant = if args.cached { " (cached)" } else { "" };
    spinner.start(&format!("Fetching {}{}...", package, variant));

    match fetcher.fetch(&package, args.cached).await {
        Ok(fetched) => {
            let verb = match fetched.outcome {
                FetchOutcome::Hit => "Up to date",
                FetchOutcome::Built => "Built",
            };
            spinner.stop(&format!("{} {} {}", verb, package, fetched.version));
            println!("{}", fetched.location);
            Ok(())
        }
        Err(e) => {
            spinner.stop_error(&format!("Failed to fetch {}", package));
            Err(e)
        }
    }
}
