mod cli;
mod csv_out;
mod dashboard;
mod errors;
mod influx;
mod lastheard;
mod model;
mod scrape;
#[cfg(test)]
mod test_http;

use crate::errors::AppError;
use chrono_tz::Tz;
use env_logger::Env;
use log::info;

fn setup_logging(level: &str) {
    let env = Env::default().filter_or("RUST_LOG", match level {
        "essential" => "info",
        "debug" => "debug",
        "trace" => "trace",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    });
    env_logger::Builder::from_env(env).init();
}

fn parse_tz(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|e| AppError::Config(format!("unknown timezone '{}': {}", name, e)))
}

fn main() -> Result<(), AppError> {
    let args = cli::parse_cli();
    setup_logging(&args.log_level);

    let tz = parse_tz(&args.tz)?;
    let ctx = lastheard::ParseContext::current(tz);
    info!("Reading timestamps as {} in {}", ctx.year, args.tz);

    let fetcher = dashboard::HttpFetcher::new()?;
    let url = dashboard::last_heard_url(&args.url);
    let outcome = scrape::scrape_last_heard(&fetcher, &url, &ctx)?;
    info!(
        "Kept {} of {} rows",
        outcome.records.len(),
        outcome.rows_examined
    );

    if let Some(path) = args.csv.as_ref() {
        csv_out::write_csv(&outcome.records, path)?;
        info!("CSV wrote {} rows to {}", outcome.records.len(), path.display());
    }

    let points: Vec<influx::Point> = outcome.records.iter().map(influx::Point::from).collect();

    if args.dry_run {
        let json = serde_json::to_string_pretty(&points)
            .map_err(|e| AppError::IO(format!("json: {}", e)))?;
        println!("{}", json);
        info!("Dry run; InfluxDB left untouched");
        return Ok(());
    }

    info!("Writing entries to InfluxDB");
    let client = influx::InfluxClient::connect(&args.db_host, args.db_port, &args.db_name)?;
    client.write_points(&points)?;

    info!("Done.");
    Ok(())
}
