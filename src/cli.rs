use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use std::path::PathBuf;

use crate::influx::{DEFAULT_DB, DEFAULT_PORT};

pub const DEFAULT_TZ: &str = "Europe/Berlin";

pub struct CliArgs {
    pub url: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub tz: String,
    pub csv: Option<PathBuf>,
    pub dry_run: bool,
    pub log_level: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            url: String::new(),
            db_host: String::new(),
            db_port: DEFAULT_PORT,
            db_name: DEFAULT_DB.into(),
            tz: DEFAULT_TZ.into(),
            csv: None,
            dry_run: false,
            log_level: "essential".into(),
        }
    }
}

pub fn parse_cli() -> CliArgs {
    let mut args = CliArgs::default();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Scraping data from a Pi-Star dashboard and write it into InfluxDB");
        ap.refer(&mut args.url)
            .add_option(&["--url"], Store, "URL of the Pi-Star dashboard")
            .required();
        ap.refer(&mut args.db_host)
            .add_option(&["--db_host"], Store, "Hostname of the InfluxDB server, example: http://pi-star.local")
            .required();
        ap.refer(&mut args.db_port)
            .add_option(&["--db_port"], Store, "Port of the InfluxDB server (default: 8086)");
        ap.refer(&mut args.db_name)
            .add_option(&["--db_name"], Store, "Name of the InfluxDB database (default: pistar)");
        ap.refer(&mut args.tz)
            .add_option(&["--tz"], Store, "Timezone of the dashboard clock (IANA name, default: Europe/Berlin)");
        ap.refer(&mut args.csv)
            .add_option(&["--csv"], StoreOption, "Also write the scraped entries to this CSV file");
        ap.refer(&mut args.dry_run)
            .add_option(&["--dry-run"], StoreTrue, "Scrape and print, but do not touch InfluxDB");
        ap.refer(&mut args.log_level)
            .add_option(&["--log"], Store, "Log level (essential|debug|trace|warn|error)");
        ap.parse_args_or_exit();
    }
    args
}
