use clap::{Parser, ValueEnum};
use datagolf_api::{DEFAULT_DISPLAY, StatsQuery};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "dgstats",
    version,
    about = "Fetch DataGolf live tournament stats as a normalized table",
    after_help = "Environment:\n  DATAGOLF_API_KEY    API key (required)\n  DATAGOLF_BASE_URL   Feed host override (default https://feeds.datagolf.com)\n  RUST_LOG            Log filter (default info)"
)]
pub struct Args {
    /// Stat presentation requested from the feed, e.g. value or rank
    #[arg(long, default_value = DEFAULT_DISPLAY)]
    pub display: String,

    /// Comma-separated stats to request; all known stats when omitted
    #[arg(long, value_delimiter = ',')]
    pub stats: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Write to this file instead of stdout (overwritten on every refresh)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Keep running and refresh every SECS seconds
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub watch: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Feed host, overriding DATAGOLF_BASE_URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

impl Args {
    pub fn query(&self) -> StatsQuery {
        let query = StatsQuery::default().with_display(self.display.clone());
        if self.stats.is_empty() {
            query
        } else {
            query.with_stats(self.stats.iter().cloned())
        }
    }

    pub fn watch_interval(&self) -> Option<Duration> {
        self.watch.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagolf_api::ALL_STATS;

    #[test]
    fn defaults_request_all_stats_once_as_csv() {
        let args = Args::try_parse_from(["dgstats"]).unwrap();
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(args.watch_interval().is_none());
        assert!(args.request_timeout().is_none());

        let query = args.query();
        assert_eq!(query.display, "value");
        assert_eq!(query.stats, ALL_STATS.to_vec());
    }

    #[test]
    fn stats_split_on_commas() {
        let args =
            Args::try_parse_from(["dgstats", "--display", "rank", "--stats", "sg_putt,gir"]).unwrap();
        let query = args.query();
        assert_eq!(query.display, "rank");
        assert_eq!(query.stats, vec!["sg_putt", "gir"]);
    }

    #[test]
    fn watch_and_output_options() {
        let args = Args::try_parse_from([
            "dgstats", "-f", "json", "-o", "stats.json", "--watch", "60", "--timeout", "5",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("stats.json")));
        assert_eq!(args.watch_interval(), Some(Duration::from_secs(60)));
        assert_eq!(args.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_watch_interval_is_rejected() {
        assert!(Args::try_parse_from(["dgstats", "--watch", "0"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["dgstats", "--format", "xml"]).is_err());
    }
}
