use clap::{Arg, ArgMatches, Command};

use crate::config::{app_name, version};
use crate::pipeline::types::StreamFilter;

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArgs {
    pub filter: StreamFilter,
    pub input: String,
}

pub fn command() -> Command {
    Command::new(app_name())
        .version(version())
        .about("Dump per-stream packet and frame timestamps with their deltas")
        .arg(
            Arg::new("stream")
                .short('s')
                .long("stream")
                .value_name("STREAM_INDEX")
                .help("Only report this stream, -1 for every stream.")
                .value_parser(clap::value_parser!(i64).range(-1..))
                .allow_negative_numbers(true)
                .default_value("-1"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("INPUT")
                .help("Media file, `-` for stdin or tcp://host:port.")
                .required(true),
        )
}

impl DumpArgs {
    pub fn from_env() -> Self {
        Self::from_matches(&command().get_matches())
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let filter = match matches.get_one::<i64>("stream").copied() {
            Some(index) if index >= 0 => StreamFilter::Only(index as usize),
            _ => StreamFilter::All,
        };
        let input = matches
            .get_one::<String>("input")
            .cloned()
            .unwrap_or_default();

        DumpArgs { filter, input }
    }
}
