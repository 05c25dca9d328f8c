use std::time::Duration;

/// Environment variable selecting the record output format (`text` or `json`).
pub const FORMAT_ENV: &str = "PTSDUMP_FORMAT";

/// How emitted records are rendered by the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human readable line per record
    #[default]
    Text,
    /// One JSON object per record
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Advisory tuning handed to the source reader at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Bytes probed to detect the container format
    pub probe_size: usize,
    /// Upper bound for stream analysis while reading the header
    pub max_analyze_duration: Duration,
    /// Read timeout for network inputs
    pub read_timeout: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            probe_size: 100 * 1024,
            max_analyze_duration: Duration::from_secs(2),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Decoder threading model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadType {
    Frame,
    Slice,
}

impl ThreadType {
    /// Value understood by the libav `thread_type` option.
    pub fn as_option(&self) -> &'static str {
        match self {
            ThreadType::Frame => "frame",
            ThreadType::Slice => "slice",
        }
    }
}

/// Performance knobs applied when opening video decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderTuning {
    pub video_threads: usize,
    pub thread_type: ThreadType,
}

impl Default for DecoderTuning {
    fn default() -> Self {
        DecoderTuning {
            video_threads: 8,
            thread_type: ThreadType::Frame,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub source: SourceOptions,
    pub decoder: DecoderTuning,
    pub format: OutputFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup(FORMAT_ENV) {
            Some(value) => OutputFormat::parse(&value).unwrap_or_else(|| {
                log::warn!("Ignoring {}={:?}, expected text or json", FORMAT_ENV, value);
                OutputFormat::Text
            }),
            None => OutputFormat::Text,
        };

        Config {
            source: SourceOptions::default(),
            decoder: DecoderTuning::default(),
            format,
        }
    }
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}
