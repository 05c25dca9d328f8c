use std::process;

use anyhow::Context;
use log::{error, info, warn};

use ptsdump::cli::DumpArgs;
use ptsdump::config::Config;
use ptsdump::pipeline::{Dispatcher, LogSink};
use ptsdump::source::Source;
use ptsdump::source::ffmpeg::FfmpegSource;
use ptsdump::utils::sos::SignalOfStop;

fn main() {
    tracing_subscriber::fmt::init();

    let args = DumpArgs::from_env();
    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(args: DumpArgs) -> anyhow::Result<()> {
    let config = Config::from_env();

    // stop between two units on SIGINT, SIGTERM, or SIGHUP
    let sos = SignalOfStop::new();
    let handler_sos = sos.clone();
    ctrlc::set_handler(move || handler_sos.cancel()).context("Error setting Ctrl-C handler")?;

    let source = FfmpegSource::open(&args.input, &config.source)?;
    info!(
        "Input {}: {} streams, reporting {}",
        args.input,
        source.streams().len(),
        args.filter
    );

    let mut factory = source.decoder_factory();
    let sink = LogSink::new(config.format);
    let mut dispatcher = Dispatcher::new(source, &mut factory, config.decoder, sink)
        .with_stop_signal(sos);

    let stats = dispatcher
        .run(args.filter)
        .context("Dispatch loop failed")?;

    if stats.had_failures() {
        warn!("{}", stats);
    } else {
        info!("{}", stats);
    }
    for (index, stream) in &stats.streams {
        info!("Stream {}: {}", index, stream);
    }
    Ok(())
}
