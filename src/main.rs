use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use sinesth::sequencer::preview::PreviewOutcome;
use sinesth::{
    AutoSave, ConfigError, FrequencyBand, LogVoiceLoader, MathEvaluator, PlaybackError, PlaybackScheduler,
    PreviewLoop, ProjectError, SequencerConfig, TickClock, TimelineStore, VoiceBank,
    create_trigger_channel, export_filename,
};
use std::process::ExitCode;

const SINESTH_LOG: &str = "SINESTH_LOG";
const SINESTH_CONFIG: &str = "SINESTH_CONFIG";

const USAGE: &str = "usage:
  sinesth import <project.json>
  sinesth play [project.json] [beats]
  sinesth preview <project.json> <instrument-id> [ticks]
  sinesth export-name <project.json>";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),

    #[error("Logging init failed: {0}")]
    Logging(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() -> Result<(), CliError> {
    let level = std::env::var(SINESTH_LOG)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| CliError::Logging(e.to_string()))?;
    Ok(())
}

fn init_config() -> Result<SequencerConfig, CliError> {
    match std::env::var(SINESTH_CONFIG) {
        Ok(path) => {
            log::info!("Loading configuration from {} ...", path);
            let config = SequencerConfig::from_file(&path)?;
            log::debug!("{:#?}", config);
            Ok(config)
        }
        Err(_) => Ok(SequencerConfig::default()),
    }
}

fn run(args: Vec<String>) -> Result<(), CliError> {
    let config = init_config()?;

    match args.first().map(String::as_str) {
        Some("import") => {
            let path = arg(&args, 1, "missing <project.json>")?;
            import(&config, path)
        }
        Some("play") => {
            // `play 32` plays the saved working project for 32 beats
            let (path, beats) = match args.get(1) {
                Some(first) if first.parse::<u32>().is_err() => {
                    (Some(first.as_str()), optional_count(&args, 2)?)
                }
                _ => (None, optional_count(&args, 1)?),
            };
            play(&config, path, beats)
        }
        Some("preview") => {
            let path = arg(&args, 1, "missing <project.json>")?;
            let instrument_id = arg(&args, 2, "missing <instrument-id>")?;
            let ticks = optional_count(&args, 3)?.unwrap_or(16);
            preview(&config, path, instrument_id, ticks)
        }
        Some("export-name") => {
            let path = arg(&args, 1, "missing <project.json>")?;
            let store = load_project(&config, path)?;
            println!("{}", export_filename(store.project_name(), chrono::Utc::now()));
            Ok(())
        }
        Some(other) => Err(CliError::Usage(format!("unknown command '{}'", other))),
        None => Err(CliError::Usage("missing command".into())),
    }
}

fn arg<'a>(args: &'a [String], index: usize, missing: &str) -> Result<&'a str, CliError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| CliError::Usage(missing.to_string()))
}

fn optional_count(args: &[String], index: usize) -> Result<Option<u32>, CliError> {
    args.get(index)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| CliError::Usage(format!("'{}' is not a count", v)))
        })
        .transpose()
}

fn load_project(config: &SequencerConfig, path: &str) -> Result<TimelineStore, CliError> {
    let mut store = TimelineStore::from_config(config);
    let report = store.import_file(path)?;
    log::info!(
        "Loaded '{}' ({} instrument(s), {} clip(s), {})",
        store.project_name(),
        report.instruments,
        report.clips,
        store.tempo()
    );
    Ok(store)
}

/// Project saved by the last `import`
fn load_working_project(config: &SequencerConfig) -> Result<TimelineStore, CliError> {
    let mut autosave = AutoSave::from_config(config);
    let mut store = TimelineStore::from_config(config);

    match autosave.hydrate(&mut store)? {
        Some(report) => {
            log::info!(
                "Loaded working project '{}' from {} ({} instrument(s), {} clip(s))",
                store.project_name(),
                autosave.storage().dir().display(),
                report.instruments,
                report.clips
            );
            Ok(store)
        }
        None => Err(CliError::Usage(format!(
            "no saved project in {}; run `sinesth import` first",
            autosave.storage().dir().display()
        ))),
    }
}

fn import(config: &SequencerConfig, path: &str) -> Result<(), CliError> {
    let mut autosave = AutoSave::from_config(config);
    let mut store = TimelineStore::from_config(config);
    if let Err(e) = autosave.hydrate(&mut store) {
        log::warn!("Replacing unreadable working project: {}", e);
    }

    let report = store.import_file(path)?;
    if !report.is_clean() {
        log::warn!("{} was repaired on import: {:?}", path, report);
    }
    autosave.flush(&store)?;

    log::info!(
        "Saved '{}' as the working project in {}",
        store.project_name(),
        autosave.storage().dir().display()
    );
    Ok(())
}

fn play(config: &SequencerConfig, path: Option<&str>, beats: Option<u32>) -> Result<(), CliError> {
    let mut store = match path {
        Some(path) => load_project(config, path)?,
        None => load_working_project(config)?,
    };
    let beats = beats.unwrap_or(store.transport().total_beats());

    let (trigger_tx, trigger_rx) = create_trigger_channel(config.trigger_queue_capacity);
    let mut voices = VoiceBank::new(Box::new(LogVoiceLoader), trigger_rx);
    let band = FrequencyBand::new(config.frequency_min, config.frequency_max);
    let mut scheduler = PlaybackScheduler::new(trigger_tx, Box::new(MathEvaluator::new()), band);

    let period = scheduler.start(&mut store, &mut voices)?;
    let mut clock = TickClock::start(period);

    let mut failures = 0;
    let mut dropped = 0;
    for _ in 0..beats {
        let Some(_tick) = clock.wait() else {
            break;
        };
        if let Some(report) = scheduler.tick(&mut store, &voices) {
            failures += report.failures.len();
            dropped += report.dropped;
        }
        voices.drain();
    }

    clock.stop();
    scheduler.stop(&mut store);

    log::info!(
        "Played {} beat(s): {} note(s), {} failed step(s), {} dropped, {} coalesced tick(s)",
        beats,
        voices.played_count(),
        failures,
        dropped,
        clock.coalesced()
    );
    Ok(())
}

fn preview(
    config: &SequencerConfig,
    path: &str,
    instrument_id: &str,
    ticks: u32,
) -> Result<(), CliError> {
    let store = load_project(config, path)?;
    let instrument = store.instrument(instrument_id).ok_or_else(|| {
        CliError::Usage(format!("no instrument '{}' in {}", instrument_id, path))
    })?;

    let band = FrequencyBand::new(config.frequency_min, config.frequency_max);
    let mut evaluator = MathEvaluator::new();
    let mut preview = PreviewLoop::default();
    let mut clock = TickClock::start(PreviewLoop::period(instrument));

    log::info!(
        "Previewing {} ('{}', dX = {}, dT = {} ms)",
        instrument.label(),
        instrument.equation,
        instrument.d_x,
        instrument.d_t
    );

    for _ in 0..ticks {
        if clock.wait().is_none() {
            break;
        }
        let step = preview.step(instrument, &mut evaluator, &band);
        match step.outcome {
            PreviewOutcome::Sounded { frequency, note } => {
                log::info!("[{:>3}] x = {:<7} {:>5} ({:.2} Hz)", step.tick_index, step.x, note, frequency);
            }
            PreviewOutcome::Muted => log::info!("[{:>3}] x = {:<7} muted", step.tick_index, step.x),
            PreviewOutcome::Failed(_) => {}
        }
    }

    clock.stop();
    Ok(())
}
