// sinesth - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod equation;
pub mod project;
pub mod sequencer;
pub mod store;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::{
    AudioError, FrequencyBand, LogVoiceLoader, NoteTrigger, Voice, VoiceBank, VoiceLoader,
    create_trigger_channel,
};
pub use config::{ConfigError, SequencerConfig};
pub use equation::{EvalError, Evaluator, MathEvaluator};
pub use project::{
    AutoSave, FileStorage, ImportReport, MemoryStorage, ProjectError, ProjectFile,
    ProjectStorage, export_filename,
};
pub use sequencer::{
    Clip, ClipId, ClipSpan, Instrument, InstrumentId, InstrumentUpdate, PlaybackError,
    PlaybackScheduler, PlaybackState, PreviewLoop, Tempo, TickClock, TickReport, Transport,
    TransportState,
};
pub use store::{EditError, EditResult, StoreSettings, TimelineStore};
pub use ui::{DragController, DragKind, DragUpdate, GridGeometry, PointerButton, PointerPosition};
