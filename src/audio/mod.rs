// Audio module - voice backend seam, trigger queue and pitch helpers

pub mod backend;
pub mod pitch;
pub mod queue;

pub use backend::{AudioError, LogVoiceLoader, Voice, VoiceBank, VoiceLoader};
pub use pitch::{FrequencyBand, note_name};
pub use queue::{NoteTrigger, TriggerConsumer, TriggerProducer, create_trigger_channel};
