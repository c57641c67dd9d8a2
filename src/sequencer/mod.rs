// Sequencer module
// Clips, lanes, instruments, transport, and beat-synchronized playback

pub mod clip;
pub mod clock;
pub mod collision;
pub mod instrument;
pub mod preview;
pub mod scheduler;
pub mod transport;

pub use clip::{Clip, ClipId, ClipSpan};
pub use clock::{Tick, TickClock};
pub use collision::{LaneSearch, collides, find_free_lane};
pub use instrument::{Instrument, InstrumentId, InstrumentUpdate};
pub use preview::{PreviewLoop, PreviewOutcome, PreviewStep};
pub use scheduler::{PlaybackError, PlaybackScheduler, PlaybackState, StepFailure, TickReport};
pub use transport::{Tempo, Transport, TransportState};
