// Trigger queue - scheduler -> audio, lock-free and bounded
// The scheduler submits without blocking; a full queue rejects the trigger

use crate::sequencer::clip::ClipId;
use crate::sequencer::instrument::InstrumentId;
use ringbuf::{HeapRb, traits::Split};

/// A note-on request for one clip step
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTrigger {
    pub instrument_id: InstrumentId,
    pub clip_id: ClipId,
    /// Timeline beat that produced the trigger
    pub beat: u32,
    /// Position of the beat inside the clip
    pub step_index: usize,
    /// Frequency after clamping to the playable band
    pub frequency: f64,
    /// Nearest note name for the frequency (e.g. "A4")
    pub note: String,
}

pub type TriggerProducer = ringbuf::HeapProd<NoteTrigger>;
pub type TriggerConsumer = ringbuf::HeapCons<NoteTrigger>;

pub fn create_trigger_channel(capacity: usize) -> (TriggerProducer, TriggerConsumer) {
    let rb = HeapRb::<NoteTrigger>::new(capacity.max(1));
    rb.split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    fn trigger(beat: u32) -> NoteTrigger {
        NoteTrigger {
            instrument_id: "i".into(),
            clip_id: "c".into(),
            beat,
            step_index: 0,
            frequency: 440.0,
            note: "A4".into(),
        }
    }

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = create_trigger_channel(4);

        tx.try_push(trigger(1)).unwrap();
        tx.try_push(trigger(2)).unwrap();

        assert_eq!(rx.try_pop().map(|t| t.beat), Some(1));
        assert_eq!(rx.try_pop().map(|t| t.beat), Some(2));
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_full_queue_rejects() {
        let (mut tx, _rx) = create_trigger_channel(1);

        assert!(tx.try_push(trigger(1)).is_ok());
        let rejected = tx.try_push(trigger(2));
        assert_eq!(rejected.map_err(|t| t.beat), Err(2));
    }
}
