use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::{SampleBlock, SampleSource};

/// Create a capture-to-display hand-off holding up to `depth` blocks
pub fn audio_buffer(depth: usize) -> (AudioBufferWriter, AudioBuffer) {
    let (tx, rx) = crossbeam_channel::bounded(depth.max(1));
    let dropped = Arc::new(AtomicUsize::new(0));
    (
        AudioBufferWriter {
            tx,
            dropped: Arc::clone(&dropped),
        },
        AudioBuffer {
            rx,
            dropped,
            reported_dropped: 0,
        },
    )
}

/// Producer half, owned by the capture callback
///
/// Never blocks. When the reader falls behind the block is dropped and
/// counted.
#[derive(Clone)]
pub struct AudioBufferWriter {
    tx: Sender<SampleBlock>,
    dropped: Arc<AtomicUsize>,
}

impl AudioBufferWriter {
    /// Queue a block; returns false if it was dropped
    pub fn push(&self, block: SampleBlock) -> bool {
        match self.tx.try_send(block) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn push_interleaved(&self, data: &[f32], channel_count: usize) -> bool {
        self.push(SampleBlock::from_interleaved(data, channel_count))
    }
}

/// Consumer half, polled once per display tick
pub struct AudioBuffer {
    rx: Receiver<SampleBlock>,
    dropped: Arc<AtomicUsize>,
    reported_dropped: usize,
}

impl AudioBuffer {
    /// Total blocks dropped by the writer so far
    pub fn dropped_blocks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard everything pending without processing it
    pub fn discard_pending(&mut self) -> usize {
        self.rx.try_iter().count()
    }
}

impl SampleSource for AudioBuffer {
    /// Everything that arrived since the previous call, concatenated
    fn newest_block(&mut self) -> SampleBlock {
        let mut newest = SampleBlock::default();
        for block in self.rx.try_iter() {
            newest.append(block);
        }

        let dropped = self.dropped_blocks();
        if dropped != self.reported_dropped {
            log::warn!(
                "Display fell behind capture: {} blocks dropped ({} total)",
                dropped - self.reported_dropped,
                dropped
            );
            self.reported_dropped = dropped;
        }

        newest
    }
}
