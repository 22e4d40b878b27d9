/// Multi-channel block of audio samples
///
/// Stored planar: one `Vec` per channel. Channels may differ in length when
/// a producer delivered partial data; consumers treat each channel on its
/// own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBlock {
    channels: Vec<Vec<f32>>,
}

impl SampleBlock {
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    pub fn mono(samples: Vec<f32>) -> Self {
        Self::new(vec![samples])
    }

    pub fn stereo(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self::new(vec![left, right])
    }

    /// A block with `channel_count` channels and no samples
    pub fn silent(channel_count: usize) -> Self {
        Self::new(vec![Vec::new(); channel_count])
    }

    /// Split interleaved samples `[c0, c1, .., c0, c1, ..]` into channels
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(data: &[f32], channel_count: usize) -> Self {
        if channel_count == 0 {
            return Self::default();
        }
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self { channels }
    }

    pub fn to_interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of complete frames (shortest channel length)
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Samples of channel `index`, or an empty slice if absent
    pub fn channel(&self, index: usize) -> &[f32] {
        self.channels.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// True if no channel carries any samples
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    /// Append a later block
    ///
    /// If the channel layout changed, the older data is discarded and the
    /// newer block's layout is kept.
    pub fn append(&mut self, later: SampleBlock) {
        if later.channel_count() != self.channel_count() {
            *self = later;
            return;
        }
        for (mine, theirs) in self.channels.iter_mut().zip(later.channels) {
            mine.extend(theirs);
        }
    }
}
