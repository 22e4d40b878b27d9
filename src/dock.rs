use crate::audio::SampleSource;
use crate::error::{MeterError, Result};
use crate::settings::SettingsStore;
use crate::visualizer::{Visualizer, VisualizerKind};

/// Settings key holding the selected visualizer index
pub const DOCK_TYPE_KEY: &str = "type";

/// Builds the visualizer for a kind, or fails if the host has none
pub type VisualizerFactory = Box<dyn FnMut(VisualizerKind) -> Result<Box<dyn Visualizer>>>;

/// Container hosting one visualizer at a time
///
/// Owns the sample source and lends it to the active visualizer on every
/// update, so switching visualizers never needs to rewire the source.
pub struct Dock<S: SampleSource> {
    name: String,
    source: S,
    factory: VisualizerFactory,
    current: Box<dyn Visualizer>,
}

impl<S: SampleSource> Dock<S> {
    pub fn new(
        name: impl Into<String>,
        source: S,
        mut factory: VisualizerFactory,
        kind: VisualizerKind,
    ) -> Result<Self> {
        let current = factory(kind)?;
        Ok(Self {
            name: name.into(),
            source,
            factory,
            current,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VisualizerKind {
        self.current.kind()
    }

    pub fn visualizer(&self) -> &dyn Visualizer {
        self.current.as_ref()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Replace the active visualizer; on failure the old one stays
    pub fn select(&mut self, kind: VisualizerKind) -> Result<()> {
        let next = (self.factory)(kind)?;
        log::debug!("{}: {} -> {}", self.name, self.current.kind(), kind);
        self.current = next;
        Ok(())
    }

    pub fn update(&mut self) {
        self.current.update(&mut self.source);
    }

    pub fn pause(&mut self) {
        if self.current.supports_pause() {
            self.current.pause();
        }
    }

    pub fn restart(&mut self) {
        if self.current.supports_pause() {
            self.current.restart();
        }
    }

    pub fn settings_called(&mut self) {
        self.current.settings_called();
    }

    pub fn save_state(&self, settings: &mut dyn SettingsStore) -> Result<()> {
        settings.set_value(DOCK_TYPE_KEY, self.kind().index().to_string());
        self.current.save_state(settings)
    }

    /// Reselect the saved kind (levels if none saved), then restore it
    pub fn restore_state(&mut self, settings: &dyn SettingsStore) -> Result<()> {
        let kind = match settings.value(DOCK_TYPE_KEY) {
            Some(raw) => {
                let index: usize = raw.trim().parse().map_err(|_| {
                    MeterError::Settings(format!("{}: invalid index {:?}", DOCK_TYPE_KEY, raw))
                })?;
                VisualizerKind::try_from(index)?
            }
            None => VisualizerKind::default(),
        };
        self.select(kind)?;
        self.current.restore_state(settings)
    }
}
