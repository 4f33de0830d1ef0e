//! Headless controller for gbtracker.
//!
//! Owns a module and runs it through the engine offline, collecting the
//! per-frame reports and every sound device write. Both the CLI and the
//! integration tests drive playback through this API.

mod demo;
mod trace;

use gbt_engine::{InstrumentPreview, RegisterLog, Sequencer, SequencerError};
use log::{debug, info};
use thiserror::Error;

// Re-export common types so callers don't need gbt-ir/gbt-engine directly.
pub use gbt_engine::{DeviceWrite, Frame};
pub use gbt_ir::{Module, Song};

pub use demo::demo_module;
pub use trace::{trace_to_bytes, write_trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error("no instrument with id {0:02X}")]
    UnknownInstrument(u8),
}

/// Frames reserved up front by [`Controller::render`]. Longer renders grow
/// the buffer as they go.
const RESERVED_FRAMES: usize = 3600;

/// Options for an offline render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub start_order: usize,
    pub start_row: u16,
    /// Stop after this many frames even if the song has not halted
    pub max_frames: usize,
    /// Loop the starting pattern instead of following the order list
    pub pattern_repeat: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            start_order: 0,
            start_row: 0,
            // one minute at the Game Boy frame rate
            max_frames: 3600,
            pattern_repeat: false,
        }
    }
}

/// One stepped frame and the device writes it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    pub frame: Frame,
    pub writes: Vec<DeviceWrite>,
}

/// Result of an offline render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Render {
    pub frames: Vec<RenderedFrame>,
}

impl Render {
    /// True if playback reached a halt effect.
    pub fn halted(&self) -> bool {
        self.frames.last().is_some_and(|f| f.frame.halted)
    }

    pub fn total_writes(&self) -> usize {
        self.frames.iter().map(|f| f.writes.len()).sum()
    }

    /// All writes in order, without frame boundaries.
    pub fn writes(&self) -> impl Iterator<Item = &DeviceWrite> {
        self.frames.iter().flat_map(|f| f.writes.iter())
    }
}

/// Headless tracker controller. Owns a module and renders it.
pub struct Controller {
    module: Module,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            module: Module::default(),
        }
    }

    pub fn with_module(module: Module) -> Self {
        Self { module }
    }

    // --- Module management ---

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn load(&mut self, module: Module) {
        debug!("loaded module \"{}\"", module.song.title);
        self.module = module;
    }

    // --- Offline rendering ---

    /// Play the song from the configured position until it halts or
    /// `max_frames` have been stepped.
    pub fn render(&self, config: &RenderConfig) -> Result<Render, RenderError> {
        let mut sequencer = Sequencer::new(&self.module, config.start_order, config.start_row)?;
        sequencer.set_pattern_repeat(config.pattern_repeat);

        let mut device = RegisterLog::new();
        let mut frames = Vec::with_capacity(config.max_frames.min(RESERVED_FRAMES));
        while frames.len() < config.max_frames {
            let finished = sequencer.step(&mut device);
            frames.push(RenderedFrame {
                frame: sequencer.frame(),
                writes: device.drain(),
            });
            if finished {
                break;
            }
        }

        let render = Render { frames };
        info!(
            "rendered {} frames, {} writes{}",
            render.frames.len(),
            render.total_writes(),
            if render.halted() { ", halted" } else { "" }
        );
        Ok(render)
    }

    /// Audition instrument `id` on `note`, held for `hold` frames and then
    /// released for `release` frames. Returns the writes of each frame.
    pub fn preview_instrument(
        &self,
        id: u8,
        note: u8,
        hold: usize,
        release: usize,
    ) -> Result<Vec<Vec<DeviceWrite>>, RenderError> {
        let instrument = self
            .module
            .instruments
            .get(id)
            .ok_or(RenderError::UnknownInstrument(id))?;
        let waves = &self.module.waveforms;

        let mut preview = InstrumentPreview::new();
        let mut device = RegisterLog::new();
        preview.set_instrument(instrument, &mut device, waves);
        preview.play_note(note);

        let mut frames = Vec::with_capacity(hold + release + 1);
        frames.push(device.drain());
        for i in 0..hold + release {
            if i == hold {
                preview.stop();
            }
            preview.step(&mut device, waves);
            frames.push(device.drain());
        }
        Ok(frames)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
