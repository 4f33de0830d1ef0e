//! Row and pattern sequencer.
//!
//! Drives song playback one frame at a time. On the first frame of each
//! row the sequencer resolves any pending pattern command, decodes the
//! row on all four channels and routes each effect by category. Every
//! frame it then advances note control, the frequency engines and the
//! instrument programs, writing the results to the sound device.
//!
//! Nothing on the per-frame path allocates or fails: bad effect
//! parameters are ignored and every index is checked against the song
//! before use.

use gbt_ir::{
    ChannelId, Effect, EffectCategory, EffectType, Module, Note, Row, Speed, CHANNEL_COUNT,
    NOTE_LAST, NOTE_NOISE_LAST,
};
use log::debug;
use thiserror::Error;

use crate::channel::{
    layout, noise_step_width, panning_bits, panning_mask, write_envelope, write_timbre,
    ChannelSettings,
};
use crate::device::{SoundDevice, REG_NR10};
use crate::frame::Frame;
use crate::frequency::noise_register;
use crate::frequency_engine::ToneFrequencyEngine;
use crate::instrument_engine::InstrumentEngine;
use crate::note_control::NoteControl;
use crate::timer::RowTimer;

/// Tone and wave channels; the noise channel has no frequency engine.
const TONE_CHANNELS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error("song has an empty order list")]
    EmptyOrder,

    #[error("start order {order} outside order list of {len}")]
    OrderOutOfRange { order: usize, len: usize },

    #[error("start row {row} outside pattern of {rows} rows")]
    RowOutOfRange { row: u16, rows: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    Running,
    Halted,
}

/// Pending change of position, applied at the start of the next row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatternCommand {
    #[default]
    None,
    /// Advance to the next order, starting at this row
    Next(u16),
    /// Go to row 0 of this order
    Jump(usize),
}

/// Playback position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub order: usize,
    pub row: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowOutcome {
    Continue,
    Halt,
}

/// Per-channel playback state.
#[derive(Clone, Debug)]
struct ChannelRuntime {
    settings: ChannelSettings,
    note: NoteControl,
    instrument: InstrumentEngine,
    /// Instrument id from the last row that named one
    selected_instrument: Option<u8>,
    playing: bool,
}

impl ChannelRuntime {
    fn new(channel: ChannelId) -> Self {
        Self {
            settings: ChannelSettings::new(channel),
            note: NoteControl::new(),
            instrument: InstrumentEngine::new(channel),
            selected_instrument: None,
            playing: false,
        }
    }
}

/// Song player borrowing a [`Module`] for its lifetime.
pub struct Sequencer<'a> {
    module: &'a Module,
    state: SequencerState,
    cursor: Cursor,
    command: PatternCommand,
    timer: RowTimer,
    pattern_repeat: bool,
    channels: [ChannelRuntime; CHANNEL_COUNT],
    tones: [ToneFrequencyEngine; TONE_CHANNELS],
    /// NR51 value the channels want
    panning: u8,
    /// NR51 value last written
    panning_written: u8,
    new_pattern: bool,
    frame: Frame,
}

impl<'a> Sequencer<'a> {
    /// Start playback of `module` at (`start_order`, `start_row`).
    pub fn new(module: &'a Module, start_order: usize, start_row: u16) -> Result<Self, SequencerError> {
        let song = &module.song;
        let len = song.order_len();
        if len == 0 {
            return Err(SequencerError::EmptyOrder);
        }
        if start_order >= len {
            return Err(SequencerError::OrderOutOfRange { order: start_order, len });
        }
        let rows = song.rows_per_pattern();
        if start_row >= rows {
            return Err(SequencerError::RowOutOfRange { row: start_row, rows });
        }

        debug!(
            "sequencer start: order {:02X} row {:02X} speed {}",
            start_order,
            start_row,
            song.speed()
        );

        Ok(Self {
            module,
            state: SequencerState::Running,
            cursor: Cursor { order: start_order, row: start_row },
            command: PatternCommand::None,
            timer: RowTimer::new(song.speed()),
            pattern_repeat: false,
            channels: ChannelId::ALL.map(ChannelRuntime::new),
            tones: Default::default(),
            panning: 0,
            panning_written: 0,
            new_pattern: true,
            frame: Frame::start(song.speed(), start_order as u8, start_row),
        })
    }

    // --- Caller controls ---

    /// Loop the current pattern instead of advancing the order.
    pub fn set_pattern_repeat(&mut self, repeat: bool) {
        self.pattern_repeat = repeat;
    }

    pub fn pattern_repeat(&self) -> bool {
        self.pattern_repeat
    }

    /// Move to row 0 of `order`, starting it on the next step. Replaces
    /// any pending pattern command. Out-of-range orders are ignored.
    pub fn jump(&mut self, order: usize) {
        if order < self.module.song.order_len() {
            self.cursor = Cursor { order, row: 0 };
            self.command = PatternCommand::None;
            self.new_pattern = true;
            self.timer.reset();
        }
    }

    /// Stop playback. Further steps return true without writing.
    pub fn halt(&mut self) {
        if self.state != SequencerState::Halted {
            debug!("sequencer halted at order {:02X} row {:02X}", self.cursor.order, self.cursor.row);
        }
        self.state = SequencerState::Halted;
        self.frame.halted = true;
    }

    // --- Inspection ---

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == SequencerState::Halted
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn pending_command(&self) -> PatternCommand {
        self.command
    }

    pub fn speed(&self) -> Speed {
        self.timer.period()
    }

    /// Report for the most recent step.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Frequency engine of a tone or wave channel.
    pub fn frequency_engine(&self, channel: ChannelId) -> Option<&ToneFrequencyEngine> {
        self.tones.get(channel.index())
    }

    pub fn channel_settings(&self, channel: ChannelId) -> &ChannelSettings {
        &self.channels[channel.index()].settings
    }

    pub fn is_channel_playing(&self, channel: ChannelId) -> bool {
        self.channels[channel.index()].playing
    }

    // --- Playback ---

    /// Run one frame. Returns true once halted.
    pub fn step(&mut self, device: &mut impl SoundDevice) -> bool {
        self.frame.started_new_row = false;
        self.frame.started_new_pattern = false;
        if self.state == SequencerState::Halted {
            self.frame.halted = true;
            return true;
        }

        if self.timer.active() {
            self.apply_command();
            self.frame.started_new_row = true;
            self.frame.started_new_pattern = core::mem::take(&mut self.new_pattern);
            self.frame.order = self.cursor.order as u8;
            self.frame.row = self.cursor.row;

            if self.decode_row(device) == RowOutcome::Halt {
                self.halt();
                return true;
            }
        }

        self.update_channels(device);

        if self.timer.step() {
            self.advance_row();
        }

        self.frame.speed = self.timer.period();
        self.frame.time = self.frame.time.wrapping_add(1);
        false
    }

    fn apply_command(&mut self) {
        let len = self.module.song.order_len();
        let rows = self.module.song.rows_per_pattern();
        let command = core::mem::take(&mut self.command);
        if self.pattern_repeat {
            // any pending command restarts the current pattern
            if command != PatternCommand::None {
                self.cursor.row = 0;
                self.new_pattern = true;
            }
            return;
        }
        match command {
            PatternCommand::None => {}
            PatternCommand::Next(row) => {
                self.cursor.order = (self.cursor.order + 1) % len;
                self.cursor.row = row.min(rows - 1);
                self.new_pattern = true;
            }
            PatternCommand::Jump(order) => {
                self.cursor.order = order.min(len - 1);
                self.cursor.row = 0;
                self.new_pattern = true;
            }
        }
    }

    fn advance_row(&mut self) {
        self.cursor.row += 1;
        if self.cursor.row >= self.module.song.rows_per_pattern() {
            if self.command == PatternCommand::None {
                self.command = PatternCommand::Next(0);
            }
            // held at the last row until the command applies
            self.cursor.row -= 1;
        }
    }

    fn decode_row(&mut self, device: &mut impl SoundDevice) -> RowOutcome {
        let module = self.module;
        let Some(pattern) = module.song.pattern(self.cursor.order) else {
            return RowOutcome::Continue;
        };
        for channel in ChannelId::ALL {
            let row = pattern.row(channel, self.cursor.row);
            if self.apply_row(channel, &row, pattern.rows(), device) == RowOutcome::Halt {
                return RowOutcome::Halt;
            }
        }
        RowOutcome::Continue
    }

    fn apply_row(
        &mut self,
        channel: ChannelId,
        row: &Row,
        rows: u16,
        device: &mut impl SoundDevice,
    ) -> RowOutcome {
        let index = channel.index();
        let mut delay = 0;
        let mut apply_now = false;

        for &effect in row.effects() {
            match effect.category() {
                EffectCategory::Pattern => {
                    if self.pattern_effect(effect, rows) == RowOutcome::Halt {
                        return RowOutcome::Halt;
                    }
                }
                EffectCategory::Track => self.track_effect(channel, effect, &mut delay, device),
                EffectCategory::Frequency => {
                    if let Some(fe) = self.tones.get_mut(index) {
                        apply_now |= fe.set_effect(effect);
                    }
                }
            }
        }

        let runtime = &mut self.channels[index];
        if let Some(id) = row.instrument {
            runtime.selected_instrument = Some(id);
        }
        let triggers = match row.note {
            Note::On(note) if note <= NOTE_LAST => {
                runtime.note.note_trigger(note, delay);
                true
            }
            Note::Cut => {
                runtime.note.note_cut(delay);
                false
            }
            _ => false,
        };
        // without a trigger the new frequency effects take hold right away
        if !triggers && apply_now {
            if let Some(fe) = self.tones.get_mut(index) {
                fe.apply();
            }
        }
        RowOutcome::Continue
    }

    fn pattern_effect(&mut self, effect: Effect, rows: u16) -> RowOutcome {
        let param = effect.param;
        match effect.kind {
            EffectType::PatternGoto => {
                if (param as usize) < self.module.song.order_len() {
                    self.command = PatternCommand::Jump(param as usize);
                }
            }
            EffectType::PatternHalt => return RowOutcome::Halt,
            EffectType::PatternSkip => {
                if (param as u16) < rows {
                    self.command = PatternCommand::Next(param as u16);
                }
            }
            EffectType::SetTempo => {
                if let Some(speed) = Speed::new(param) {
                    self.timer.set_period(speed);
                }
            }
            _ => {}
        }
        RowOutcome::Continue
    }

    fn track_effect(
        &mut self,
        channel: ChannelId,
        effect: Effect,
        delay: &mut u8,
        device: &mut impl SoundDevice,
    ) {
        let param = effect.param;
        let runtime = &mut self.channels[channel.index()];
        match effect.kind {
            EffectType::SetEnvelope => {
                runtime.settings.set_envelope(channel, param);
                write_envelope(device, channel, param, &self.module.waveforms);
                device.restart(channel);
            }
            EffectType::SetTimbre => {
                runtime.settings.timbre = param & 3;
                write_timbre(device, channel, param & 3);
            }
            EffectType::SetPanning => {
                let Some(panning) = decode_panning(param) else {
                    return;
                };
                runtime.settings.panning = panning;
                if runtime.playing {
                    self.panning = (self.panning & !panning_mask(channel)) | panning_bits(channel, panning);
                }
            }
            EffectType::SetSweep => {
                if channel == ChannelId::Ch1 {
                    device.write_register(REG_NR10, param);
                }
            }
            EffectType::DelayedCut => runtime.note.note_cut(param),
            EffectType::DelayedNote => *delay = param,
            _ => {}
        }
    }

    fn update_channels(&mut self, device: &mut impl SoundDevice) {
        let module = self.module;
        for channel in ChannelId::ALL {
            let index = channel.index();
            let triggered = self.channels[index].note.step();
            let playing = self.channels[index].note.is_playing();

            if playing {
                if triggered.is_some() {
                    self.bind_instrument(channel);
                }

                let runtime = &mut self.channels[index];
                let row_frequency = match self.tones.get_mut(index) {
                    Some(fe) => {
                        if let Some(note) = triggered {
                            fe.set_note(note);
                            fe.apply();
                        }
                        fe.step();
                        let freq = fe.frequency();
                        // a running program writes the offset frequency itself
                        if !runtime.instrument.is_running() {
                            device.set_frequency(channel, freq);
                        }
                        freq
                    }
                    None => {
                        if let Some(note) = triggered.filter(|&n| n <= NOTE_NOISE_LAST) {
                            let value = noise_register(note) | noise_step_width(runtime.settings.timbre);
                            device.write_register(layout(channel).nrx3(), value);
                        }
                        0
                    }
                };

                if triggered.is_some() {
                    if runtime.settings.auto_retrigger {
                        device.restart(channel);
                    }
                    self.panning = (self.panning & !panning_mask(channel))
                        | panning_bits(channel, runtime.settings.panning);
                }

                runtime.instrument.step(device, &module.waveforms, row_frequency);
            } else if self.channels[index].playing {
                self.panning &= !panning_mask(channel);
            }

            self.channels[index].playing = playing;
        }

        if self.panning != self.panning_written {
            device.set_output_enable(self.panning);
            self.panning_written = self.panning;
        }
    }

    /// Rebind the selected instrument's program and sequences on a trigger.
    fn bind_instrument(&mut self, channel: ChannelId) {
        let index = channel.index();
        let runtime = &mut self.channels[index];
        let Some(id) = runtime.selected_instrument else {
            return;
        };
        match self.module.instruments.get(id) {
            Some(instrument) => {
                runtime.instrument.set_program(instrument.program());
                if let Some(fe) = self.tones.get_mut(index) {
                    fe.set_pitch_sequence(instrument.pitch.clone());
                    fe.set_arp_sequence(instrument.arpeggio.clone());
                }
            }
            None => runtime.instrument.clear(),
        }
    }
}

/// Ixy parameter to 2-bit panning (bit 1 left, bit 0 right).
fn decode_panning(param: u8) -> Option<u8> {
    match param {
        0x00 => Some(0b00),
        0x01 => Some(0b01),
        0x10 => Some(0b10),
        0x11 => Some(0b11),
        _ => None,
    }
}
