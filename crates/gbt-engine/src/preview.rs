//! Single-instrument playback outside the song, for auditioning in an editor.

use gbt_ir::{ChannelId, Instrument, WaveTable, NOTE_NOISE_LAST};

use crate::channel::{envelope_has_slope, layout, noise_step_width, write_envelope, write_timbre, Noise};
use crate::device::SoundDevice;
use crate::frequency_engine::{NoiseFrequencyEngine, ToneFrequencyEngine};
use crate::instrument_engine::InstrumentEngine;
use crate::note_control::NoteControl;

/// Pitch state for whichever channel the instrument targets.
#[derive(Clone, Debug)]
enum PreviewPitch {
    Tone(ToneFrequencyEngine),
    Noise(NoiseFrequencyEngine),
}

impl PreviewPitch {
    fn for_channel(channel: ChannelId) -> Self {
        if channel.is_noise() {
            PreviewPitch::Noise(NoiseFrequencyEngine::new())
        } else {
            PreviewPitch::Tone(ToneFrequencyEngine::new())
        }
    }
}

/// Plays one instrument on its own channel.
///
/// Mirrors the sequencer's channel update: note control decides when the
/// note starts and stops, the frequency engine runs the instrument's pitch
/// and arpeggio sequences, and the instrument program runs on every frame.
#[derive(Clone, Debug)]
pub struct InstrumentPreview {
    channel: ChannelId,
    note: NoteControl,
    pitch: PreviewPitch,
    program: InstrumentEngine,
    timbre: u8,
    panning: u8,
    auto_retrigger: bool,
    /// Last NR43 value written by the noise pitch
    noise_written: Option<u8>,
}

impl Default for InstrumentPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentPreview {
    pub fn new() -> Self {
        Self {
            channel: ChannelId::Ch1,
            note: NoteControl::new(),
            pitch: PreviewPitch::for_channel(ChannelId::Ch1),
            program: InstrumentEngine::new(ChannelId::Ch1),
            timbre: 3,
            panning: 0b11,
            auto_retrigger: false,
            noise_written: None,
        }
    }

    /// Load `instrument` and write its envelope and timbre. The channel
    /// stays silent until the next [`play_note`](Self::play_note).
    pub fn set_instrument(&mut self, instrument: &Instrument, device: &mut impl SoundDevice, waves: &WaveTable) {
        let channel = instrument.channel;
        self.channel = channel;
        self.note.reset();
        self.pitch = PreviewPitch::for_channel(channel);
        match &mut self.pitch {
            PreviewPitch::Tone(fe) => {
                fe.set_pitch_sequence(instrument.pitch.clone());
                fe.set_arp_sequence(instrument.arpeggio.clone());
            }
            PreviewPitch::Noise(fe) => {
                fe.set_pitch_sequence(instrument.pitch.clone());
                fe.set_arp_sequence(instrument.arpeggio.clone());
            }
        }
        self.program = InstrumentEngine::with_program(channel, instrument.program());
        self.timbre = instrument.timbre;
        self.panning = instrument.panning;
        self.auto_retrigger = envelope_has_slope(channel, instrument.envelope);
        self.noise_written = None;

        write_envelope(device, channel, instrument.envelope, waves);
        write_timbre(device, channel, instrument.timbre);
        device.set_channel_output(channel, false, false);
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn is_playing(&self) -> bool {
        self.note.is_playing()
    }

    /// Start `note` on the next step.
    pub fn play_note(&mut self, note: u8) {
        self.note.note_trigger(note, 0);
    }

    /// Cut the note on the next step.
    pub fn stop(&mut self) {
        self.note.note_cut(0);
    }

    /// Run one frame.
    pub fn step(&mut self, device: &mut impl SoundDevice, waves: &WaveTable) {
        let channel = self.channel;
        let triggered = self.note.step();

        if !self.note.is_playing() {
            device.set_channel_output(channel, false, false);
            return;
        }

        if triggered.is_some() {
            self.program.reset();
        }

        let row_frequency = match &mut self.pitch {
            PreviewPitch::Tone(fe) => {
                if let Some(note) = triggered {
                    fe.set_note(note);
                    fe.apply();
                }
                fe.step();
                let freq = fe.frequency();
                if !self.program.is_running() {
                    device.set_frequency(channel, freq);
                }
                freq
            }
            PreviewPitch::Noise(fe) => {
                if let Some(note) = triggered.filter(|&n| n <= NOTE_NOISE_LAST) {
                    fe.set_note(note);
                    fe.apply();
                }
                fe.step();
                let value = Noise::register(fe.frequency()) | noise_step_width(self.timbre);
                if triggered.is_some() || self.noise_written != Some(value) {
                    device.write_register(layout(channel).nrx3(), value);
                    self.noise_written = Some(value);
                }
                0
            }
        };

        if triggered.is_some() {
            if self.auto_retrigger {
                device.restart(channel);
            }
            device.set_channel_output(channel, self.panning & 0b10 != 0, self.panning & 0b01 != 0);
        }

        self.program.step(device, waves, row_frequency);
    }
}
