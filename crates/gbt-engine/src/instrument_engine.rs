//! Instrument bytecode interpreter.
//!
//! An instrument program is a byte stream executed one command per
//! frame. Each command starts with a header byte:
//!
//! Control byte (bit 7 clear, non-zero):
//!
//! | bit | meaning |
//! |---|---|
//! | 6 | retrigger after applying the command |
//! | 5 | aux1 byte follows (sweep on CH1, NR43 on CH4) |
//! | 4 | aux2 byte follows (envelope, or waveform id on CH3) |
//! | 3 | settings enable |
//! | 2-1 | settings value (duty, or wave output level on CH3) |
//! | 0 | extended byte follows |
//!
//! Extended byte (bit 7 set), either after a control byte or on its own:
//!
//! | bit | meaning |
//! |---|---|
//! | 6 | coarse tune byte follows (signed) |
//! | 5 | fine tune byte follows (signed, applied << 4) |
//! | 4 | panning enable |
//! | 3-2 | panning value, bit 3 left, bit 2 right |
//!
//! Operand bytes follow the header(s) in the order extended, aux1, aux2,
//! tune, fine. A zero byte is a one-frame no-op.

use gbt_ir::{ChannelId, WaveTable, MAX_PROGRAM_LEN};
use heapless::Vec;

use crate::channel::{layout, write_envelope, write_timbre, Aux1};
use crate::device::SoundDevice;
use crate::frequency::GB_MAX_FREQUENCY;

const CTRL_RETRIGGER: u8 = 0x40;
const CTRL_AUX1: u8 = 0x20;
const CTRL_AUX2: u8 = 0x10;
const CTRL_SETTINGS: u8 = 0x08;
const CTRL_SETTINGS_SHIFT: u8 = 1;
const CTRL_EXTENDED: u8 = 0x01;

const EXT_TAG: u8 = 0x80;
const EXT_TUNE: u8 = 0x40;
const EXT_FINE: u8 = 0x20;
const EXT_PANNING: u8 = 0x10;
const EXT_PANNING_SHIFT: u8 = 2;

/// Longest encoded command: control, extended, aux1, aux2, tune, fine.
pub const MAX_COMMAND_LEN: usize = 6;

/// One decoded program command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Command {
    pub retrigger: bool,
    pub aux1: Option<u8>,
    pub aux2: Option<u8>,
    /// 2-bit settings value
    pub settings: Option<u8>,
    pub tune: Option<i8>,
    pub fine: Option<i8>,
    /// 2-bit panning, bit 1 left, bit 0 right
    pub panning: Option<u8>,
}

impl Command {
    fn has_control(&self) -> bool {
        self.retrigger || self.aux1.is_some() || self.aux2.is_some() || self.settings.is_some()
    }

    fn has_extended(&self) -> bool {
        self.tune.is_some() || self.fine.is_some() || self.panning.is_some()
    }

    /// Decode the command at the start of `bytes`. Returns the command and
    /// its length, or `None` for an empty or truncated stream.
    pub fn decode(bytes: &[u8]) -> Option<(Command, usize)> {
        let mut cursor = bytes.iter().copied();
        let header = cursor.next()?;
        let mut cmd = Command::default();
        let mut len = 1;

        let extended = if header & EXT_TAG != 0 {
            Some(header)
        } else if header & CTRL_EXTENDED != 0 {
            len += 1;
            Some(cursor.next()?)
        } else {
            None
        };

        if header & EXT_TAG == 0 {
            cmd.retrigger = header & CTRL_RETRIGGER != 0;
            if header & CTRL_AUX1 != 0 {
                cmd.aux1 = Some(cursor.next()?);
                len += 1;
            }
            if header & CTRL_AUX2 != 0 {
                cmd.aux2 = Some(cursor.next()?);
                len += 1;
            }
            if header & CTRL_SETTINGS != 0 {
                cmd.settings = Some((header >> CTRL_SETTINGS_SHIFT) & 3);
            }
        }

        if let Some(ext) = extended {
            if ext & EXT_TUNE != 0 {
                cmd.tune = Some(cursor.next()? as i8);
                len += 1;
            }
            if ext & EXT_FINE != 0 {
                cmd.fine = Some(cursor.next()? as i8);
                len += 1;
            }
            if ext & EXT_PANNING != 0 {
                cmd.panning = Some((ext >> EXT_PANNING_SHIFT) & 3);
            }
        }

        Some((cmd, len))
    }

    /// Encode into the shortest byte form.
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        let mut ext = 0u8;
        if self.has_extended() {
            ext = EXT_TAG;
            if self.tune.is_some() {
                ext |= EXT_TUNE;
            }
            if self.fine.is_some() {
                ext |= EXT_FINE;
            }
            if let Some(p) = self.panning {
                ext |= EXT_PANNING | ((p & 3) << EXT_PANNING_SHIFT);
            }
        }

        // Every push below stays within MAX_COMMAND_LEN.
        let mut out = Vec::new();
        if self.has_control() {
            let mut ctrl = 0u8;
            if self.retrigger {
                ctrl |= CTRL_RETRIGGER;
            }
            if self.aux1.is_some() {
                ctrl |= CTRL_AUX1;
            }
            if self.aux2.is_some() {
                ctrl |= CTRL_AUX2;
            }
            if let Some(s) = self.settings {
                ctrl |= CTRL_SETTINGS | ((s & 3) << CTRL_SETTINGS_SHIFT);
            }
            if ext != 0 {
                ctrl |= CTRL_EXTENDED;
            }
            let _ = out.push(ctrl);
            if ext != 0 {
                let _ = out.push(ext);
            }
            if let Some(v) = self.aux1 {
                let _ = out.push(v);
            }
            if let Some(v) = self.aux2 {
                let _ = out.push(v);
            }
        } else if ext != 0 {
            let _ = out.push(ext);
        } else {
            let _ = out.push(0);
        }
        if let Some(t) = self.tune {
            let _ = out.push(t as u8);
        }
        if let Some(f) = self.fine {
            let _ = out.push(f as u8);
        }
        out
    }
}

/// Program state for one channel.
///
/// Rebinding a program replaces the whole state: counter and offsets go
/// back to zero and the engine runs again if the program holds a complete
/// command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentEngine {
    channel: ChannelId,
    program: Vec<u8, MAX_PROGRAM_LEN>,
    pc: usize,
    coarse_pitch: i8,
    fine_pitch: i8,
    running: bool,
}

impl InstrumentEngine {
    /// An engine with no program.
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    /// An engine bound to `program`. Programs that do not fit are dropped.
    pub fn with_program(channel: ChannelId, program: &[u8]) -> Self {
        let mut engine = Self {
            channel,
            program: Vec::from_slice(program).unwrap_or_default(),
            ..Self::default()
        };
        engine.running = engine.has_command();
        engine
    }

    pub fn set_program(&mut self, program: &[u8]) {
        *self = Self::with_program(self.channel, program);
    }

    /// Drop the program.
    pub fn clear(&mut self) {
        *self = Self::new(self.channel);
    }

    /// Restart the bound program from the top.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.coarse_pitch = 0;
        self.fine_pitch = 0;
        self.running = self.has_command();
    }

    /// True while a complete command remains at the program counter.
    fn has_command(&self) -> bool {
        Command::decode(&self.program[self.pc..]).is_some()
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    pub fn coarse_pitch(&self) -> i8 {
        self.coarse_pitch
    }

    pub fn fine_pitch(&self) -> i8 {
        self.fine_pitch
    }

    /// Execute one command and write the channel frequency.
    pub fn step(&mut self, device: &mut impl SoundDevice, waves: &WaveTable, row_frequency: u16) {
        if !self.running {
            return;
        }
        let Some((cmd, len)) = Command::decode(&self.program[self.pc..]) else {
            self.running = false;
            return;
        };
        self.pc += len;

        let channel = self.channel;
        let layout = layout(channel);

        if let Some(value) = cmd.aux1 {
            match layout.aux1 {
                Aux1::Sweep => device.write_register(layout.nrx0(), value),
                Aux1::Noise => device.write_register(layout.nrx3(), value),
                Aux1::Unused => {}
            }
        }
        if let Some(value) = cmd.aux2 {
            write_envelope(device, channel, value, waves);
        }
        if let Some(value) = cmd.settings {
            write_timbre(device, channel, value);
        }
        if let Some(tune) = cmd.tune {
            self.coarse_pitch = tune;
        }
        if let Some(fine) = cmd.fine {
            self.fine_pitch = fine;
        }
        if let Some(panning) = cmd.panning {
            device.set_channel_output(channel, panning & 0b10 != 0, panning & 0b01 != 0);
        }

        if !channel.is_noise() {
            let freq = row_frequency as i32 + self.coarse_pitch as i32 + ((self.fine_pitch as i32) << 4);
            device.set_frequency(channel, freq.clamp(0, GB_MAX_FREQUENCY as i32) as u16);
        }

        if cmd.retrigger {
            device.restart(channel);
        }

        self.running = self.has_command();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceWrite, RegisterLog, REG_NR10, REG_NR30, REG_NR43};
    use gbt_ir::Waveform;

    fn program(cmds: &[Command]) -> alloc::vec::Vec<u8> {
        cmds.iter().flat_map(|c| c.encode()).collect()
    }

    #[test]
    fn decode_control_with_extended() {
        // retrigger, aux2, settings=2, extended: tune + panning left
        let bytes = [0x40 | 0x10 | 0x08 | 0x04 | 0x01, 0x80 | 0x40 | 0x10 | 0x08, 0xF3, 0xFE];
        let (cmd, len) = Command::decode(&bytes).unwrap();
        assert_eq!(len, 4);
        assert_eq!(
            cmd,
            Command {
                retrigger: true,
                aux2: Some(0xF3),
                settings: Some(2),
                tune: Some(-2),
                panning: Some(0b10),
                ..Command::default()
            }
        );
    }

    #[test]
    fn decode_lone_extended_and_zero() {
        let (cmd, len) = Command::decode(&[0xA0, 0x01]).unwrap();
        assert_eq!(len, 2);
        assert_eq!(cmd.fine, Some(1));
        assert!(!cmd.retrigger);

        let (cmd, len) = Command::decode(&[0x00, 0x40]).unwrap();
        assert_eq!(len, 1);
        assert_eq!(cmd, Command::default());
    }

    #[test]
    fn decode_rejects_truncation() {
        assert_eq!(Command::decode(&[]), None);
        assert_eq!(Command::decode(&[0x20]), None);
        assert_eq!(Command::decode(&[0x01]), None);
        assert_eq!(Command::decode(&[0xC0]), None);
    }

    #[test]
    fn encode_decode_agree() {
        let cmd = Command {
            aux1: Some(0x12),
            settings: Some(1),
            fine: Some(-1),
            ..Command::default()
        };
        let bytes = cmd.encode();
        assert_eq!(Command::decode(&bytes), Some((cmd, bytes.len())));
        assert_eq!(Command::default().encode().as_slice(), [0]);
    }

    #[test]
    fn empty_program_never_runs() {
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch1, &[]);
        assert!(!ie.is_running());
        let mut log = RegisterLog::new();
        ie.step(&mut log, &WaveTable::new(), 0x500);
        assert!(log.is_empty());
    }

    #[test]
    fn oversized_program_is_dropped() {
        let ie = InstrumentEngine::with_program(ChannelId::Ch1, &[0; MAX_PROGRAM_LEN + 1]);
        assert!(!ie.is_running());
    }

    #[test]
    fn one_command_per_step_with_pitch_write() {
        let prog = program(&[
            Command { aux2: Some(0xF1), retrigger: true, ..Command::default() },
            Command { tune: Some(3), ..Command::default() },
            Command::default(),
        ]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch2, &prog);
        let waves = WaveTable::new();
        let mut log = RegisterLog::new();

        ie.step(&mut log, &waves, 0x600);
        assert_eq!(
            log.drain(),
            [
                DeviceWrite::Register { address: 0xFF17, value: 0xF1 },
                DeviceWrite::Frequency { channel: ChannelId::Ch2, value: 0x600 },
                DeviceWrite::Restart(ChannelId::Ch2),
            ]
        );

        ie.step(&mut log, &waves, 0x600);
        assert_eq!(log.drain(), [DeviceWrite::Frequency { channel: ChannelId::Ch2, value: 0x603 }]);

        // no-op command still writes pitch
        ie.step(&mut log, &waves, 0x610);
        assert_eq!(log.drain(), [DeviceWrite::Frequency { channel: ChannelId::Ch2, value: 0x613 }]);
    }

    #[test]
    fn exhausted_program_stops_writing_and_keeps_offsets() {
        let prog = program(&[Command { tune: Some(-4), fine: Some(1), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch1, &prog);
        let waves = WaveTable::new();
        let mut log = RegisterLog::new();
        assert!(ie.is_running());
        ie.step(&mut log, &waves, 0x400);
        assert_eq!(log.drain(), [DeviceWrite::Frequency { channel: ChannelId::Ch1, value: 0x400 - 4 + 16 }]);
        // stops as soon as nothing is left to run
        assert!(!ie.is_running());

        for _ in 0..3 {
            ie.step(&mut log, &waves, 0x400);
        }
        assert!(log.is_empty());
        assert!(!ie.is_running());
        assert_eq!((ie.coarse_pitch(), ie.fine_pitch()), (-4, 1));
    }

    #[test]
    fn pitch_write_clamps() {
        let prog = program(&[Command { fine: Some(127), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch1, &prog);
        let mut log = RegisterLog::new();
        ie.step(&mut log, &WaveTable::new(), 0x7F0);
        assert_eq!(log.frequencies(ChannelId::Ch1).collect::<alloc::vec::Vec<_>>(), [GB_MAX_FREQUENCY]);

        let prog = program(&[Command { tune: Some(-128), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch1, &prog);
        log.clear();
        ie.step(&mut log, &WaveTable::new(), 0x10);
        assert_eq!(log.frequencies(ChannelId::Ch1).collect::<alloc::vec::Vec<_>>(), [0]);
    }

    #[test]
    fn aux_bytes_follow_channel_layout() {
        let cmd = program(&[Command { aux1: Some(0x35), ..Command::default() }]);
        let waves = WaveTable::new();
        let mut log = RegisterLog::new();

        InstrumentEngine::with_program(ChannelId::Ch1, &cmd).step(&mut log, &waves, 0);
        assert_eq!(log.writes()[0], DeviceWrite::Register { address: REG_NR10, value: 0x35 });

        log.clear();
        InstrumentEngine::with_program(ChannelId::Ch4, &cmd).step(&mut log, &waves, 0);
        assert_eq!(log.writes(), [DeviceWrite::Register { address: REG_NR43, value: 0x35 }]);

        log.clear();
        InstrumentEngine::with_program(ChannelId::Ch2, &cmd).step(&mut log, &waves, 0);
        assert_eq!(log.writes(), [DeviceWrite::Frequency { channel: ChannelId::Ch2, value: 0 }]);
    }

    #[test]
    fn aux2_on_wave_channel_loads_waveform() {
        let mut waves = WaveTable::new();
        waves.insert(2, Waveform::new("tri", [0x5A; 16])).unwrap();
        let prog = program(&[Command { aux2: Some(2), settings: Some(3), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch3, &prog);
        let mut log = RegisterLog::new();
        ie.step(&mut log, &waves, 0x300);
        let writes = log.writes();
        assert_eq!(writes[0], DeviceWrite::Register { address: REG_NR30, value: 0 });
        assert_eq!(writes.len(), 18 + 2);
        assert_eq!(writes[18], DeviceWrite::Register { address: 0xFF1C, value: 0x20 });
    }

    #[test]
    fn panning_sets_channel_output() {
        let prog = program(&[Command { panning: Some(0b01), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch4, &prog);
        let mut log = RegisterLog::new();
        ie.step(&mut log, &WaveTable::new(), 0);
        assert_eq!(
            log.writes(),
            [DeviceWrite::ChannelOutput { channel: ChannelId::Ch4, left: false, right: true }]
        );
    }

    #[test]
    fn rebind_resets_state() {
        let prog = program(&[Command { tune: Some(5), ..Command::default() }]);
        let mut ie = InstrumentEngine::with_program(ChannelId::Ch1, &prog);
        let mut log = RegisterLog::new();
        ie.step(&mut log, &WaveTable::new(), 0);
        ie.step(&mut log, &WaveTable::new(), 0);
        assert!(!ie.is_running());
        ie.set_program(&prog);
        assert!(ie.is_running());
        assert_eq!((ie.program_counter(), ie.coarse_pitch()), (0, 0));
        assert_eq!(ie.channel(), ChannelId::Ch1);
        ie.reset();
        assert!(ie.is_running());
        ie.clear();
        assert!(!ie.is_running());
    }
}
