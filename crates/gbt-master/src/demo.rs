//! Built-in demo song.

use gbt_ir::{ChannelId, Effect, EffectType, Instrument, Module, Note, Row, Sequence, Song, Waveform};

const C: u8 = 0;
const DB: u8 = 1;
const D: u8 = 2;
const F: u8 = 5;
const G: u8 = 7;
const BB: u8 = 10;

const fn n(octave: u8, semitone: u8) -> Note {
    Note::from_octave_semitone(octave, semitone)
}

const X: Note = Note::Cut;

type Line = (u16, Note);

const KICKS: [&[Line]; 3] = [
    &[
        (0x00, n(6, C)), (0x04, n(6, C)), (0x08, n(6, C)), (0x0C, n(6, G)), (0x14, n(6, G)),
        (0x1C, n(6, G)), (0x24, n(6, G)), (0x2C, n(6, G)), (0x34, n(6, G)), (0x38, n(6, F)),
        (0x3C, n(6, G)),
    ],
    &[
        (0x00, n(6, C)), (0x04, n(6, C)), (0x08, n(6, C)), (0x0C, n(6, G)), (0x14, n(6, G)),
        (0x1C, n(6, G)), (0x24, n(6, G)), (0x2C, n(6, G)), (0x34, n(6, G)), (0x38, n(6, C)),
        (0x3C, n(6, F)),
    ],
    &[
        (0x00, n(6, C)), (0x04, n(6, C)), (0x08, n(6, C)), (0x0C, n(6, G)), (0x14, n(6, G)),
        (0x1C, n(6, G)), (0x24, n(6, G)), (0x2C, n(6, G)), (0x34, n(6, F)), (0x38, n(6, F)),
        (0x3A, n(6, F)), (0x3C, n(6, F)), (0x3E, n(6, F)),
    ],
];

const BASS: &[Line] = &[
    (0x0C, n(3, F)), (0x10, n(3, G)), (0x16, X), (0x18, n(3, BB)), (0x1C, n(4, C)), (0x22, X),
    (0x24, n(3, F)), (0x28, n(3, G)), (0x2E, X), (0x30, n(2, BB)), (0x34, n(3, C)),
    (0x38, n(2, F)), (0x3C, n(2, G)),
];

const RUN: &[Line] = &[
    (0x18, n(4, C)), (0x1A, n(4, D)), (0x1C, n(4, C)), (0x1E, n(3, BB)), (0x20, n(3, G)),
    (0x24, n(4, C)), (0x26, n(4, D)), (0x28, n(4, C)), (0x2A, n(3, BB)), (0x2C, n(3, G)),
    (0x30, n(4, C)), (0x32, n(4, D)), (0x34, n(4, C)), (0x36, n(3, BB)), (0x38, n(3, G)),
    (0x3A, n(3, F)), (0x3C, n(3, C)), (0x3E, n(2, BB)),
];

/// Lead hits, each cut by a delayed-cut effect.
const LEAD: &[Line] = &[
    (0x00, n(3, G)), (0x08, n(3, G)), (0x0C, n(4, D)), (0x10, n(4, D)), (0x14, n(4, DB)),
    (0x18, n(4, DB)), (0x1C, n(4, D)), (0x20, n(4, D)), (0x24, n(4, G)), (0x28, n(4, G)),
    (0x2C, n(4, F)), (0x30, n(4, F)),
];

fn fx(kind: EffectType, param: u8) -> Effect {
    Effect::new(kind, param)
}

fn write_lines(song: &mut Song, channel: ChannelId, track: u8, lines: &[Line]) {
    for &(row, note) in lines {
        if let Some(r) = song.track_mut(channel, track).row_mut(row) {
            r.note = note;
        }
    }
}

fn add_effect(song: &mut Song, channel: ChannelId, track: u8, row: u16, effect: Effect) {
    if let Some(r) = song.track_mut(channel, track).row_mut(row) {
        *r = r.with_effect(effect);
    }
}

/// A four-order song using every channel, instruments and a spread of
/// effects. Useful for smoke testing and for the CLI's default render.
pub fn demo_module() -> Module {
    let mut song = Song::new("rushing heart");
    // set_speed and set_order_list only reject values outside their ranges
    let _ = song.set_speed(0x22);
    let _ = song.set_order_list(&[[0, 0, 0, 0], [0, 1, 0, 1], [0, 0, 0, 0], [0, 2, 0, 2]]);

    // CH4: kick pattern per track
    for (track, lines) in KICKS.iter().enumerate() {
        write_lines(&mut song, ChannelId::Ch4, track as u8, lines);
    }
    add_effect(&mut song, ChannelId::Ch4, 0, 0, fx(EffectType::SetEnvelope, 0xB1));

    // CH3: held bass drone on the triangle wave
    song.set_row(
        ChannelId::Ch3,
        0,
        0x00,
        Row::empty()
            .with_note(n(3, G))
            .with_effect(fx(EffectType::SetEnvelope, 0))
            .with_effect(fx(EffectType::Vibrato, 0x42)),
    );
    song.set_row(ChannelId::Ch3, 0, 0x0C, Row::empty().with_note(Note::Cut));

    // CH2: stab, then bass line; track 2 adds the run
    for track in 0..3u8 {
        song.set_row(
            ChannelId::Ch2,
            track,
            0x00,
            Row::empty().with_note(n(5, G)).with_instrument(0),
        );
        song.set_row(ChannelId::Ch2, track, 0x08, Row::empty().with_note(Note::Cut));
        write_lines(&mut song, ChannelId::Ch2, track, BASS);
        if let Some(r) = song.track_mut(ChannelId::Ch2, track).row_mut(0x0C) {
            r.instrument = Some(1);
        }
    }
    write_lines(&mut song, ChannelId::Ch2, 2, RUN);
    add_effect(&mut song, ChannelId::Ch2, 1, 0x10, fx(EffectType::AutoPortamento, 0x20));
    add_effect(&mut song, ChannelId::Ch2, 1, 0x18, fx(EffectType::AutoPortamento, 0x00));
    add_effect(&mut song, ChannelId::Ch2, 2, 0x3E, fx(EffectType::NoteSlideDown, 0x34));

    // CH1: lead hits with a pluck program and an arpeggio at the end
    song.set_row(
        ChannelId::Ch1,
        0,
        0x00,
        Row::empty()
            .with_instrument(2)
            .with_effect(fx(EffectType::SetTimbre, 1))
            .with_effect(fx(EffectType::SetEnvelope, 0xA7)),
    );
    write_lines(&mut song, ChannelId::Ch1, 0, LEAD);
    for &(row, _) in LEAD {
        add_effect(&mut song, ChannelId::Ch1, 0, row, fx(EffectType::DelayedCut, 0x20));
    }
    add_effect(&mut song, ChannelId::Ch1, 0, 0x30, fx(EffectType::Arpeggio, 0x37));
    add_effect(&mut song, ChannelId::Ch1, 0, 0x34, fx(EffectType::SetPanning, 0x10));
    add_effect(&mut song, ChannelId::Ch1, 0, 0x3C, fx(EffectType::SetPanning, 0x11));
    add_effect(&mut song, ChannelId::Ch1, 0, 0x3C, fx(EffectType::Arpeggio, 0x00));

    let mut module = Module::new(song);

    // programs load envelope and duty, then retrigger
    let mut stab = Instrument::new("stab", ChannelId::Ch2);
    stab.envelope = 0x57;
    stab.timbre = 1;
    let _ = stab.set_program(&[0x5A, 0x57]);
    let mut bass = Instrument::new("bass", ChannelId::Ch2);
    bass.envelope = 0x77;
    bass.timbre = 0;
    let _ = bass.set_program(&[0x58, 0x77]);
    bass.pitch = Sequence::from_signed(&[0, 0, 1, 0, -1, 0], Some(2)).unwrap_or_default();
    let mut pluck = Instrument::new("pluck", ChannelId::Ch1);
    // retrigger, then step the fine offset down to zero
    let _ = pluck.set_program(&[0x41, 0xA0, 0x02, 0x01, 0xA0, 0x01, 0x01, 0xA0, 0x00, 0x00]);

    let _ = module.instruments.insert(0, stab);
    let _ = module.instruments.insert(1, bass);
    let _ = module.instruments.insert(2, pluck);
    if let Ok(triangle) = Waveform::from_hex("triangle", "0123456789ABCDEFFEDCBA9876543210") {
        let _ = module.waveforms.insert(0, triangle);
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_well_formed() {
        let module = demo_module();
        let song = &module.song;
        assert_eq!(song.order_len(), 4);
        assert_eq!(song.speed().raw(), 0x22);
        assert_eq!(module.instruments.len(), 3);
        assert!(module.waveforms.get(0).is_some());
        for order in 0..song.order_len() {
            assert!(song.pattern(order).is_some());
        }
        let ch4 = song.track(ChannelId::Ch4, 2).unwrap();
        assert_eq!(ch4.non_empty_rows().count(), 13);
        assert_eq!(
            song.track(ChannelId::Ch1, 0).unwrap().row(0x30).unwrap().note,
            n(4, F)
        );
    }
}
