//! Plain-text register trace of a render.
//!
//! One header line per frame followed by an indented line per device
//! write. Frames without writes still get a header so row timing stays
//! visible.

use crate::Render;
use std::io::Write;

pub fn write_trace(w: &mut impl Write, render: &Render) -> std::io::Result<()> {
    write_header(w, render)?;
    for rendered in &render.frames {
        writeln!(w, "{}", rendered.frame)?;
        for write in &rendered.writes {
            writeln!(w, "    {}", write)?;
        }
    }
    Ok(())
}

pub fn trace_to_bytes(render: &Render) -> Vec<u8> {
    let mut buf = Vec::new();
    write_trace(&mut buf, render).expect("Vec<u8> write cannot fail");
    buf
}

fn write_header(w: &mut impl Write, render: &Render) -> std::io::Result<()> {
    writeln!(
        w,
        "# {} frames, {} writes{}",
        render.frames.len(),
        render.total_writes(),
        if render.halted() { ", halted" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderedFrame;
    use gbt_engine::{DeviceWrite, Frame};
    use gbt_ir::{ChannelId, Speed};

    #[test]
    fn trace_lists_frames_and_writes() {
        let mut first = Frame::start(Speed::DEFAULT, 0, 0);
        first.started_new_row = true;
        first.started_new_pattern = true;
        first.time = 1;
        let mut second = first;
        second.started_new_row = false;
        second.started_new_pattern = false;
        second.time = 2;

        let render = Render {
            frames: vec![
                RenderedFrame {
                    frame: first,
                    writes: vec![
                        DeviceWrite::Frequency { channel: ChannelId::Ch1, value: 0x2C },
                        DeviceWrite::OutputEnable(0x11),
                    ],
                },
                RenderedFrame {
                    frame: second,
                    writes: vec![],
                },
            ],
        };

        let text = String::from_utf8(trace_to_bytes(&render)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# 2 frames, 2 writes");
        assert_eq!(lines[1], format!("000001 00:00 speed {} pattern", Speed::DEFAULT));
        assert_eq!(lines[2], "    freq CH1 <- 02C");
        assert_eq!(lines[3], "    pan  11");
        assert_eq!(lines[4], format!("000002 00:00 speed {}", Speed::DEFAULT));
        assert_eq!(lines.len(), 5);
    }
}
