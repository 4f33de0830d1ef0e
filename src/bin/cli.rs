//! gbtracker CLI: headless playback of the built-in demo song.
//!
//! Usage:
//!   cargo run --bin gbt-cli
//!   cargo run --bin gbt-cli -- --frames 600 --trace trace.txt
//!   cargo run --bin gbt-cli -- --order 2 --repeat-pattern
//!   cargo run --bin gbt-cli -- --preview 2 --note 36

use anyhow::{Context, Result};
use clap::Parser;
use gbt_ir::{ChannelId, Note};
use gbt_master::{demo_module, write_trace, Controller, DeviceWrite, RenderConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render the demo song and report what the sound device saw
#[derive(Parser)]
#[command(name = "gbt-cli")]
#[command(version)]
struct Cli {
    /// Maximum frames to render
    #[arg(long, default_value_t = 3600)]
    frames: usize,

    /// Order index to start from
    #[arg(long, default_value_t = 0)]
    order: usize,

    /// Row to start from
    #[arg(long, default_value_t = 0)]
    row: u16,

    /// Loop the starting pattern instead of following the order list
    #[arg(long)]
    repeat_pattern: bool,

    /// Write a register trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Audition an instrument instead of playing the song
    #[arg(long)]
    preview: Option<u8>,

    /// Note index for --preview (0 = C-2)
    #[arg(long, default_value_t = 24)]
    note: u8,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctrl = Controller::with_module(demo_module());

    let song = &ctrl.module().song;
    println!("Title:    {}", song.title);
    println!("Orders:   {}", song.order_len());
    println!("Rows:     {}", song.rows_per_pattern());
    println!("Speed:    {} ({} BPM)", song.speed(), song.speed().tempo(song.rows_per_beat));
    println!("Instruments: {}", ctrl.module().instruments.len());
    println!();

    match cli.preview {
        Some(id) => preview(&ctrl, id, cli.note),
        None => render(&ctrl, &cli),
    }
}

fn render(ctrl: &Controller, cli: &Cli) -> Result<()> {
    let config = RenderConfig {
        start_order: cli.order,
        start_row: cli.row,
        max_frames: cli.frames,
        pattern_repeat: cli.repeat_pattern,
    };
    let render = ctrl.render(&config).context("failed to start playback")?;

    let rows = render.frames.iter().filter(|f| f.frame.started_new_row).count();
    let patterns = render.frames.iter().filter(|f| f.frame.started_new_pattern).count();
    println!("Frames:   {}", render.frames.len());
    println!("Rows:     {}", rows);
    println!("Patterns: {}", patterns);
    println!("Writes:   {}", render.total_writes());
    for channel in ChannelId::ALL {
        let triggers = render
            .writes()
            .filter(|w| matches!(w, DeviceWrite::Restart(ch) if *ch == channel))
            .count();
        println!("  {}: {} retriggers", channel, triggers);
    }
    if render.halted() {
        println!("Halted.");
    }

    if let Some(path) = &cli.trace {
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_trace(&mut writer, &render).with_context(|| format!("failed to write {}", path.display()))?;
        writer.flush().with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote trace to {}", path.display());
    }
    Ok(())
}

fn preview(ctrl: &Controller, id: u8, note: u8) -> Result<()> {
    let frames = ctrl
        .preview_instrument(id, note, 30, 2)
        .context("failed to preview instrument")?;
    println!("Preview of instrument {:02X} on {}", id, Note::On(note));
    for (i, writes) in frames.iter().enumerate() {
        for write in writes {
            println!("{:03} {}", i, write);
        }
    }
    Ok(())
}
