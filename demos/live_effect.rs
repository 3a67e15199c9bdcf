//! Live guitar effect: capture from the default input, play through the
//! default output, and archive the processed signal to a WAV file.
//!
//! Run with: cargo run --example live_effect --features cpal_io -- [effect] [out.wav]
//!
//! `effect` is a menu key (1-4) or a name (delay, flanger, phaser, reverb, none).
//! Without one, a menu is shown.

use std::error::Error;
use std::io::{self, Write};

use effektor::{
    archive_channel, CpalDevice, EffectKind, Engine, EngineConfig, LiveOptions, LiveStream,
    WavArchiver,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("effektor=info,live_effect=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let effect = match args.next() {
        Some(arg) => arg.parse::<EffectKind>()?,
        None => prompt_effect()?,
    };
    let path = args.next().unwrap_or_else(|| "effect.wav".into());

    let input = CpalDevice::default_input().ok_or("no input device found")?;
    let output = CpalDevice::default_output().ok_or("no output device found")?;
    println!(
        "Input:  {} @ {}Hz, {} ch\nOutput: {} @ {}Hz, {} ch",
        input.name(),
        input.sample_rate(),
        input.channels(),
        output.name(),
        output.sample_rate(),
        output.channels()
    );

    let config = EngineConfig::default()
        .with_effect(effect)
        .with_sample_rate(output.sample_rate());

    let (sink, source) = archive_channel(config.buffer_size, 64);
    let archiver = WavArchiver::spawn(&path, config.sample_rate, source)?;
    let engine = Engine::new(&config)?.with_archive(sink);

    let stream = LiveStream::start(engine, &input, &output, LiveOptions::default())?;

    println!("\nPlaying {} - press Enter to stop", effect);
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    if stream.check_underrun() {
        println!("(playback underran at least once)");
    }
    stream.stop();

    let samples = archiver.finish()?;
    println!("Wrote {} frames to {}", samples / 2, path);
    Ok(())
}

fn prompt_effect() -> Result<EffectKind, Box<dyn Error>> {
    println!("Effects:");
    for kind in EffectKind::ALL {
        if kind != EffectKind::None {
            println!("  [{}] {}", kind.menu_key(), kind);
        }
    }
    print!("\nSelect effect by number or name [none]: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let choice = line.trim();
    if choice.is_empty() {
        return Ok(EffectKind::None);
    }
    Ok(choice.parse::<EffectKind>()?)
}
