//! Dual-sphere looper
//!
//! Loads the buffer bank, starts audio, and forwards controller input to
//! the engine until the process is killed.
//!
//! Flags:
//! - `--config <path>`: looper config (default `~/Music/sphere-looper/looper.yaml`)
//! - `--midi <port>`: MIDI input port-name substring
//! - `--midi-config <path>`: MIDI mapping file
//! - `--no-midi`: run without a controller
//! - `--list-devices`: print audio devices and MIDI ports, then exit

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use sphere_core::audio::{list_devices, start_audio_system, CommandSender, DeviceDirection};
use sphere_core::config::{default_config_path, load_config, LooperConfig};
use sphere_core::engine::{ChannelAtomics, EngineCommand, LooperEngine, StatsSnapshot};
use sphere_core::loader::load_bank;
use sphere_core::{ChannelId, NUM_CHANNELS};
use sphere_midi::{default_midi_config_path, list_input_ports, ControlMessage, MidiController};

/// How often the control loop drains controller messages
const CONTROL_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// How often channel status is logged
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    midi_port: Option<String>,
    midi_config: Option<PathBuf>,
    no_midi: bool,
    list_devices: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                parsed.config = Some(iter.next().context("--config needs a path")?.into());
            }
            "--midi" => {
                parsed.midi_port = Some(iter.next().context("--midi needs a port name")?);
            }
            "--midi-config" => {
                parsed.midi_config = Some(iter.next().context("--midi-config needs a path")?.into());
            }
            "--no-midi" => parsed.no_midi = true,
            "--list-devices" => parsed.list_devices = true,
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

fn print_devices() {
    for direction in [DeviceDirection::Output, DeviceDirection::Input] {
        println!("{} devices:", direction.label());
        match list_devices(direction) {
            Ok(devices) => {
                for device in devices {
                    println!("  {}", device);
                }
            }
            Err(e) => println!("  unavailable: {}", e),
        }
    }
    match list_input_ports() {
        Ok(ports) => {
            println!("MIDI input ports:");
            for port in ports {
                println!("  {}", port);
            }
        }
        Err(e) => println!("MIDI unavailable: {}", e),
    }
}

/// Push controller messages into the engine queue
///
/// Returns the number of messages dropped because the queue was full.
fn forward_messages(
    messages: impl IntoIterator<Item = ControlMessage>,
    sender: &mut CommandSender,
) -> usize {
    let mut dropped = 0;
    for message in messages {
        if sender.send(EngineCommand::from(message)).is_err() {
            dropped += 1;
        }
    }
    dropped
}

fn format_status(channels: &[Arc<ChannelAtomics>; NUM_CHANNELS], stats: &StatsSnapshot) -> String {
    let mut line = String::new();
    for id in ChannelId::ALL {
        let ch = &channels[id.index()];
        line.push_str(&format!(
            "{}: slot {} band {} pos {:.0} dx {}{} | ",
            id.name(),
            ch.active_slot(),
            ch.band(),
            ch.position(),
            ch.x_delta(),
            if ch.is_muted() { " (muted)" } else { "" }
        ));
    }
    line.push_str(&format!(
        "polls {} commits {} clamped {} dropped {} underruns {}",
        stats.polls,
        stats.commits,
        stats.clamped_intervals,
        stats.dropped_capture,
        stats.input_underruns
    ));
    line
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.list_devices {
        print_devices();
        return Ok(());
    }

    log::info!("sphere-looper starting up");

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path("looper.yaml"));
    let config: LooperConfig = load_config(&config_path);
    config.validate().context("invalid looper config")?;

    let bank = load_bank(&config).context("failed to load buffer bank")?;
    let engine = LooperEngine::new(&config, bank).context("engine rejected bank")?;

    let audio = start_audio_system(&config, engine).context("failed to start audio")?;
    log::info!(
        "Audio running: {} Hz, {} frames ({:.1} ms), input {}",
        audio.sample_rate,
        audio.buffer_size,
        audio.latency_ms,
        if audio.handle.has_input() { "on" } else { "off" }
    );

    let midi = if args.no_midi {
        None
    } else {
        let midi_config = args.midi_config.clone().unwrap_or_else(default_midi_config_path);
        match MidiController::new(&midi_config, args.midi_port.as_deref()) {
            Ok(controller) => {
                log::info!(
                    "MIDI: '{}' with profile '{}'",
                    controller.port_name(),
                    controller.profile_name()
                );
                Some(controller)
            }
            Err(e) => {
                log::warn!("MIDI: {}; running without a controller", e);
                None
            }
        }
    };

    let mut command_sender = audio.command_sender;
    let mut last_status = Instant::now();
    loop {
        if let Some(ref controller) = midi {
            let dropped = forward_messages(controller.drain(), &mut command_sender);
            if dropped > 0 {
                log::warn!("Command queue full, dropped {} controller message(s)", dropped);
            }
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            log::info!("{}", format_status(&audio.channel_atomics, &audio.stats.snapshot()));
            last_status = Instant::now();
        }

        std::thread::sleep(CONTROL_POLL_INTERVAL);
    }
}
