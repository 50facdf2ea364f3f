//! CPAL audio backend implementation
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Control Thread  │───push()───────────►│   Command Queue     │
//! │  (MIDI, status)  │                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         ▲                                           │ pop()
//!         │ Relaxed atomics                           ▼
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  ChannelAtomics  │◄────────────────────│  Output Callback    │
//! │  EngineStats     │   block-end writes  │ (owns LooperEngine) │
//! └──────────────────┘                     └──────────▲──────────┘
//!                                                     │ pop()
//!                    ┌───────────────────┐  ┌─────────┴───────────┐
//!                    │  Input Callback   │─►│  Live Input Ring    │
//!                    │ (mono, channel 0) │  │  (lock-free SPSC)   │
//!                    └───────────────────┘  └─────────────────────┘
//! ```
//!
//! The output callback owns its state outright; nothing is shared with the
//! control thread except the two rings and the atomics.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::backend::{AudioSystemResult, CommandSender};
use super::config::{AudioConfig, INPUT_RING_BUFFERS, MAX_BUFFER_SIZE};
use super::device::{resolve_device, DeviceDirection};
use super::error::{AudioError, AudioResult};
use crate::config::LooperConfig;
use crate::effect::PostFilter;
use crate::engine::{command_channel, EngineCommand, LooperEngine};
use crate::types::{Sample, StereoBuffer, StereoSample};

/// Keeps the audio streams alive. Drop this to stop audio.
pub struct AudioHandle {
    _output_stream: Stream,
    _input_stream: Option<Stream>,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// True when a live input stream is running
    pub fn has_input(&self) -> bool {
        self._input_stream.is_some()
    }

    /// Output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Start output (and, if available, input) streams around `engine`
///
/// A missing or incompatible input device is not fatal: the looper runs
/// with silent live input.
pub fn start_audio_system(config: &LooperConfig, engine: LooperEngine) -> AudioResult<AudioSystemResult> {
    let audio = &config.audio;
    let device = resolve_device(audio.output_device.as_ref(), DeviceDirection::Output)?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using output device: {}", device_name);

    let target_rate = audio.sample_rate.unwrap_or(config.sample_rate);
    let supported = get_output_config(&device, target_rate)?;
    let sample_rate = supported.sample_rate().0;
    if sample_rate != config.sample_rate {
        log::warn!(
            "Device runs at {}Hz, looper configured for {}Hz; tick scale is unchanged",
            sample_rate,
            config.sample_rate
        );
    }

    let buffer_size = audio.buffer_size.frames();
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };
    let latency_ms = audio.buffer_size.latency_ms(sample_rate);

    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency_ms
    );

    let channel_atomics = engine.channel_atomics();
    let stats = engine.stats();
    let (command_tx, command_rx) = command_channel();

    let (input_stream, input_rx) = match start_input(audio, sample_rate, buffer_size) {
        Ok((stream, rx)) => (Some(stream), Some(rx)),
        Err(e) => {
            log::warn!("Live input unavailable, running with silent input: {}", e);
            (None, None)
        }
    };

    let post_filter = PostFilter::new(&config.post_filter, sample_rate);
    let state = AudioCallbackState::new(engine, command_rx, input_rx, post_filter);
    let output_stream = build_output_stream(&device, &stream_config, state)?;
    output_stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!(
        "Audio streams started ({})",
        if input_stream.is_some() { "with live input" } else { "output only" }
    );

    Ok(AudioSystemResult {
        handle: AudioHandle {
            _output_stream: output_stream,
            _input_stream: input_stream,
            sample_rate,
            buffer_size,
        },
        command_sender: CommandSender::new(command_tx),
        channel_atomics,
        stats,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// State owned by the output callback
struct AudioCallbackState {
    engine: LooperEngine,
    command_rx: rtrb::Consumer<EngineCommand>,
    input_rx: Option<rtrb::Consumer<Sample>>,
    /// Pre-allocated live input block
    input: Vec<Sample>,
    /// Pre-allocated output block
    output: StereoBuffer,
    post_filter: PostFilter,
}

impl AudioCallbackState {
    fn new(
        engine: LooperEngine,
        command_rx: rtrb::Consumer<EngineCommand>,
        input_rx: Option<rtrb::Consumer<Sample>>,
        post_filter: PostFilter,
    ) -> Self {
        Self {
            engine,
            command_rx,
            input_rx,
            input: Vec::with_capacity(MAX_BUFFER_SIZE),
            output: StereoBuffer::silence(MAX_BUFFER_SIZE),
            post_filter,
        }
    }

    /// Render `n_frames` (at most `MAX_BUFFER_SIZE`) into the output block
    fn process(&mut self, n_frames: usize) {
        let n_frames = n_frames.min(MAX_BUFFER_SIZE);
        self.output.set_len_from_capacity(n_frames);

        self.input.clear();
        if let Some(rx) = self.input_rx.as_mut() {
            while self.input.len() < n_frames {
                match rx.pop() {
                    Ok(sample) => self.input.push(sample),
                    Err(_) => break,
                }
            }
        }

        self.engine.process_commands(&mut self.command_rx);
        self.engine.process(&self.input, self.output.as_mut_slice());
        self.post_filter.process(self.output.as_mut_slice());
    }

    fn samples(&self) -> &[StereoSample] {
        self.output.as_slice()
    }

    /// Copy the rendered block into a device buffer of `channels` interleaved channels
    ///
    /// Stereo devices take the block as-is; extra channels get silence.
    fn write_interleaved(&self, data: &mut [f32], channels: usize) {
        if channels == 2 {
            let interleaved = self.output.as_interleaved();
            let n = data.len().min(interleaved.len());
            data[..n].copy_from_slice(&interleaved[..n]);
            data[n..].fill(0.0);
            return;
        }

        let samples = self.samples();
        for (i, frame) in data.chunks_mut(channels.max(1)).enumerate() {
            let sample = samples.get(i).copied().unwrap_or_default();
            frame[0] = sample.left;
            if channels > 1 {
                frame[1] = sample.right;
            }
            for ch in frame.iter_mut().skip(2) {
                *ch = 0.0;
            }
        }
    }
}

/// Pick an f32 output config with at least two channels at `target_rate`
fn get_output_config(device: &cpal::Device, target_rate: u32) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    let in_range = |c: &cpal::SupportedStreamConfigRange| {
        target_rate >= c.min_sample_rate().0 && target_rate <= c.max_sample_rate().0
    };

    let best = supported
        .iter()
        .find(|c| c.channels() >= 2 && in_range(c))
        .or_else(|| supported.iter().find(|c| c.channels() >= 2))
        .ok_or_else(|| AudioError::ConfigError("No f32 stereo output configuration".to_string()))?;

    let sample_rate = if in_range(best) {
        cpal::SampleRate(target_rate)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz",
            target_rate,
            fallback.0
        );
        fallback
    };

    Ok(best.clone().with_sample_rate(sample_rate))
}

/// Open the live input stream at the output's sample rate
fn start_input(
    audio: &AudioConfig,
    sample_rate: u32,
    buffer_size: u32,
) -> AudioResult<(Stream, rtrb::Consumer<Sample>)> {
    if audio.disable_input {
        return Err(AudioError::ConfigError("input disabled in config".to_string()));
    }

    let device = resolve_device(audio.input_device.as_ref(), DeviceDirection::Input)?;
    log::info!(
        "Using input device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let range = device
        .supported_input_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .find(|c| sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0);

    let Some(range) = range else {
        let input_rate = device
            .default_input_config()
            .map(|c| c.sample_rate().0)
            .unwrap_or(0);
        return Err(AudioError::SampleRateMismatch {
            output: sample_rate,
            input: input_rate,
        });
    };

    let stream_config = StreamConfig {
        channels: range.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };
    let channels = stream_config.channels.max(1) as usize;

    let capacity = buffer_size as usize * INPUT_RING_BUFFERS;
    let (mut producer, consumer) = rtrb::RingBuffer::<Sample>::new(capacity);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                // First channel only; a full ring means the output side stalled
                for frame in data.chunks(channels) {
                    if producer.push(frame[0]).is_err() {
                        break;
                    }
                }
            },
            move |err| {
                log::error!("Input audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    Ok((stream, consumer))
}

/// Build the output stream; the callback takes ownership of `state`
fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut state: AudioCallbackState,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                // Hosts may ask for more than was pre-allocated
                for block in data.chunks_mut(channels * MAX_BUFFER_SIZE) {
                    state.process(block.len() / channels);
                    state.write_interleaved(block, channels);
                }
            },
            move |err| {
                log::error!("Output audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BufferBank;
    use crate::types::ChannelId;

    fn callback_state(input_rx: Option<rtrb::Consumer<Sample>>) -> (AudioCallbackState, rtrb::Producer<EngineCommand>) {
        let config = LooperConfig {
            buffer_len: 1024,
            band_count: 4,
            slot_count: 2,
            poll_frames: 64,
            max_write_frames: 1024,
            ..Default::default()
        };
        let bank = BufferBank::silent(config.bank_shape()).unwrap();
        let engine = LooperEngine::new(&config, bank).unwrap();
        let (tx, rx) = command_channel();
        let mut filter_config = config.post_filter.clone();
        filter_config.enabled = false;
        let filter = PostFilter::new(&filter_config, config.sample_rate);
        (AudioCallbackState::new(engine, rx, input_rx, filter), tx)
    }

    #[test]
    fn test_callback_routes_live_input_dry() {
        let (mut input_tx, input_rx) = rtrb::RingBuffer::<Sample>::new(256);
        for _ in 0..128 {
            input_tx.push(0.8).unwrap();
        }
        let (mut state, _tx) = callback_state(Some(input_rx));
        state.process(128);

        // Muted at startup: both channels output dry * default mix
        let expected = 0.8 * 0.75;
        assert!(state
            .samples()
            .iter()
            .all(|s| (s.left - expected).abs() < 1e-6 && (s.right - expected).abs() < 1e-6));
    }

    #[test]
    fn test_callback_drains_commands() {
        let (mut state, mut tx) = callback_state(None);
        tx.push(EngineCommand::SelectSlot { channel: ChannelId::B, slot: 1 }).unwrap();
        state.process(32);
        assert_eq!(state.engine.channel(ChannelId::B).active_slot(), 1);
        assert_eq!(state.engine.stats().snapshot().input_underruns, 32);
    }

    #[test]
    fn test_callback_clamps_oversized_request() {
        let (mut state, _tx) = callback_state(None);
        state.process(MAX_BUFFER_SIZE * 2);
        assert_eq!(state.samples().len(), MAX_BUFFER_SIZE);
    }

    #[test]
    fn test_write_interleaved_layouts() {
        let (mut input_tx, input_rx) = rtrb::RingBuffer::<Sample>::new(16);
        for _ in 0..4 {
            input_tx.push(0.4).unwrap();
        }
        let (mut state, _tx) = callback_state(Some(input_rx));
        state.process(4);
        let expected = 0.4 * 0.75;

        let mut stereo = [9.0f32; 8];
        state.write_interleaved(&mut stereo, 2);
        assert!(stereo.iter().all(|s| (s - expected).abs() < 1e-6));

        let mut quad = [9.0f32; 16];
        state.write_interleaved(&mut quad, 4);
        for frame in quad.chunks(4) {
            assert!((frame[0] - expected).abs() < 1e-6);
            assert!((frame[1] - expected).abs() < 1e-6);
            assert_eq!(&frame[2..], &[0.0, 0.0]);
        }

        let mut mono = [9.0f32; 4];
        state.write_interleaved(&mut mono, 1);
        assert!(mono.iter().all(|s| (s - expected).abs() < 1e-6));
    }
}
