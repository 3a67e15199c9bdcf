//! Live capture and playback through cpal.
//!
//! The input stream pushes one channel of the capture device into an rtrb
//! ring. The output stream owns the [`Engine`]: whenever it runs out of
//! processed samples it pulls one buffer's worth from the ring, runs the
//! effect, and interleaves the stereo result into the device buffer.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info, warn};

use crate::device::CpalDevice;
use crate::engine::Engine;
use crate::error::StreamError;

/// Options for [`LiveStream::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveOptions {
    /// Capture channel fed to the effect. Mono devices always use channel 0.
    pub input_channel: usize,
    /// Capacity of the capture ring, in engine buffers
    pub fifo_frames: usize,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            input_channel: 1,
            fifo_frames: 8,
        }
    }
}

impl LiveOptions {
    pub fn with_input_channel(mut self, channel: usize) -> Self {
        self.input_channel = channel;
        self
    }

    pub fn with_fifo_frames(mut self, frames: usize) -> Self {
        self.fifo_frames = frames;
        self
    }
}

/// Diagnostics shared with the stream callbacks.
#[derive(Debug, Default)]
pub struct StreamStatus {
    had_underrun: AtomicBool,
    dropped_input: AtomicUsize,
    frames: AtomicUsize,
}

impl StreamStatus {
    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.had_underrun.swap(false, Ordering::Relaxed)
    }

    /// Captured samples lost because the capture ring was full.
    pub fn dropped_input(&self) -> usize {
        self.dropped_input.load(Ordering::Relaxed)
    }

    /// Engine frames processed so far.
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }
}

/// A running input/output stream pair driving an [`Engine`].
///
/// Dropping it stops both streams.
pub struct LiveStream {
    input: cpal::Stream,
    output: cpal::Stream,
    status: Arc<StreamStatus>,
}

impl LiveStream {
    /// Open both devices and start processing.
    ///
    /// The engine must be configured for the devices' sample rate.
    pub fn start(
        engine: Engine,
        input: &CpalDevice,
        output: &CpalDevice,
        options: LiveOptions,
    ) -> Result<Self, StreamError> {
        if input.sample_rate() != output.sample_rate() {
            return Err(StreamError::SampleRateMismatch {
                input: input.sample_rate(),
                output: output.sample_rate(),
            });
        }
        let ctx = engine.context();
        if ctx.sample_rate != output.sample_rate() {
            return Err(StreamError::EngineRateMismatch {
                engine: ctx.sample_rate,
                device: output.sample_rate(),
            });
        }

        let channel = select_input_channel(options.input_channel, input.channels());

        let capacity = ctx.buffer_size * options.fifo_frames.max(2);
        let (mut producer, consumer) = RingBuffer::<f32>::new(capacity);
        // one buffer of silence so playback does not start on an empty ring
        for _ in 0..ctx.buffer_size {
            let _ = producer.push(0.0);
        }

        let status = Arc::new(StreamStatus::default());
        let effect = engine.effect_kind();

        let input_stream = match input.sample_format() {
            SampleFormat::F32 => build_input::<f32>(input, channel, producer, status.clone())?,
            SampleFormat::I16 => build_input::<i16>(input, channel, producer, status.clone())?,
            SampleFormat::U16 => build_input::<u16>(input, channel, producer, status.clone())?,
            format => return Err(StreamError::UnsupportedFormat(format)),
        };

        let playback = Playback::new(engine, consumer, status.clone());
        let output_stream = match output.sample_format() {
            SampleFormat::F32 => build_output::<f32>(output, playback)?,
            SampleFormat::I16 => build_output::<i16>(output, playback)?,
            SampleFormat::U16 => build_output::<u16>(output, playback)?,
            format => return Err(StreamError::UnsupportedFormat(format)),
        };

        input_stream.play()?;
        output_stream.play()?;

        info!(
            %effect,
            input = input.name(),
            output = output.name(),
            sample_rate = ctx.sample_rate,
            input_channel = channel,
            "live stream started"
        );

        Ok(Self {
            input: input_stream,
            output: output_stream,
            status,
        })
    }

    pub fn status(&self) -> Arc<StreamStatus> {
        self.status.clone()
    }

    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.status.check_underrun()
    }

    /// Stop both streams. The engine, and any archive sink it holds, is dropped.
    pub fn stop(self) {
        if let Err(err) = self.input.pause() {
            warn!(%err, "failed to pause input stream");
        }
        if let Err(err) = self.output.pause() {
            warn!(%err, "failed to pause output stream");
        }
        info!(
            frames = self.status.frames(),
            dropped_input = self.status.dropped_input(),
            "live stream stopped"
        );
    }
}

/// The capture channel to read: `requested` if the device has it, else channel 0.
fn select_input_channel(requested: usize, channels: u16) -> usize {
    if requested < channels as usize {
        return requested;
    }
    if requested != 0 {
        warn!(requested, channels, "input channel not available, using channel 0");
    }
    0
}

/// Output-side state, owned by the output callback.
struct Playback {
    engine: Engine,
    input: Consumer<f32>,
    frame: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
    /// Next unplayed position in `left`/`right`
    cursor: usize,
    status: Arc<StreamStatus>,
}

impl Playback {
    fn new(engine: Engine, input: Consumer<f32>, status: Arc<StreamStatus>) -> Self {
        let size = engine.context().buffer_size;
        Self {
            engine,
            input,
            frame: vec![0.0; size],
            left: vec![0.0; size],
            right: vec![0.0; size],
            cursor: size,
            status,
        }
    }

    fn refill(&mut self) {
        let mut underrun = false;
        for sample in self.frame.iter_mut() {
            *sample = self.input.pop().unwrap_or_else(|_| {
                underrun = true;
                0.0
            });
        }
        if underrun {
            self.status.had_underrun.store(true, Ordering::Relaxed);
        }

        self.engine.process(&self.frame, &mut self.left, &mut self.right);
        self.status.frames.fetch_add(1, Ordering::Relaxed);
        self.cursor = 0;
    }

    fn fill<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        for out in data.chunks_mut(channels) {
            if self.cursor >= self.frame.len() {
                self.refill();
            }
            let (l, r) = (self.left[self.cursor], self.right[self.cursor]);
            self.cursor += 1;

            for (ch, sample) in out.iter_mut().enumerate() {
                let value = match ch {
                    0 => l,
                    1 => r,
                    _ => 0.0,
                };
                *sample = T::from_sample(value);
            }
        }
    }
}

fn build_input<T>(
    device: &CpalDevice,
    channel: usize,
    mut producer: Producer<f32>,
    status: Arc<StreamStatus>,
) -> Result<cpal::Stream, StreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = device.channels().max(1) as usize;
    let stream = device.device().build_input_stream(
        &device.stream_config(),
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut dropped = 0;
            for frame in data.chunks(channels) {
                if let Some(&sample) = frame.get(channel) {
                    if producer.push(f32::from_sample(sample)).is_err() {
                        dropped += 1;
                    }
                }
            }
            if dropped > 0 {
                status.dropped_input.fetch_add(dropped, Ordering::Relaxed);
            }
        },
        |err: cpal::StreamError| error!(%err, "input stream error"),
        None,
    )?;
    Ok(stream)
}

fn build_output<T>(device: &CpalDevice, mut playback: Playback) -> Result<cpal::Stream, StreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = device.channels().max(1) as usize;
    let stream = device.device().build_output_stream(
        &device.stream_config(),
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| playback.fill(data, channels),
        |err: cpal::StreamError| error!(%err, "output stream error"),
        None,
    )?;
    Ok(stream)
}
