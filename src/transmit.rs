//! Frame counter lifecycle and frame dispatch.
//!
//! The device tags every pushed frame with an animation id (`PicID`) and
//! only tolerates a bounded run of them. The transmitter keeps a local copy
//! of that counter, loaded from the device once, bumped on every push and
//! reset remotely whenever it reaches the refresh threshold. Callers never
//! see the reset; the frame that trips it is sent under id 1.

use crate::command::{Command, CommandChannel, Reply};
use crate::simulator::SimulatorSink;
use crate::{FrameBuffer, PixooConfig, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Where pushed frames go.
pub enum Link {
    Device(Box<dyn CommandChannel>),
    Simulated(Box<dyn SimulatorSink>),
}

pub struct Transmitter {
    link: Link,
    counter: u32,
    refresh_threshold: u32,
    auto_refresh: bool,
    frame_delay_ms: u32,
    frames_sent: u64,
}

impl Transmitter {
    /// The counter starts at 0 until [`initialize`](Self::initialize) runs.
    pub fn new(link: Link, config: &PixooConfig) -> Self {
        Self {
            link,
            counter: 0,
            refresh_threshold: config.refresh_threshold,
            auto_refresh: config.auto_refresh,
            frame_delay_ms: config.frame_delay_ms,
            frames_sent: 0,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.link, Link::Simulated(_))
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Frames successfully handed to the device or the sink.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Load the counter from the device (or start at 1 when simulated).
    ///
    /// A counter that is already past the threshold triggers a remote reset.
    /// The local copy is left alone, so the next push resets once more and
    /// goes out as id 1.
    pub fn initialize(&mut self) -> Result<()> {
        self.counter = match &mut self.link {
            Link::Simulated(_) => 1,
            Link::Device(channel) => channel.execute(&Command::GetHttpGifId)?.pic_id()?,
        };
        tracing::debug!("Counter loaded and stored: {}", self.counter);

        if self.auto_refresh && self.counter > self.refresh_threshold {
            self.reset_counter()?;
        }
        Ok(())
    }

    /// Send `buffer` as the next frame.
    pub fn push(&mut self, buffer: &FrameBuffer) -> Result<()> {
        // Without auto-refresh the device may already report the largest id.
        self.counter = self.counter.saturating_add(1);

        if self.auto_refresh && self.counter >= self.refresh_threshold {
            self.reset_counter()?;
            self.counter = 1;
        }
        tracing::debug!("Counter set to {}", self.counter);

        match &mut self.link {
            Link::Simulated(sink) => sink.display(buffer.as_bytes(), self.counter),
            Link::Device(channel) => {
                let command = Command::SendHttpGif {
                    pic_num: 1,
                    pic_width: buffer.size().side(),
                    pic_offset: 0,
                    pic_id: self.counter,
                    pic_speed: self.frame_delay_ms,
                    pic_data: STANDARD.encode(buffer.as_bytes()),
                };
                channel.execute(&command)?;
            }
        }

        self.frames_sent += 1;
        tracing::debug!("Pushed {} buffers", self.frames_sent);
        Ok(())
    }

    /// Execute a pass-through command. Simulated sessions skip it and return `None`.
    pub fn send(&mut self, command: Command) -> Result<Option<Reply>> {
        match &mut self.link {
            Link::Simulated(_) => {
                tracing::debug!("Skipping {} in simulated mode", command.name());
                Ok(None)
            }
            Link::Device(channel) => channel.execute(&command).map(Some),
        }
    }

    fn reset_counter(&mut self) -> Result<()> {
        tracing::debug!("Resetting counter remotely");
        if let Link::Device(channel) = &mut self.link {
            channel.execute(&Command::ResetHttpGifId)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingChannel, RecordingSink};
    use crate::{DisplaySize, Error, Palette};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const RESET: &str = "Draw/ResetHttpGifId";
    const SEND: &str = "Draw/SendHttpGif";

    fn buffer() -> FrameBuffer {
        FrameBuffer::new(DisplaySize::S16, Palette::RED)
    }

    fn device(pic_id: u32) -> (Transmitter, crate::testing::CommandLog) {
        let (channel, log) = RecordingChannel::new(pic_id);
        let tx = Transmitter::new(Link::Device(Box::new(channel)), &PixooConfig::default());
        (tx, log)
    }

    fn sent_ids(log: &crate::testing::CommandLog) -> Vec<u32> {
        log.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::SendHttpGif { pic_id, .. } => Some(pic_id),
                _ => None,
            })
            .collect()
    }

    #[rstest]
    #[case(0, 5)]
    #[case(3, 10)]
    #[case(20, 11)]
    fn pushes_below_threshold_just_increment(#[case] start: u32, #[case] pushes: u32) {
        let (mut tx, log) = device(start);
        tx.initialize().unwrap();

        for _ in 0..pushes {
            tx.push(&buffer()).unwrap();
        }

        assert_eq!(tx.counter(), start + pushes);
        assert_eq!(log.count(RESET), 0);
        assert_eq!(sent_ids(&log), ((start + 1)..=(start + pushes)).collect::<Vec<_>>());
    }

    #[test]
    fn threshold_frame_is_sent_as_id_one() {
        let (mut tx, log) = device(30);
        tx.initialize().unwrap();

        tx.push(&buffer()).unwrap(); // 31
        tx.push(&buffer()).unwrap(); // 32 -> reset -> 1
        tx.push(&buffer()).unwrap(); // 2

        assert_eq!(sent_ids(&log), vec![31, 1, 2]);
        assert_eq!(log.count(RESET), 1);
        assert_eq!(
            log.names(),
            vec!["Draw/GetHttpGifId", SEND, RESET, SEND, SEND]
        );
    }

    #[rstest]
    #[case(32)]
    #[case(33)]
    #[case(500)]
    fn counter_at_or_above_threshold_resets_on_next_push(#[case] start: u32) {
        let (mut tx, log) = device(start);
        tx.initialize().unwrap();
        log.clear();

        tx.push(&buffer()).unwrap();
        assert_eq!(log.names(), vec![RESET, SEND]);
        assert_eq!(tx.counter(), 1);

        tx.push(&buffer()).unwrap();
        assert_eq!(log.count(RESET), 1);
        assert_eq!(tx.counter(), 2);
    }

    #[test]
    fn initialize_resets_when_device_is_past_threshold() {
        let (mut tx, log) = device(40);
        tx.initialize().unwrap();

        assert_eq!(log.names(), vec!["Draw/GetHttpGifId", RESET]);
        assert_eq!(tx.counter(), 40);
    }

    #[test]
    fn initialize_at_threshold_does_not_reset() {
        let (mut tx, log) = device(32);
        tx.initialize().unwrap();
        assert_eq!(log.count(RESET), 0);
    }

    #[test]
    fn auto_refresh_disabled_never_resets() {
        let (channel, log) = RecordingChannel::new(40);
        let config = PixooConfig {
            auto_refresh: false,
            ..PixooConfig::default()
        };
        let mut tx = Transmitter::new(Link::Device(Box::new(channel)), &config);
        tx.initialize().unwrap();
        tx.push(&buffer()).unwrap();

        assert_eq!(log.count(RESET), 0);
        assert_eq!(tx.counter(), 41);
    }

    #[test]
    fn counter_saturates_at_largest_id_without_auto_refresh() {
        let (channel, log) = RecordingChannel::new(u32::MAX);
        let config = PixooConfig {
            auto_refresh: false,
            ..PixooConfig::default()
        };
        let mut tx = Transmitter::new(Link::Device(Box::new(channel)), &config);
        tx.initialize().unwrap();

        tx.push(&buffer()).unwrap();
        tx.push(&buffer()).unwrap();

        assert_eq!(tx.counter(), u32::MAX);
        assert_eq!(sent_ids(&log), vec![u32::MAX, u32::MAX]);
        assert_eq!(log.count(RESET), 0);
    }

    #[test]
    fn largest_device_id_with_auto_refresh_resets() {
        let (mut tx, log) = device(u32::MAX);
        tx.initialize().unwrap();
        tx.push(&buffer()).unwrap();

        assert_eq!(tx.counter(), 1);
        assert_eq!(sent_ids(&log), vec![1]);
    }

    #[test]
    fn push_encodes_whole_buffer_as_base64() {
        let (mut tx, log) = device(0);
        tx.initialize().unwrap();
        let fb = buffer();
        tx.push(&fb).unwrap();

        let Some(Command::SendHttpGif {
            pic_num,
            pic_width,
            pic_offset,
            pic_speed,
            pic_data,
            ..
        }) = log.commands().pop()
        else {
            panic!("expected a SendHttpGif command");
        };
        assert_eq!((pic_num, pic_width, pic_offset, pic_speed), (1, 16, 0, 1000));
        assert_eq!(STANDARD.decode(pic_data).unwrap(), fb.as_bytes());
    }

    #[test]
    fn simulated_push_goes_to_sink_without_device() {
        let (sink, frames) = RecordingSink::new();
        let mut tx = Transmitter::new(Link::Simulated(Box::new(sink)), &PixooConfig::default());
        tx.initialize().unwrap();
        assert_eq!(tx.counter(), 1);

        let fb = buffer();
        tx.push(&fb).unwrap();
        tx.push(&fb).unwrap();

        assert_eq!(frames.ids(), vec![2, 3]);
        assert_eq!(frames.frames()[0].0, fb.as_bytes());
        assert_eq!(tx.frames_sent(), 2);
    }

    #[test]
    fn simulated_counter_wraps_at_threshold() {
        let (sink, frames) = RecordingSink::new();
        let config = PixooConfig {
            refresh_threshold: 4,
            ..PixooConfig::default()
        };
        let mut tx = Transmitter::new(Link::Simulated(Box::new(sink)), &config);
        tx.initialize().unwrap();

        for _ in 0..4 {
            tx.push(&buffer()).unwrap();
        }
        assert_eq!(frames.ids(), vec![2, 3, 1, 2]);
    }

    #[test]
    fn simulated_send_is_skipped() {
        let (sink, _) = RecordingSink::new();
        let mut tx = Transmitter::new(Link::Simulated(Box::new(sink)), &PixooConfig::default());
        let reply = tx.send(Command::SetBrightness { brightness: 10 }).unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn transport_failures_propagate_without_retry() {
        let (channel, log) = RecordingChannel::new(0);
        let channel = channel.failing_on(SEND);
        let mut tx = Transmitter::new(Link::Device(Box::new(channel)), &PixooConfig::default());
        tx.initialize().unwrap();

        let err = tx.push(&buffer()).unwrap_err();
        assert!(matches!(err, Error::Device { command: SEND, .. }));
        assert_eq!(log.count(SEND), 1);
        assert_eq!(tx.frames_sent(), 0);
    }

    #[test]
    fn initialize_propagates_failures() {
        let (channel, _) = RecordingChannel::new(0);
        let channel = channel.failing_on("Draw/GetHttpGifId");
        let mut tx = Transmitter::new(Link::Device(Box::new(channel)), &PixooConfig::default());
        assert!(tx.initialize().is_err());
    }
}
