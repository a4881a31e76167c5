//! Recording doubles for the device channel and the simulator sink.

use crate::command::{Command, CommandChannel, Reply};
use crate::simulator::SimulatorSink;
use crate::{Error, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared view of every command a [`RecordingChannel`] executed.
#[derive(Clone, Default)]
pub(crate) struct CommandLog(Rc<RefCell<Vec<Command>>>);

impl CommandLog {
    pub fn commands(&self) -> Vec<Command> {
        self.0.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.borrow().iter().map(Command::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.borrow().iter().filter(|c| c.name() == name).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Answers like a healthy device and remembers what it was asked.
pub(crate) struct RecordingChannel {
    log: CommandLog,
    pic_id: u32,
    fail_on: Option<&'static str>,
}

impl RecordingChannel {
    /// A channel whose device reports `pic_id` as its current animation id.
    pub fn new(pic_id: u32) -> (Self, CommandLog) {
        let log = CommandLog::default();
        let channel = Self {
            log: log.clone(),
            pic_id,
            fail_on: None,
        };
        (channel, log)
    }

    /// Make every `name` command fail with a device error.
    pub fn failing_on(mut self, name: &'static str) -> Self {
        self.fail_on = Some(name);
        self
    }
}

impl CommandChannel for RecordingChannel {
    fn execute(&mut self, command: &Command) -> Result<Reply> {
        self.log.0.borrow_mut().push(command.clone());

        if self.fail_on == Some(command.name()) {
            return Err(Error::Device {
                command: command.name(),
                code: 1,
            });
        }

        let mut reply = Reply::default();
        if let Command::GetHttpGifId = command {
            reply.fields.insert("PicId".to_string(), Value::from(self.pic_id));
        }
        Ok(reply)
    }
}

/// Frames a [`RecordingSink`] received, with their ids.
#[derive(Clone, Default)]
pub(crate) struct FrameLog(Rc<RefCell<Vec<(Vec<u8>, u32)>>>);

impl FrameLog {
    pub fn frames(&self) -> Vec<(Vec<u8>, u32)> {
        self.0.borrow().clone()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.0.borrow().iter().map(|(_, id)| *id).collect()
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    log: FrameLog,
}

impl RecordingSink {
    pub fn new() -> (Self, FrameLog) {
        let log = FrameLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl SimulatorSink for RecordingSink {
    fn display(&mut self, buffer: &[u8], frame_id: u32) {
        self.log.0.borrow_mut().push((buffer.to_vec(), frame_id));
    }
}
