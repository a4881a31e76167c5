//! Structured device commands and the channel that carries them.
//!
//! The Pixoo speaks JSON over HTTP: every request is a single object with a
//! `"Command"` key naming the operation plus that operation's parameters,
//! POSTed to `http://<address>/post`. [`Command`] models each request as a
//! typed enum variant; serde's internal tagging produces the envelope.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Built-in channels the device can switch between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Faces,
    Cloud,
    Visualizer,
    Custom,
}

impl Channel {
    /// The device's `SelectIndex` for this channel.
    pub fn index(self) -> u8 {
        match self {
            Channel::Faces => 0,
            Channel::Cloud => 1,
            Channel::Visualizer => 2,
            Channel::Custom => 3,
        }
    }
}

/// Scroll direction for device-rendered text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextScrollDirection {
    #[default]
    Left,
    Right,
}

impl TextScrollDirection {
    pub fn index(self) -> u8 {
        match self {
            TextScrollDirection::Left => 0,
            TextScrollDirection::Right => 1,
        }
    }
}

/// One request to the device. Field names serialize to the device's keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "Command")]
pub enum Command {
    /// Upload one frame of an animation as base64 RGB data.
    #[serde(rename = "Draw/SendHttpGif")]
    SendHttpGif {
        #[serde(rename = "PicNum")]
        pic_num: u32,
        #[serde(rename = "PicWidth")]
        pic_width: u32,
        #[serde(rename = "PicOffset")]
        pic_offset: u32,
        #[serde(rename = "PicID")]
        pic_id: u32,
        #[serde(rename = "PicSpeed")]
        pic_speed: u32,
        #[serde(rename = "PicData")]
        pic_data: String,
    },

    #[serde(rename = "Draw/GetHttpGifId")]
    GetHttpGifId,

    #[serde(rename = "Draw/ResetHttpGifId")]
    ResetHttpGifId,

    #[serde(rename = "Channel/SetBrightness")]
    SetBrightness {
        #[serde(rename = "Brightness")]
        brightness: u8,
    },

    #[serde(rename = "Channel/SetIndex")]
    SetChannel {
        #[serde(rename = "SelectIndex")]
        select_index: u8,
    },

    #[serde(rename = "Channel/SetClockSelectId")]
    SetClock {
        #[serde(rename = "ClockId")]
        clock_id: u32,
    },

    #[serde(rename = "Channel/SetCustomPageIndex")]
    SetCustomPage {
        #[serde(rename = "CustomPageIndex")]
        custom_page_index: u32,
    },

    #[serde(rename = "Channel/OnOffScreen")]
    SetScreen {
        #[serde(rename = "OnOff")]
        on_off: u8,
    },

    #[serde(rename = "Channel/SetEqPosition")]
    SetVisualizer {
        #[serde(rename = "EqPosition")]
        eq_position: u32,
    },

    /// Text rendered and scrolled by the device itself, on top of the current frame.
    #[serde(rename = "Draw/SendText")]
    SendText {
        #[serde(rename = "TextId")]
        text_id: u8,
        x: i32,
        y: i32,
        dir: u8,
        font: u32,
        #[serde(rename = "TextWidth")]
        text_width: u32,
        speed: u32,
        #[serde(rename = "TextString")]
        text_string: String,
        color: String,
        align: u8,
    },

    #[serde(rename = "Tools/SetTimer")]
    SetTimer {
        #[serde(rename = "Minute")]
        minute: u32,
        #[serde(rename = "Second")]
        second: u32,
        #[serde(rename = "Status")]
        status: u8,
    },

    #[serde(rename = "Tools/SetScoreBoard")]
    SetScoreBoard {
        #[serde(rename = "BlueScore")]
        blue_score: u32,
        #[serde(rename = "RedScore")]
        red_score: u32,
    },

    /// Status 0 stops, 1 starts, 2 resets.
    #[serde(rename = "Tools/SetStopWatch")]
    SetStopWatch {
        #[serde(rename = "Status")]
        status: u8,
    },
}

impl Command {
    /// Device-side command name, e.g. `Draw/SendHttpGif`.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SendHttpGif { .. } => "Draw/SendHttpGif",
            Command::GetHttpGifId => "Draw/GetHttpGifId",
            Command::ResetHttpGifId => "Draw/ResetHttpGifId",
            Command::SetBrightness { .. } => "Channel/SetBrightness",
            Command::SetChannel { .. } => "Channel/SetIndex",
            Command::SetClock { .. } => "Channel/SetClockSelectId",
            Command::SetCustomPage { .. } => "Channel/SetCustomPageIndex",
            Command::SetScreen { .. } => "Channel/OnOffScreen",
            Command::SetVisualizer { .. } => "Channel/SetEqPosition",
            Command::SendText { .. } => "Draw/SendText",
            Command::SetTimer { .. } => "Tools/SetTimer",
            Command::SetScoreBoard { .. } => "Tools/SetScoreBoard",
            Command::SetStopWatch { .. } => "Tools/SetStopWatch",
        }
    }

    /// The keyed parameters, without the `Command` name.
    pub fn parameters(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("Command");
                map
            }
            _ => Map::new(),
        }
    }
}

/// Decoded JSON reply. `error_code` 0 means success.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub error_code: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Reply {
    /// Turn a non-zero `error_code` into an error for `command`.
    pub fn check(self, command: &'static str) -> Result<Self> {
        if self.error_code != 0 {
            return Err(Error::Device {
                command,
                code: self.error_code,
            });
        }
        Ok(self)
    }

    /// Current animation id reported by `Draw/GetHttpGifId`.
    ///
    /// Firmware versions differ on whether `PicId` is a number or a string.
    pub fn pic_id(&self) -> Result<u32> {
        let command = "Draw/GetHttpGifId";
        let value = self.fields.get("PicId").ok_or_else(|| Error::MalformedReply {
            command,
            reason: "missing PicId".to_string(),
        })?;

        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| Error::MalformedReply {
            command,
            reason: format!("PicId is not a counter: {value}"),
        })
    }
}

/// Anything that can execute a [`Command`] against a device.
///
/// Calls block until the device answers. Failures are returned as-is; the
/// caller decides whether to retry.
pub trait CommandChannel {
    fn execute(&mut self, command: &Command) -> Result<Reply>;
}

/// Blocking HTTP transport to a Pixoo on the local network.
pub struct HttpChannel {
    url: String,
    agent: ureq::Agent,
}

impl HttpChannel {
    pub fn new(address: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            url: format!("http://{address}/post"),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CommandChannel for HttpChannel {
    fn execute(&mut self, command: &Command) -> Result<Reply> {
        let name = command.name();
        let response = self
            .agent
            .post(&self.url)
            .send_json(command)
            .map_err(|source| Error::Transport {
                command: name,
                source: Box::new(source),
            })?;

        let reply: Reply = response.into_json().map_err(|e| Error::MalformedReply {
            command: name,
            reason: e.to_string(),
        })?;
        reply.check(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn send_http_gif_uses_device_keys() {
        let command = Command::SendHttpGif {
            pic_num: 1,
            pic_width: 64,
            pic_offset: 0,
            pic_id: 7,
            pic_speed: 1000,
            pic_data: "AAAA".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "Command": "Draw/SendHttpGif",
                "PicNum": 1,
                "PicWidth": 64,
                "PicOffset": 0,
                "PicID": 7,
                "PicSpeed": 1000,
                "PicData": "AAAA",
            })
        );
    }

    #[test]
    fn unit_commands_carry_only_the_name() {
        assert_eq!(
            serde_json::to_value(Command::ResetHttpGifId).unwrap(),
            json!({ "Command": "Draw/ResetHttpGifId" })
        );
        assert!(Command::GetHttpGifId.parameters().is_empty());
    }

    #[test]
    fn name_matches_serialized_tag() {
        let commands = [
            Command::GetHttpGifId,
            Command::SetBrightness { brightness: 50 },
            Command::SetChannel { select_index: 3 },
            Command::SetClock { clock_id: 12 },
            Command::SetCustomPage {
                custom_page_index: 1,
            },
            Command::SetScreen { on_off: 1 },
            Command::SetVisualizer { eq_position: 2 },
            Command::SetTimer {
                minute: 1,
                second: 30,
                status: 1,
            },
            Command::SetScoreBoard {
                blue_score: 3,
                red_score: 4,
            },
            Command::SetStopWatch { status: 2 },
        ];

        for command in commands {
            let value = serde_json::to_value(&command).unwrap();
            assert_eq!(value["Command"], command.name());
        }
    }

    #[test]
    fn parameters_drop_the_command_key() {
        let params = Command::SetScoreBoard {
            blue_score: 3,
            red_score: 4,
        }
        .parameters();
        assert_eq!(Value::Object(params), json!({ "BlueScore": 3, "RedScore": 4 }));
    }

    #[test]
    fn reply_reads_numeric_and_string_pic_id() {
        let numeric: Reply = serde_json::from_value(json!({ "error_code": 0, "PicId": 12 })).unwrap();
        let text: Reply = serde_json::from_value(json!({ "error_code": 0, "PicId": "40" })).unwrap();
        assert_eq!(numeric.pic_id().unwrap(), 12);
        assert_eq!(text.pic_id().unwrap(), 40);
    }

    #[test]
    fn reply_without_pic_id_is_malformed() {
        let reply: Reply = serde_json::from_value(json!({ "error_code": 0 })).unwrap();
        assert!(matches!(reply.pic_id(), Err(Error::MalformedReply { .. })));
    }

    #[test]
    fn non_zero_error_code_is_a_device_error() {
        let reply: Reply = serde_json::from_value(json!({ "error_code": 1 })).unwrap();
        let err = reply.check("Draw/SendHttpGif").unwrap_err();
        assert!(matches!(
            err,
            Error::Device {
                command: "Draw/SendHttpGif",
                code: 1
            }
        ));
    }

    #[test]
    fn http_channel_targets_post_endpoint() {
        let channel = HttpChannel::new("192.168.1.50", Duration::from_secs(2));
        assert_eq!(channel.url(), "http://192.168.1.50/post");
    }
}
