//! In-device tools: scoreboard and stopwatch.
//!
//! These borrow the session for as long as they are in use, so the tool and
//! the drawing API can't interleave device commands.

use crate::command::Command;
use crate::glyph::GlyphResolver;
use crate::{Pixoo, Result};

/// Two-team scoreboard. Every change resends both scores.
pub struct ScoreBoard<'a, F: GlyphResolver> {
    pixoo: &'a mut Pixoo<F>,
    blue: u32,
    red: u32,
}

impl<'a, F: GlyphResolver> ScoreBoard<'a, F> {
    pub(crate) fn open(pixoo: &'a mut Pixoo<F>, blue: u32, red: u32) -> Result<Self> {
        let mut board = Self { pixoo, blue, red };
        board.set_scores(blue, red)?;
        Ok(board)
    }

    pub fn blue_score(&self) -> u32 {
        self.blue
    }

    pub fn red_score(&self) -> u32 {
        self.red
    }

    pub fn set_scores(&mut self, blue: u32, red: u32) -> Result<()> {
        self.blue = blue;
        self.red = red;
        self.pixoo.send(Command::SetScoreBoard {
            blue_score: blue,
            red_score: red,
        })
    }

    pub fn set_blue_score(&mut self, score: u32) -> Result<()> {
        self.set_scores(score, self.red)
    }

    pub fn set_red_score(&mut self, score: u32) -> Result<()> {
        self.set_scores(self.blue, score)
    }
}

/// Stopwatch control values, in the device's numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopWatchAction {
    Stop,
    Start,
    Reset,
}

impl StopWatchAction {
    pub fn status(self) -> u8 {
        match self {
            StopWatchAction::Stop => 0,
            StopWatchAction::Start => 1,
            StopWatchAction::Reset => 2,
        }
    }
}

pub struct StopWatch<'a, F: GlyphResolver> {
    pixoo: &'a mut Pixoo<F>,
}

impl<'a, F: GlyphResolver> StopWatch<'a, F> {
    pub(crate) fn open(pixoo: &'a mut Pixoo<F>) -> Result<Self> {
        let mut watch = Self { pixoo };
        watch.reset()?;
        Ok(watch)
    }

    pub fn start(&mut self) -> Result<()> {
        self.pixoo.set_stop_watch(StopWatchAction::Start)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.pixoo.set_stop_watch(StopWatchAction::Stop)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.pixoo.set_stop_watch(StopWatchAction::Reset)
    }
}
