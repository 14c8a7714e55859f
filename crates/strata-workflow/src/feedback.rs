//! Player-facing feedback: notices and the blocked-cell highlight.

use std::fmt;
use std::time::{Duration, Instant};

use strata_voxel::{MaterialCode, Position};

use crate::error::ColorError;

/// A message for the actor. Hosts translate [`Notice::key`] into text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A disallowed material sits inside the pack box.
    IllegalMaterial(MaterialCode),
    /// The floor under the unpack box is not solid.
    SolidGround,
    /// Something in the unpack box cannot be cleared.
    ClearArea,
    /// The stored schematic could not be read.
    UnpackError,
}

impl Notice {
    /// Translation key.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::IllegalMaterial(_) => "strata:illegal-material",
            Notice::SolidGround => "strata:solid-ground",
            Notice::ClearArea => "strata:clear-area",
            Notice::UnpackError => "strata:unpack-error",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::IllegalMaterial(code) => write!(f, "{} cannot be packed", code),
            Notice::SolidGround => f.write_str("the area needs solid ground"),
            Notice::ClearArea => f.write_str("the area must be clear"),
            Notice::UnpackError => f.write_str("the stored structure is unreadable"),
        }
    }
}

/// Receives feedback on behalf of one actor.
pub trait FeedbackSink {
    /// Shows `positions` in `color` until [`FeedbackSink::clear_highlight`].
    fn highlight(&mut self, positions: &[Position], color: HighlightColor);
    fn clear_highlight(&mut self);
    fn notify(&mut self, notice: &Notice);
}

/// Forwards feedback to the log. Used by headless hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn highlight(&mut self, positions: &[Position], color: HighlightColor) {
        tracing::info!(
            "highlighting {} blocked cells in {:#010x}",
            positions.len(),
            color.to_abgr()
        );
    }

    fn clear_highlight(&mut self) {
        tracing::debug!("highlight cleared");
    }

    fn notify(&mut self, notice: &Notice) {
        tracing::info!("{} ({})", notice, notice.key());
    }
}

/// A colour stored as `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightColor(u32);

impl HighlightColor {
    pub const fn from_argb(argb: u32) -> Self {
        Self(argb)
    }

    /// Parses hex ARGB with an optional `#`, `0x` or `&h` prefix.
    /// Six digits are read as opaque RGB.
    pub fn parse(raw: &str) -> Result<Self, ColorError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| strip_prefix_ignore_case(trimmed, "0x"))
            .or_else(|| strip_prefix_ignore_case(trimmed, "&h"))
            .unwrap_or(trimmed);

        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorError::Invalid(raw.to_string()))?;
        match digits.len() {
            6 => Ok(Self(0xFF00_0000 | value)),
            8 => Ok(Self(value)),
            _ => Err(ColorError::Invalid(raw.to_string())),
        }
    }

    pub fn argb(self) -> u32 {
        self.0
    }

    /// Same colour with red and blue swapped, as hosts expect it.
    pub fn to_abgr(self) -> u32 {
        let a = (self.0 >> 24) & 0xFF;
        let r = (self.0 >> 16) & 0xFF;
        let g = (self.0 >> 8) & 0xFF;
        let b = self.0 & 0xFF;
        (a << 24) | (b << 16) | (g << 8) | r
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

/// At most one pending highlight; a new one replaces the old deadline.
#[derive(Clone, Debug)]
pub struct HighlightScheduler {
    duration: Duration,
    deadline: Option<Instant>,
}

impl HighlightScheduler {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Highlights `positions` and restarts the timer. Empty input does nothing.
    pub fn show(
        &mut self,
        sink: &mut dyn FeedbackSink,
        positions: &[Position],
        color: HighlightColor,
        now: Instant,
    ) {
        if positions.is_empty() {
            return;
        }
        sink.highlight(positions, color);
        self.deadline = Some(now + self.duration);
    }

    /// Clears the highlight once its deadline has passed. Returns `true` if it did.
    pub fn poll(&mut self, sink: &mut dyn FeedbackSink, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                sink.clear_highlight();
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
