//! Action types and their wire payloads.
//!
//! An [`Action`] is one unit of robot behavior: a light color, a wheel
//! command, something on the 5x5 display, a buzzer tone, or a pause. Actions
//! are built by [`CommandQueue`](crate::CommandQueue) builder calls, consumed
//! once by the controller's drain loop, and then dropped.
//!
//! # Wire Format
//!
//! | Action | Payload |
//! |--------|---------|
//! | `SetColor` | `[r, g, b]` |
//! | `SetMotion` | `[left_fwd, left_rev, right_fwd, right_rev]`, each 0-100 |
//! | `DisplayText` | `0x01` followed by ASCII text |
//! | `DisplayPattern` | `0x02` followed by 25 cells (0/1), row-major |
//! | `EmitTone` | frequency as big-endian `u16`, 0 = silence |
//! | `Wait` | nothing; the drain loop sleeps |
//!
//! Numeric inputs are clamped when the action is constructed, so rendering is
//! a pure, total function of the stored fields.
//!
//! ```rust
//! use wac_robot::Action;
//!
//! assert_eq!(Action::set_color(300, -5, 128).render(), vec![255, 0, 128]);
//! assert_eq!(Action::set_motion(-40, 100).render(), vec![0, 40, 100, 0]);
//! assert_eq!(Action::tone(440).render(), vec![0x01, 0xB8]);
//! ```

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ExecutionError;
use crate::traits::Channel;

// ============================================================================
// GATT Identities
// ============================================================================

/// Service and characteristic UUIDs exposed by the robot firmware.
pub mod gatt {
    /// RGB light service.
    pub const LIGHTS_SERVICE: &str = "1A230001-C2ED-4D11-AD1E-FC06D8A02D37";
    /// RGB light configuration characteristic.
    pub const LIGHTS_CHAR: &str = "1A230002-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Wheel motor service.
    pub const WHEELS_SERVICE: &str = "1A240001-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Wheel motor configuration characteristic.
    pub const WHEELS_CHAR: &str = "1A240002-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Dot-matrix display service.
    pub const DISPLAY_SERVICE: &str = "1A250001-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Dot-matrix display characteristic (text and patterns).
    pub const DISPLAY_CHAR: &str = "1A250002-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Buzzer service.
    pub const BUZZER_SERVICE: &str = "1A260001-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Buzzer frequency characteristic.
    pub const BUZZER_CHAR: &str = "1A260002-C2ED-4D11-AD1E-FC06D8A02D37";
    /// Button notification characteristic (one byte: 0 none, 1 A, 2 B).
    pub const BUTTONS_CHAR: &str = "1A270002-C2ED-4D11-AD1E-FC06D8A02D37";
}

/// Where an action's payload is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GattTarget {
    /// Service UUID.
    pub service: &'static str,
    /// Characteristic UUID.
    pub characteristic: &'static str,
}

const LIGHTS: GattTarget = GattTarget {
    service: gatt::LIGHTS_SERVICE,
    characteristic: gatt::LIGHTS_CHAR,
};
const WHEELS: GattTarget = GattTarget {
    service: gatt::WHEELS_SERVICE,
    characteristic: gatt::WHEELS_CHAR,
};
const DISPLAY: GattTarget = GattTarget {
    service: gatt::DISPLAY_SERVICE,
    characteristic: gatt::DISPLAY_CHAR,
};
const BUZZER: GattTarget = GattTarget {
    service: gatt::BUZZER_SERVICE,
    characteristic: gatt::BUZZER_CHAR,
};

/// Payload tag for text display writes.
pub const TEXT_TAG: u8 = 0x01;
/// Payload tag for dot-matrix pattern writes.
pub const PATTERN_TAG: u8 = 0x02;
/// Largest magnitude accepted by either wheel.
pub const MAX_MOTION: i32 = 100;

// ============================================================================
// Pattern
// ============================================================================

/// Side length of the dot-matrix display.
pub const GRID_SIZE: usize = 5;
/// Number of cells on the dot-matrix display.
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// A lit/unlit image for the 5x5 display.
///
/// # Example
///
/// ```rust
/// use wac_robot::Pattern;
///
/// let arrow = Pattern::from_cells(&[
///     0, 0, 1, 0, 0,
///     0, 1, 1, 1, 0,
///     0, 0, 1, 0, 0,
///     0, 0, 1, 0, 0,
///     0, 0, 1, 0, 0,
/// ]);
/// assert!(arrow.is_lit(0, 2));
/// assert_eq!(arrow.lit_count(), 7);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl Pattern {
    /// All cells off. This is what "clear display" sends.
    pub const fn blank() -> Self {
        Self {
            cells: [[false; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Build from row-major cells. Nonzero means lit.
    ///
    /// Extra cells are ignored; missing cells are off.
    pub fn from_cells(cells: &[u8]) -> Self {
        let mut pattern = Self::blank();
        for (i, &cell) in cells.iter().take(GRID_CELLS).enumerate() {
            pattern.cells[i / GRID_SIZE][i % GRID_SIZE] = cell != 0;
        }
        pattern
    }

    /// Build from five rows of five cells.
    pub fn from_rows(rows: [[u8; GRID_SIZE]; GRID_SIZE]) -> Self {
        let mut pattern = Self::blank();
        for (r, row) in rows.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                pattern.cells[r][c] = cell != 0;
            }
        }
        pattern
    }

    /// Light the first `lit` cells in row-major order (a progress bar).
    pub fn progress(lit: usize) -> Self {
        let mut pattern = Self::blank();
        for i in 0..lit.min(GRID_CELLS) {
            pattern.cells[i / GRID_SIZE][i % GRID_SIZE] = true;
        }
        pattern
    }

    /// Whether the cell at `row`, `col` is lit. Out-of-range cells are off.
    pub fn is_lit(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Number of lit cells.
    pub fn lit_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    /// Cells as 0/1 bytes in row-major order.
    pub fn to_bytes(&self) -> [u8; GRID_CELLS] {
        let mut out = [0u8; GRID_CELLS];
        for (i, &cell) in self.cells.iter().flatten().enumerate() {
            out[i] = u8::from(cell);
        }
        out
    }
}

// ============================================================================
// Action
// ============================================================================

/// Discriminant of an [`Action`], used for status and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    /// Light color change.
    SetColor,
    /// Wheel command.
    SetMotion,
    /// Timed pause.
    Wait,
    /// Scrolling text.
    DisplayText,
    /// Dot-matrix image.
    DisplayPattern,
    /// Buzzer tone.
    EmitTone,
}

impl ActionKind {
    /// Returns the kind name, e.g. `"SetColor"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SetColor => "SetColor",
            ActionKind::SetMotion => "SetMotion",
            ActionKind::Wait => "Wait",
            ActionKind::DisplayText => "DisplayText",
            ActionKind::DisplayPattern => "DisplayPattern",
            ActionKind::EmitTone => "EmitTone",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of robot behavior.
///
/// Prefer the constructors ([`Action::set_color`], [`Action::set_motion`], ...)
/// over the variants: they clamp inputs to the device's physical ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Set the RGB light.
    SetColor {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },

    /// Drive both wheels. Positive is forward, negative is reverse.
    SetMotion {
        /// Left wheel, -100 to 100.
        left: i8,
        /// Right wheel, -100 to 100.
        right: i8,
    },

    /// Pause the drain loop without touching the channel.
    Wait {
        /// Pause length in milliseconds.
        duration_ms: u64,
    },

    /// Show text on the display.
    DisplayText(String),

    /// Show a dot-matrix image.
    DisplayPattern(Pattern),

    /// Sound the buzzer. Zero silences it.
    EmitTone {
        /// Frequency in Hz.
        frequency: u16,
    },
}

/// Split a wheel value into `(forward, reverse)` magnitudes.
///
/// The value is clamped to `[-100, 100]` first; at most one side is nonzero
/// and `forward - reverse` equals the clamped value.
///
/// ```rust
/// use wac_robot::actions::motion_components;
///
/// assert_eq!(motion_components(60), (60, 0));
/// assert_eq!(motion_components(-250), (0, 100));
/// assert_eq!(motion_components(0), (0, 0));
/// ```
pub fn motion_components(value: i32) -> (u8, u8) {
    let v = value.clamp(-MAX_MOTION, MAX_MOTION);
    (v.max(0) as u8, (-v).max(0) as u8)
}

impl Action {
    /// Light color, each channel clamped to `[0, 255]`.
    pub fn set_color(red: i32, green: i32, blue: i32) -> Self {
        Action::SetColor {
            red: red.clamp(0, 255) as u8,
            green: green.clamp(0, 255) as u8,
            blue: blue.clamp(0, 255) as u8,
        }
    }

    /// Wheel command, each side clamped to `[-100, 100]`.
    pub fn set_motion(left: i32, right: i32) -> Self {
        Action::SetMotion {
            left: left.clamp(-MAX_MOTION, MAX_MOTION) as i8,
            right: right.clamp(-MAX_MOTION, MAX_MOTION) as i8,
        }
    }

    /// Both wheels stopped.
    pub fn stop() -> Self {
        Action::set_motion(0, 0)
    }

    /// Pause for `duration_ms` milliseconds.
    pub fn wait(duration_ms: u64) -> Self {
        Action::Wait { duration_ms }
    }

    /// Text for the display.
    pub fn display_text(text: impl Into<String>) -> Self {
        Action::DisplayText(text.into())
    }

    /// Image for the display.
    pub fn display_pattern(pattern: Pattern) -> Self {
        Action::DisplayPattern(pattern)
    }

    /// Blank display.
    pub fn clear_display() -> Self {
        Action::DisplayPattern(Pattern::blank())
    }

    /// Buzzer tone, clamped to the 16-bit frequency range.
    pub fn tone(frequency: u32) -> Self {
        Action::EmitTone {
            frequency: frequency.min(u32::from(u16::MAX)) as u16,
        }
    }

    /// Silence the buzzer.
    pub fn tone_off() -> Self {
        Action::EmitTone { frequency: 0 }
    }

    /// The kind of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::SetColor { .. } => ActionKind::SetColor,
            Action::SetMotion { .. } => ActionKind::SetMotion,
            Action::Wait { .. } => ActionKind::Wait,
            Action::DisplayText(_) => ActionKind::DisplayText,
            Action::DisplayPattern(_) => ActionKind::DisplayPattern,
            Action::EmitTone { .. } => ActionKind::EmitTone,
        }
    }

    /// The service/characteristic this action writes to. `None` for `Wait`.
    pub const fn target(&self) -> Option<GattTarget> {
        match self {
            Action::SetColor { .. } => Some(LIGHTS),
            Action::SetMotion { .. } => Some(WHEELS),
            Action::DisplayText(_) | Action::DisplayPattern(_) => Some(DISPLAY),
            Action::EmitTone { .. } => Some(BUZZER),
            Action::Wait { .. } => None,
        }
    }

    /// How long executing this action suspends the caller beyond the write.
    pub fn duration(&self) -> Duration {
        match self {
            Action::Wait { duration_ms } => Duration::from_millis(*duration_ms),
            _ => Duration::ZERO,
        }
    }

    /// Render the transport payload.
    pub fn render(&self) -> Vec<u8> {
        match self {
            Action::SetColor { red, green, blue } => vec![*red, *green, *blue],
            Action::SetMotion { left, right } => {
                let (left_fwd, left_rev) = motion_components(i32::from(*left));
                let (right_fwd, right_rev) = motion_components(i32::from(*right));
                vec![left_fwd, left_rev, right_fwd, right_rev]
            }
            Action::Wait { .. } => Vec::new(),
            Action::DisplayText(text) => {
                let mut out = Vec::with_capacity(text.len() + 1);
                out.push(TEXT_TAG);
                out.extend(
                    text.chars()
                        .map(|c| if c.is_ascii() { c as u8 } else { b'?' }),
                );
                out
            }
            Action::DisplayPattern(pattern) => {
                let mut out = Vec::with_capacity(GRID_CELLS + 1);
                out.push(PATTERN_TAG);
                out.extend_from_slice(&pattern.to_bytes());
                out
            }
            Action::EmitTone { frequency } => frequency.to_be_bytes().to_vec(),
        }
    }

    /// Execute against `channel`.
    ///
    /// Writes the rendered payload once, or sleeps for a `Wait`. A failed
    /// write is returned as-is; deciding what to do with the rest of the
    /// queue is the caller's job.
    pub async fn execute<C: Channel>(&self, channel: &mut C) -> Result<(), ExecutionError> {
        match self.target() {
            Some(target) => {
                let payload = self.render();
                debug!(kind = %self.kind(), ?payload, "writing action");
                channel
                    .write_payload(target.service, target.characteristic, &payload)
                    .await?;
            }
            None => {
                trace!(duration = ?self.duration(), "waiting");
                tokio::time::sleep(self.duration()).await;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetColor { red, green, blue } => write!(f, "SetColor({red}, {green}, {blue})"),
            Action::SetMotion { left, right } => write!(f, "SetMotion({left}, {right})"),
            Action::Wait { duration_ms } => write!(f, "Wait({duration_ms}ms)"),
            Action::DisplayText(text) => write!(f, "DisplayText({text:?})"),
            Action::DisplayPattern(p) => write!(f, "DisplayPattern({} lit)", p.lit_count()),
            Action::EmitTone { frequency } => write!(f, "EmitTone({frequency}Hz)"),
        }
    }
}

/// The canonical "everything off" sequence: blank display, stop wheels,
/// lights off, buzzer off.
pub fn shutdown_sequence() -> [Action; 4] {
    [
        Action::clear_display(),
        Action::stop(),
        Action::set_color(0, 0, 0),
        Action::tone_off(),
    ]
}
