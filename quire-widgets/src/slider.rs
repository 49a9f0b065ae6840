//! Distill-style range slider.
//!
//! A horizontal track with a draggable knob and a filled region. The slider
//! owns its numeric state and exposes the transitions a host drives:
//! drag start/move/end, key presses, and programmatic updates.

use crate::error::{WidgetError, WidgetResult};
use crate::scale::{range, Scale};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

/// Number of ticks drawn when the step is continuous.
const CONTINUOUS_TICK_COUNT: usize = 10;

/// Fraction of the range moved per key press when the step is continuous.
const CONTINUOUS_KEY_FRACTION: f64 = 0.01;

/// Slop allowed past `max` when laying out step ticks.
const TICK_EPSILON: f64 = 1e-6;

/// Step ticks beyond this count are replaced by nice ticks.
const MAX_STEP_TICKS: f64 = 1000.0;

/// Quantization step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Fixed(f64),
    /// Any value in range is allowed (`step="any"`).
    Continuous,
}

impl Step {
    /// Parse a `data-step` attribute. `"any"` is continuous; anything else must
    /// be a positive finite number.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("any") {
            return Some(Step::Continuous);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Step::Fixed)
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::Fixed(1.0)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Fixed(step) => write!(f, "{}", step),
            Step::Continuous => f.write_str("any"),
        }
    }
}

/// Construction options for a [`Slider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    #[serde(default)]
    pub min: f64,

    #[serde(default = "default_max")]
    pub max: f64,

    #[serde(default)]
    pub step: Step,

    /// Initial value; defaults to `min`.
    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default)]
    pub show_ticks: bool,
}

fn default_max() -> f64 {
    100.0
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_max(),
            step: Step::default(),
            value: None,
            show_ticks: false,
        }
    }
}

impl SliderConfig {
    fn validate(&self) -> WidgetResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(WidgetError::NonFiniteBound);
        }
        if self.min > self.max {
            return Err(WidgetError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        if let Step::Fixed(step) = self.step {
            if !(step.is_finite() && step > 0.0) {
                return Err(WidgetError::InvalidStep(step));
            }
        }
        Ok(())
    }
}

/// Bounding box of the track in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

/// Keys the slider reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Other(String),
}

impl Key {
    /// Map a `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Home" => Key::Home,
            "End" => Key::End,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Whether the host should suppress the browser's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// What the host needs to paint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualState {
    /// Knob `left` offset, percent of track width.
    pub knob_left: f64,
    /// Fill `width`, percent of track width.
    pub fill_width: f64,
    pub dragging: bool,
}

type Callback = Box<dyn FnMut(f64)>;

/// Range slider state machine.
pub struct Slider {
    id: String,
    min: f64,
    max: f64,
    step: Step,
    value: f64,
    dragging: bool,
    show_ticks: bool,
    scale: Scale,
    on_input: Option<Callback>,
    on_change: Option<Callback>,
}

impl fmt::Debug for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slider")
            .field("id", &self.id)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("step", &self.step)
            .field("value", &self.value)
            .field("dragging", &self.dragging)
            .field("show_ticks", &self.show_ticks)
            .finish_non_exhaustive()
    }
}

impl Slider {
    /// Create a slider. The initial value is quantized and clamped like any
    /// other update, without invoking callbacks.
    pub fn new(id: impl Into<String>, config: SliderConfig) -> WidgetResult<Self> {
        config.validate()?;

        let mut slider = Self {
            id: id.into(),
            min: config.min,
            max: config.max,
            step: config.step,
            value: config.min,
            dragging: false,
            show_ticks: config.show_ticks,
            scale: Scale::new(config.min, config.max),
            on_input: None,
            on_change: None,
        };
        let initial = config.value.unwrap_or(config.min);
        slider.value = slider.quantize(initial).unwrap_or(config.min);
        Ok(slider)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Current quantized value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn shows_ticks(&self) -> bool {
        self.show_ticks
    }

    /// Called with the new value whenever user input changes it.
    pub fn on_input(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_input = Some(Box::new(callback));
    }

    /// Called with the final value when a drag ends or a key is handled.
    pub fn on_change(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Programmatic update. Never invokes callbacks.
    pub fn set_value(&mut self, value: f64) {
        self.update(value, false);
    }

    pub fn drag_start(&mut self) {
        self.dragging = true;
    }

    /// Pointer moved to `client_x` while dragging over `track`.
    ///
    /// Returns true when the value changed.
    pub fn drag_move(&mut self, client_x: f64, track: TrackBounds) -> bool {
        let fraction = if track.width > 0.0 {
            ((client_x - track.left) / track.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let candidate = self.scale.invert(fraction);
        self.update(candidate, true)
    }

    pub fn drag_end(&mut self) {
        self.dragging = false;
        self.emit_change();
    }

    pub fn key_down(&mut self, key: &Key) -> KeyOutcome {
        let target = match key {
            Key::ArrowLeft | Key::ArrowDown => self.value - self.key_increment(),
            Key::ArrowRight | Key::ArrowUp => self.value + self.key_increment(),
            Key::Home => self.min,
            Key::End => self.max,
            Key::Other(_) => return KeyOutcome::Ignored,
        };
        self.update(target, true);
        self.emit_change();
        KeyOutcome::Handled
    }

    /// Current fraction of the track, `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.scale.apply(self.value)
    }

    pub fn visual(&self) -> VisualState {
        let percent = self.fraction() * 100.0;
        VisualState {
            knob_left: percent,
            fill_width: percent,
            dragging: self.dragging,
        }
    }

    /// Tick values, empty unless ticks were requested.
    pub fn ticks(&self) -> Vec<f64> {
        if !self.show_ticks {
            return Vec::new();
        }
        match self.step {
            Step::Fixed(step) if (self.max - self.min) / step <= MAX_STEP_TICKS => {
                range(self.min, self.max + TICK_EPSILON, step)
            }
            Step::Fixed(_) | Step::Continuous => self.scale.nice_ticks(CONTINUOUS_TICK_COUNT),
        }
    }

    /// Track, fill, knob and tick markup for the current state.
    pub fn render_markup(&self) -> String {
        let visual = self.visual();
        let class = if visual.dragging {
            "d-slider dragging"
        } else {
            "d-slider"
        };

        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="{class}" tabindex="0" role="slider" aria-valuemin="{min}" aria-valuemax="{max}" aria-valuenow="{value}">"#,
            min = self.min,
            max = self.max,
            value = self.value,
        );
        html.push_str(r#"<div class="d-slider-track"></div>"#);
        let _ = write!(
            html,
            r#"<div class="d-slider-fill" style="width: {}%"></div>"#,
            visual.fill_width
        );
        let _ = write!(
            html,
            r#"<div class="d-slider-knob" style="left: {}%"></div>"#,
            visual.knob_left
        );
        html.push_str(r#"<div class="d-slider-ticks">"#);
        for tick in self.ticks() {
            let _ = write!(
                html,
                r#"<div class="tick" style="left: {}%"></div>"#,
                self.scale.apply(tick) * 100.0
            );
        }
        html.push_str("</div></div>");
        html
    }

    fn key_increment(&self) -> f64 {
        match self.step {
            Step::Fixed(step) => step,
            Step::Continuous => (self.max - self.min) * CONTINUOUS_KEY_FRACTION,
        }
    }

    /// Snap to `min + k * step` (round half up), then clamp. `None` for NaN.
    fn quantize(&self, raw: f64) -> Option<f64> {
        if raw.is_nan() {
            return None;
        }
        let snapped = match self.step {
            Step::Fixed(step) => {
                let k = ((raw - self.min) / step + 0.5).floor();
                self.min + k * step
            }
            Step::Continuous => raw,
        };
        Some(snapped.clamp(self.min, self.max))
    }

    fn update(&mut self, raw: f64, dispatch_input: bool) -> bool {
        let Some(next) = self.quantize(raw) else {
            tracing::debug!(slider = %self.id, "ignoring NaN slider value");
            return false;
        };
        if next == self.value {
            return false;
        }
        self.value = next;
        if dispatch_input {
            if let Some(callback) = self.on_input.as_mut() {
                callback(next);
            }
        }
        true
    }

    fn emit_change(&mut self) {
        let value = self.value;
        if let Some(callback) = self.on_change.as_mut() {
            callback(value);
        }
    }
}
