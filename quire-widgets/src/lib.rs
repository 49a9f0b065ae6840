//! # quire-widgets
//!
//! Interaction state for the widgets quire pages embed.
//!
//! The slider is a plain state machine: the build step feeds it the page's
//! settings and prerenders the markup from its state. In the browser the
//! `slider.js` asset shipped by the CLI drives the same markup with the same
//! snapping and clamping rules. Nothing here touches a DOM directly.

pub mod error;
pub mod registry;
pub mod scale;
pub mod slider;

pub use error::{WidgetError, WidgetResult};
pub use registry::{ElementSpec, SliderRegistry};
pub use scale::Scale;
pub use slider::{Key, KeyOutcome, Slider, SliderConfig, Step, TrackBounds, VisualState};
