//! Explicit slider registration.
//!
//! Host code hands over the elements it wants turned into sliders; nothing is
//! discovered implicitly. Each element is registered independently, so one
//! bad element never prevents its siblings from initializing.

use crate::error::{WidgetError, WidgetResult};
use crate::slider::{Slider, SliderConfig, Step};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, warn};

/// Marker attribute identifying slider hosts.
pub const SLIDER_ATTR: &str = "data-slider";

/// A host element as seen by the registry: its id and `data-*` attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSpec {
    pub id: Option<String>,
    pub attributes: HashMap<String, String>,
}

impl ElementSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: HashMap::new(),
        }
    }

    /// An element without an id.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Slider options from `data-min`, `data-max`, `data-step`, `data-value`
    /// and the presence of `data-ticks`. Unparseable numbers use defaults.
    pub fn slider_config(&self) -> SliderConfig {
        let defaults = SliderConfig::default();
        let min = self.number("data-min").unwrap_or(defaults.min);
        let max = self.number("data-max").unwrap_or(defaults.max);
        let step = match self.attr("data-step") {
            Some(raw) => Step::parse(raw).unwrap_or_else(|| {
                warn!(element = ?self.id, step = raw, "invalid slider step, using default");
                defaults.step
            }),
            None => defaults.step,
        };

        SliderConfig {
            min,
            max,
            step,
            value: self.number("data-value"),
            show_ticks: self.has_attr("data-ticks"),
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.attr(name)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// Sliders keyed by element id.
#[derive(Debug, Default)]
pub struct SliderRegistry {
    sliders: BTreeMap<String, Slider>,
}

impl SliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a slider for one element.
    pub fn register(&mut self, element: &ElementSpec) -> WidgetResult<&mut Slider> {
        let id = match element.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                error!("Slider element must have an id");
                return Err(WidgetError::MissingId);
            }
        };
        if self.sliders.contains_key(&id) {
            error!(id = %id, "slider already registered");
            return Err(WidgetError::DuplicateId(id));
        }

        let slider = Slider::new(id.clone(), element.slider_config()).map_err(|err| {
            error!(id = %id, "Error creating slider: {}", err);
            err
        })?;
        debug!(id = %id, value = slider.value(), "registered slider");
        Ok(self.sliders.entry(id).or_insert(slider))
    }

    /// Register every element carrying [`SLIDER_ATTR`]. Failures are logged and
    /// skipped; returns how many sliders were created.
    pub fn register_all<'a>(&mut self, elements: impl IntoIterator<Item = &'a ElementSpec>) -> usize {
        elements
            .into_iter()
            .filter(|el| el.has_attr(SLIDER_ATTR))
            .filter(|el| self.register(el).is_ok())
            .count()
    }

    pub fn get(&self, id: &str) -> Option<&Slider> {
        self.sliders.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Slider> {
        self.sliders.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slider)> {
        self.sliders.iter().map(|(id, s)| (id.as_str(), s))
    }
}
