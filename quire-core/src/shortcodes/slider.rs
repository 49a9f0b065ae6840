//! `slider` shortcode: a prerendered range slider host element.

use super::{Rendered, RenderContext, Shortcode, ShortcodeCall, ShortcodeError};
use crate::html::escape;
use quire_widgets::registry::SLIDER_ATTR;
use quire_widgets::{ElementSpec, Slider};

const NUMERIC_OPTIONS: [&str; 4] = ["min", "max", "step", "value"];

/// `{% slider "id" min=0 max=10 step=1 value=5 ticks %}`
///
/// The slider is registered on the page so duplicate ids are rejected, and
/// its initial markup is rendered from the quantized state.
pub struct SliderShortcode;

impl Shortcode for SliderShortcode {
    fn name(&self) -> &'static str {
        "slider"
    }

    fn block(&self) -> bool {
        true
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let element = element_spec(call);
        let slider = ctx.build.sliders_mut().register(&element)?;
        Ok(Rendered::Html(host_markup(slider)))
    }
}

fn element_spec(call: &ShortcodeCall) -> ElementSpec {
    let mut element = match call.arg(0).or_else(|| call.kwarg("id")) {
        Some(id) => ElementSpec::new(id),
        None => ElementSpec::anonymous(),
    };
    element = element.with_attr(SLIDER_ATTR, "");
    for option in NUMERIC_OPTIONS {
        if let Some(value) = call.kwarg(option) {
            element = element.with_attr(format!("data-{}", option), value);
        }
    }
    if call.flag("ticks") {
        element = element.with_attr("data-ticks", "");
    }
    element
}

fn host_markup(slider: &Slider) -> String {
    format!(
        r#"<div id="{id}" class="slider-host" {attr} data-min="{min}" data-max="{max}" data-step="{step}" data-value="{value}"{ticks}>{markup}</div>"#,
        id = escape(slider.id()),
        attr = SLIDER_ATTR,
        min = slider.min(),
        max = slider.max(),
        step = slider.step(),
        value = slider.value(),
        ticks = if slider.shows_ticks() { " data-ticks" } else { "" },
        markup = slider.render_markup(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::Bibliography;
    use crate::context::BuildContext;
    use crate::math::MathJaxRenderer;
    use quire_widgets::WidgetError;

    fn call(args: &[&str], kwargs: &[(&str, &str)]) -> ShortcodeCall {
        let mut call = ShortcodeCall::new("slider");
        call.args = args.iter().map(|a| a.to_string()).collect();
        for (k, v) in kwargs {
            call.kwargs.insert(k.to_string(), v.to_string());
        }
        call
    }

    fn render_all(calls: &[ShortcodeCall]) -> Vec<Result<Rendered, ShortcodeError>> {
        let mut build = BuildContext::new();
        build.begin_page("p");
        let bibliography = Bibliography::default();
        let mut ctx = RenderContext {
            build: &mut build,
            bibliography: &bibliography,
            math: &MathJaxRenderer,
        };
        calls
            .iter()
            .map(|c| SliderShortcode.render(c, &mut ctx))
            .collect()
    }

    #[test]
    fn renders_quantized_host() {
        let results = render_all(&[call(
            &["lr", "ticks"],
            &[("min", "0"), ("max", "10"), ("step", "2"), ("value", "3")],
        )]);
        let Ok(Rendered::Html(html)) = &results[0] else {
            panic!("expected html");
        };
        assert!(html.starts_with(
            r#"<div id="lr" class="slider-host" data-slider data-min="0" data-max="10" data-step="2" data-value="4" data-ticks>"#
        ));
        assert!(html.contains(r#"<div class="d-slider-knob" style="left: 40%"></div>"#));
        assert_eq!(html.matches(r#"class="tick""#).count(), 6);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let results = render_all(&[call(&["s"], &[("min", "abc"), ("step", "-1")])]);
        let Ok(Rendered::Html(html)) = &results[0] else {
            panic!("expected html");
        };
        assert!(html.contains(r#"data-min="0" data-max="100" data-step="1" data-value="0""#));
    }

    #[test]
    fn missing_id_and_duplicates_are_rejected() {
        let results = render_all(&[call(&[], &[]), call(&["a"], &[]), call(&["a"], &[])]);
        assert!(matches!(
            results[0],
            Err(ShortcodeError::Widget(WidgetError::MissingId))
        ));
        assert!(results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(ShortcodeError::Widget(WidgetError::DuplicateId(_)))
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let results = render_all(&[call(&["bad"], &[("min", "5"), ("max", "1")])]);
        assert!(matches!(
            results[0],
            Err(ShortcodeError::Widget(WidgetError::InvalidRange { .. }))
        ));
    }
}
