//! `footnote` shortcode and the per-page footnote list.

use super::{Rendered, RenderContext, Shortcode, ShortcodeCall, ShortcodeError};
use crate::html::escape;
use crate::models::Footnote;

/// `{% footnote %}text{% endfootnote %}`: numbered reference marker.
pub struct FootnoteShortcode;

impl Shortcode for FootnoteShortcode {
    fn name(&self) -> &'static str {
        "footnote"
    }

    fn paired(&self) -> bool {
        true
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let note = ctx.build.next_footnote(call.body().trim());
        Ok(Rendered::Html(footnote_marker(note)))
    }
}

pub fn footnote_marker(note: &Footnote) -> String {
    format!(
        r##"<sup class="footnote-ref"><a href="#fn{id}" id="fnref{id}" title="{title}">[{id}]</a></sup>"##,
        id = note.id,
        title = escape(&note.tooltip)
    )
}

/// `<section class="footnotes">` listing `footnotes` with back links, or
/// `None` when there are none.
pub fn render_footnotes(footnotes: &[Footnote]) -> Option<String> {
    if footnotes.is_empty() {
        return None;
    }

    let mut html = String::from(r#"<section class="footnotes"><hr><ol>"#);
    for note in footnotes {
        html.push_str(&format!(
            r##"<li id="fn{id}">{content} <a class="footnote-backref" href="#fnref{id}" aria-label="Back to reference {id}">&#8617;</a></li>"##,
            id = note.id,
            content = note.content
        ));
    }
    html.push_str("</ol></section>");
    Some(html)
}
