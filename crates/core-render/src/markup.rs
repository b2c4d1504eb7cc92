//! Page markup emitted for a `Preview`.

use crate::display::Preview;
use crate::mapper::{FragmentKind, PageFragment};
use quick_xml::escape::escape;
use std::fmt::Write as _;

pub const PLACEHOLDER_TEXT: &str = "Start typing to see your document";
pub const COMPILING_TEXT: &str = "⌛ compiling…";

/// Standalone SVG for one fragment. `Whole` fragments return the compiler
/// output untouched.
pub fn fragment_svg(fragment: &PageFragment) -> String {
    match (fragment.kind, fragment.view_box) {
        (FragmentKind::Cropped, Some(vb)) => format!(
            r#"<svg viewBox="{vb}" width="100%" height="{h}pt" xmlns="http://www.w3.org/2000/svg" style="background: white; display: block;">{content}</svg>"#,
            h = vb.height,
            content = fragment.content,
        ),
        _ => fragment.content.to_string(),
    }
}

/// Full preview document for any display state.
pub fn preview_html(preview: &Preview) -> String {
    let body = match preview {
        Preview::Placeholder => {
            format!(r#"<div class="placeholder"><div>{PLACEHOLDER_TEXT}</div></div>"#)
        }
        Preview::Compiling => format!(r#"<div class="placeholder">{COMPILING_TEXT}</div>"#),
        Preview::Error(message) => format!(
            r#"<pre class="error" style="color:red; padding: 1rem;">{}</pre>"#,
            escape(message.as_str())
        ),
        Preview::Pages(fragments) => pages_html(fragments),
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>livepage preview</title></head>\n<body>\n<div id=\"preview\">{body}</div>\n</body>\n</html>\n"
    )
}

fn pages_html(fragments: &[PageFragment]) -> String {
    let total = fragments.len();
    let mut html = String::from(r#"<div class="pages-container">"#);
    for fragment in fragments {
        let svg = fragment_svg(fragment);
        if total > 1 {
            let _ = write!(
                html,
                r#"<div class="page-wrapper" data-page="{i}"><div class="svg-page">{svg}</div><div class="page-info">Page {i} of {total}</div></div>"#,
                i = fragment.index,
            );
        } else {
            let _ = write!(
                html,
                r#"<div class="page-wrapper"><div class="svg-page">{svg}</div></div>"#
            );
        }
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::slice;
    use crate::paginate::layout;
    use core_model::{VectorSurface, ViewBox};

    #[test]
    fn cropped_fragment_carries_window() {
        let s = VectorSurface::from_parts(ViewBox::new(0.0, 0.0, 600.0, 2000.0), "<g/>");
        let frags = slice(&s, &layout(2000.0));
        let svg = fragment_svg(&frags[1]);
        assert!(svg.starts_with(r#"<svg viewBox="0 792 600 792""#), "{svg}");
        assert!(svg.contains(r#"height="792pt""#));
        assert!(svg.ends_with("<g/></svg>"));
    }

    #[test]
    fn multi_page_html_has_captions() {
        let s = VectorSurface::from_parts(ViewBox::new(0.0, 0.0, 600.0, 2000.0), "<g/>");
        let html = preview_html(&Preview::Pages(slice(&s, &layout(2000.0))));
        assert!(html.contains("Page 1 of 3"));
        assert!(html.contains("Page 3 of 3"));
        assert!(html.contains(r#"data-page="2""#));
    }

    #[test]
    fn error_text_is_escaped_verbatim() {
        let html = preview_html(&Preview::Error("error: unexpected <tag> & \"q\"".into()));
        assert!(html.contains("error: unexpected &lt;tag&gt; &amp; &quot;q&quot;"));
    }

    #[test]
    fn error_text_cannot_close_the_pre_block() {
        let html = preview_html(&Preview::Error("</pre><script>x</script>".into()));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;/pre&gt;&lt;script&gt;"));
    }

    #[test]
    fn placeholder_markup() {
        assert!(preview_html(&Preview::Placeholder).contains(PLACEHOLDER_TEXT));
        assert!(preview_html(&Preview::Compiling).contains(COMPILING_TEXT));
    }
}
