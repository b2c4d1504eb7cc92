//! Compiler vector output.
//!
//! The compiler hands back SVG text. Only the root element's `viewBox` and
//! its inner markup matter to the pipeline: the box drives pagination, the
//! inner markup is shared (never copied) by every page fragment.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Bounding box of a vector surface (`x y width height`), in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Parse the value of a `viewBox` attribute. Separators may be whitespace
    /// and/or commas. Rejects non-finite numbers and negative extents.
    pub fn parse(value: &str) -> Option<Self> {
        let mut nums = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok().filter(|n| n.is_finite()));
        let x = nums.next()??;
        let y = nums.next()??;
        let width = nums.next()??;
        let height = nums.next()??;
        if nums.next().is_some() || width < 0.0 || height < 0.0 {
            return None;
        }
        Some(Self::new(x, y, width, height))
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// One compile result: the raw markup plus its parsed bounding box.
///
/// `view_box` is `None` when the output has no root `<svg>` element or no
/// usable `viewBox`; such surfaces are displayed as a single unpaginated page.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSurface {
    source: Arc<str>,
    content: Arc<str>,
    view_box: Option<ViewBox>,
}

impl VectorSurface {
    /// Build a surface from compiler SVG output.
    pub fn from_svg(svg: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = svg.into();
        let Some(root) = RootElement::find(&source) else {
            tracing::debug!(target: "model.surface", len = source.len(), "svg_root_missing");
            return Self {
                content: source.clone(),
                source,
                view_box: None,
            };
        };
        if root.view_box.is_none() {
            tracing::debug!(target: "model.surface", "svg_view_box_missing");
        }
        let content: Arc<str> = Arc::from(&source[root.inner]);
        Self {
            source,
            content,
            view_box: root.view_box,
        }
    }

    /// Build a surface directly from a box and inner markup.
    pub fn from_parts(view_box: ViewBox, content: impl Into<Arc<str>>) -> Self {
        let content: Arc<str> = content.into();
        let source = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{view_box}" width="{w}pt" height="{h}pt">{content}</svg>"#,
            w = view_box.width,
            h = view_box.height,
        );
        Self {
            source: Arc::from(source),
            content,
            view_box: Some(view_box),
        }
    }

    /// Unmodified compiler output.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Markup between the root element's start and end tags.
    pub fn content(&self) -> &Arc<str> {
        &self.content
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }

    pub fn height(&self) -> Option<f64> {
        self.view_box.map(|vb| vb.height)
    }
}

/// First `<svg>` element in the source: its parsed `viewBox` and the byte
/// range between its start and end tags.
struct RootElement {
    view_box: Option<ViewBox>,
    inner: Range<usize>,
}

impl RootElement {
    fn find(src: &str) -> Option<Self> {
        let mut reader = Reader::from_str(src);
        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) if is_svg(&start) => {
                    let view_box = view_box_attr(&reader, &start);
                    let tag_end = offset(&reader, src);
                    let inner_end = match reader.read_to_end(start.name()) {
                        Ok(span) => usize::try_from(span.end).unwrap_or(src.len()),
                        Err(err) => {
                            // Truncated or mismatched output keeps everything after the tag.
                            tracing::debug!(target: "model.surface", %err, "svg_root_unclosed");
                            src.len()
                        }
                    };
                    return Some(Self {
                        view_box,
                        inner: tag_end..inner_end.clamp(tag_end, src.len()),
                    });
                }
                Ok(Event::Empty(start)) if is_svg(&start) => {
                    let tag_end = offset(&reader, src);
                    return Some(Self {
                        view_box: view_box_attr(&reader, &start),
                        inner: tag_end..tag_end,
                    });
                }
                Ok(Event::Eof) => return None,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(target: "model.surface", %err, "svg_parse_failed");
                    return None;
                }
            }
        }
    }
}

fn is_svg(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == b"svg"
}

fn offset(reader: &Reader<&[u8]>, src: &str) -> usize {
    usize::try_from(reader.buffer_position()).map_or(src.len(), |pos| pos.min(src.len()))
}

fn view_box_attr(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Option<ViewBox> {
    let attr = start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"viewBox")?;
    let value = reader.decoder().decode(&attr.value).ok()?;
    ViewBox::parse(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_view_box_and_inner_markup() {
        let svg = r#"<?xml version="1.0"?>
<svg class="typst-doc" viewBox="0 0 595.28 1684" xmlns="http://www.w3.org/2000/svg"><g id="a"/><path d="M0 0"/></svg>"#;
        let surface = VectorSurface::from_svg(svg);
        assert_eq!(
            surface.view_box(),
            Some(ViewBox::new(0.0, 0.0, 595.28, 1684.0))
        );
        assert_eq!(&**surface.content(), r#"<g id="a"/><path d="M0 0"/>"#);
        assert_eq!(&**surface.source(), svg);
    }

    #[test]
    fn comma_separated_view_box() {
        assert_eq!(
            ViewBox::parse("1, -2,300 400"),
            Some(ViewBox::new(1.0, -2.0, 300.0, 400.0))
        );
        assert_eq!(ViewBox::parse("0 0 10"), None);
        assert_eq!(ViewBox::parse("0 0 10 20 30"), None);
        assert_eq!(ViewBox::parse("0 0 -1 20"), None);
        assert_eq!(ViewBox::parse("0 0 NaN 20"), None);
    }

    #[test]
    fn missing_view_box_keeps_markup() {
        let surface = VectorSurface::from_svg(r#"<svg width="10"><rect/></svg>"#);
        assert_eq!(surface.view_box(), None);
        assert_eq!(&**surface.content(), "<rect/>");
    }

    #[test]
    fn non_svg_output_is_passed_through() {
        let surface = VectorSurface::from_svg("<svgfoo>not a root</svgfoo>");
        assert_eq!(surface.view_box(), None);
        assert_eq!(&**surface.content(), "<svgfoo>not a root</svgfoo>");
    }

    #[test]
    fn quoted_gt_inside_start_tag() {
        let surface =
            VectorSurface::from_svg(r#"<svg data-x="a>b" viewBox='0 0 5 6'><g/></svg>"#);
        assert_eq!(surface.view_box(), Some(ViewBox::new(0.0, 0.0, 5.0, 6.0)));
        assert_eq!(&**surface.content(), "<g/>");
    }

    #[test]
    fn comment_and_doctype_before_root_are_skipped() {
        let svg = r#"<?xml version="1.0"?><!DOCTYPE svg><!-- <svg viewBox="0 0 10 10"> --><svg viewBox="0 0 600 2000"><g/></svg>"#;
        let surface = VectorSurface::from_svg(svg);
        assert_eq!(
            surface.view_box(),
            Some(ViewBox::new(0.0, 0.0, 600.0, 2000.0))
        );
        assert_eq!(&**surface.content(), "<g/>");
    }

    #[test]
    fn nested_svg_stays_in_root_content() {
        let surface = VectorSurface::from_svg(
            r#"<svg viewBox="0 0 100 300"><svg viewBox="0 0 1 1"><g/></svg><path/></svg>"#,
        );
        assert_eq!(surface.height(), Some(300.0));
        assert_eq!(
            &**surface.content(),
            r#"<svg viewBox="0 0 1 1"><g/></svg><path/>"#
        );
    }

    #[test]
    fn self_closing_root_has_empty_content() {
        let surface = VectorSurface::from_svg(r#"<svg viewBox="0 0 4 8"/>"#);
        assert_eq!(surface.height(), Some(8.0));
        assert_eq!(&**surface.content(), "");
    }

    #[test]
    fn unclosed_root_keeps_trailing_markup() {
        let surface = VectorSurface::from_svg(r#"<svg viewBox="0 0 4 8"><g/><rect/>"#);
        assert_eq!(surface.height(), Some(8.0));
        assert_eq!(&**surface.content(), "<g/><rect/>");
    }

    #[test]
    fn from_parts_round_trips_through_parser() {
        let surface = VectorSurface::from_parts(ViewBox::new(0.0, 10.0, 100.0, 200.0), "<g/>");
        let reparsed = VectorSurface::from_svg(surface.source().clone());
        assert_eq!(reparsed.view_box(), surface.view_box());
        assert_eq!(reparsed.content(), surface.content());
    }
}
