//! Page layout: turn positioned glyphs, tables and images into Markdown.
//!
//! Coordinates here are top-down page points: `top < bottom`, origin at the
//! top-left corner of the page. [`super::pdfium`] converts from PDF's
//! bottom-up space before anything reaches this module.
//!
//! Reading order is plain top-to-bottom. Multi-column layouts come out with
//! their columns interleaved line by line.

use super::table::{self, Table};
use crate::config::TableStrategy;
use once_cell::sync::Lazy;
use regex::Regex;

/// Axis-aligned box in top-down page points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BBox {
    /// Build a box from two corners in any order.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    pub fn expand(&self, by: f32) -> Self {
        Self {
            x0: self.x0 - by,
            top: self.top - by,
            x1: self.x1 + by,
            bottom: self.bottom + by,
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.top <= other.bottom && other.top <= self.bottom
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One character with its position and font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BBox,
    pub size: f32,
}

impl Glyph {
    pub fn new(ch: char, bbox: BBox, size: f32) -> Self {
        Self { ch, bbox, size }
    }
}

/// A line of text assembled from glyphs sharing a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub bbox: BBox,
    /// Largest font size on the line.
    pub size: f32,
}

/// An image already written to disk, placed where it appeared on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub bbox: BBox,
    /// Markdown image link, e.g. `![](doc.pdf-0-0.png)`.
    pub link: String,
}

/// Everything the layout stage needs from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub glyphs: Vec<Glyph>,
    /// Bounding boxes of vector path objects (rules, boxes, fills).
    pub paths: Vec<BBox>,
    pub images: Vec<PlacedImage>,
}

// ── Lines ────────────────────────────────────────────────────────────────────

/// Group glyphs into lines, top to bottom, each read left to right.
///
/// A gap wider than a quarter of the font size between two glyphs is read as
/// a word break even when the PDF has no explicit space character.
pub fn group_lines(glyphs: &[Glyph]) -> Vec<Line> {
    let mut sorted: Vec<&Glyph> = glyphs.iter().filter(|g| !g.ch.is_control()).collect();
    sorted.sort_by(|a, b| a.bbox.center().1.total_cmp(&b.bbox.center().1));

    let mut rows: Vec<Vec<&Glyph>> = Vec::new();
    for glyph in sorted {
        match rows.last_mut() {
            Some(row) if on_same_row(row, glyph) => row.push(glyph),
            _ => rows.push(vec![glyph]),
        }
    }

    let mut lines: Vec<Line> = rows.into_iter().filter_map(build_line).collect();
    lines.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));
    lines
}

fn on_same_row(row: &[&Glyph], glyph: &Glyph) -> bool {
    let anchor = row[0];
    let tolerance = (anchor.bbox.height() * 0.5).max(2.0);
    (glyph.bbox.center().1 - anchor.bbox.center().1).abs() <= tolerance
}

fn build_line(mut row: Vec<&Glyph>) -> Option<Line> {
    row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    let mut text = String::new();
    let mut bbox: Option<BBox> = None;
    let mut size = 0.0f32;
    let mut pending_space = false;
    let mut prev_right: Option<f32> = None;

    for glyph in row {
        if glyph.ch.is_whitespace() {
            pending_space = !text.is_empty();
            continue;
        }
        let gap_break = prev_right
            .map(|right| glyph.bbox.x0 - right > 0.25 * glyph.size.max(1.0))
            .unwrap_or(false);
        if (pending_space || gap_break) && !text.is_empty() {
            text.push(' ');
        }
        text.push(glyph.ch);
        pending_space = false;
        prev_right = Some(glyph.bbox.x1);
        size = size.max(glyph.size);
        bbox = Some(match bbox {
            Some(b) => b.union(&glyph.bbox),
            None => glyph.bbox,
        });
    }

    bbox.map(|bbox| Line { text, bbox, size })
}

// ── Headings ─────────────────────────────────────────────────────────────────

/// Font-size percentiles of a whole document, used to spot headings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingScale {
    p50: f32,
    p80: f32,
    p92: f32,
}

impl HeadingScale {
    pub fn from_sizes(sizes: impl IntoIterator<Item = f32>) -> Self {
        let mut sizes: Vec<f32> = sizes.into_iter().filter(|s| *s > 0.0).collect();
        sizes.sort_by(f32::total_cmp);
        let q = |p: f32| -> f32 {
            if sizes.is_empty() {
                0.0
            } else {
                sizes[((sizes.len() - 1) as f32 * p).floor() as usize]
            }
        };
        Self {
            p50: q(0.5),
            p80: q(0.8),
            p92: q(0.92),
        }
    }

    /// Heading level for text of `size`, or `None` for body text.
    ///
    /// Only sizes strictly above a lower percentile qualify, so a document set
    /// in a single size has no headings at all.
    pub fn level(&self, size: f32) -> Option<u8> {
        if size >= self.p92 && size > self.p80 {
            Some(2)
        } else if size >= self.p80 && size > self.p50 {
            Some(3)
        } else {
            None
        }
    }
}

// ── Blocks ───────────────────────────────────────────────────────────────────

/// A rendered piece of a page with its vertical position.
#[derive(Debug, Clone, PartialEq)]
struct Block {
    top: f32,
    markdown: String,
}

static RE_PAGE_FOOTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^--\s*\d+\s*of\s*\d+\s*--$").unwrap());

/// Running page footers such as `-- 3 of 12 --`.
fn is_noise(text: &str) -> bool {
    RE_PAGE_FOOTER.is_match(text.trim())
}

fn text_blocks(lines: &[Line], scale: &HeadingScale) -> Vec<Block> {
    struct Paragraph {
        top: f32,
        bottom: f32,
        line_height: f32,
        lines: Vec<String>,
    }

    fn flush(paragraph: &mut Option<Paragraph>, blocks: &mut Vec<Block>) {
        if let Some(p) = paragraph.take() {
            blocks.push(Block {
                top: p.top,
                markdown: p.lines.join("\n"),
            });
        }
    }

    let mut blocks = Vec::new();
    let mut current: Option<Paragraph> = None;

    for line in lines {
        let text = line.text.trim();
        if text.is_empty() || is_noise(text) {
            continue;
        }

        if let Some(level) = scale.level(line.size) {
            flush(&mut current, &mut blocks);
            blocks.push(Block {
                top: line.bbox.top,
                markdown: format!("{} {}", "#".repeat(level as usize), text),
            });
            continue;
        }

        match current.as_mut() {
            Some(p) if line.bbox.top - p.bottom <= p.line_height * 0.8 => {
                p.lines.push(text.to_string());
                p.bottom = line.bbox.bottom;
                p.line_height = line.bbox.height();
            }
            _ => {
                flush(&mut current, &mut blocks);
                current = Some(Paragraph {
                    top: line.bbox.top,
                    bottom: line.bbox.bottom,
                    line_height: line.bbox.height(),
                    lines: vec![text.to_string()],
                });
            }
        }
    }
    flush(&mut current, &mut blocks);
    blocks
}

// ── Pages ────────────────────────────────────────────────────────────────────

/// Render one page: tables found per `strategy`, remaining text as headings
/// and paragraphs, images as links, all in vertical order.
pub fn render_page(page: &PageContent, scale: &HeadingScale, strategy: TableStrategy) -> String {
    let edges = table::edges_from_paths(&page.paths);
    let tables: Vec<Table> = table::find_tables(&edges, strategy, &page.glyphs);

    let free: Vec<Glyph> = page
        .glyphs
        .iter()
        .filter(|g| {
            let center = g.bbox.center();
            !tables.iter().any(|t| t.bbox.expand(1.0).contains(center))
        })
        .copied()
        .collect();

    let lines = group_lines(&free);
    let mut blocks = text_blocks(&lines, scale);
    blocks.extend(tables.iter().map(|t| Block {
        top: t.bbox.top,
        markdown: t.to_markdown(),
    }));
    blocks.extend(page.images.iter().map(|img| Block {
        top: img.bbox.top,
        markdown: img.link.clone(),
    }));
    blocks.sort_by(|a, b| a.top.total_cmp(&b.top));

    blocks
        .into_iter()
        .map(|b| b.markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Render every page and join them into one document.
///
/// Heading sizes are judged against the whole document, not page by page, so
/// a page of large print does not turn into a page of headings.
pub fn render_document(pages: &[PageContent], strategy: TableStrategy) -> String {
    let scale = HeadingScale::from_sizes(
        pages
            .iter()
            .flat_map(|p| p.glyphs.iter())
            .filter(|g| !g.ch.is_whitespace())
            .map(|g| g.size),
    );

    let rendered: Vec<String> = pages
        .iter()
        .map(|p| render_page(p, &scale, strategy))
        .filter(|md| !md.trim().is_empty())
        .collect();

    if rendered.is_empty() {
        return String::new();
    }
    let joined = format!("{}\n", rendered.join("\n\n"));
    RE_BLANK_LINES.replace_all(&joined, "\n\n").into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Lay `text` out left to right from `(x, top)`, one glyph per char.
    pub(crate) fn word(text: &str, x: f32, top: f32, size: f32) -> Vec<Glyph> {
        let advance = size * 0.5;
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x0 = x + i as f32 * advance;
                Glyph::new(ch, BBox::new(x0, top, x0 + advance, top + size), size)
            })
            .collect()
    }

    #[test]
    fn bbox_new_normalises_corners() {
        let b = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(b, BBox { x0: 0.0, top: 5.0, x1: 10.0, bottom: 20.0 });
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 15.0);
    }

    #[test]
    fn group_lines_orders_top_to_bottom() {
        let mut glyphs = word("second", 10.0, 40.0, 10.0);
        glyphs.extend(word("first", 10.0, 10.0, 10.0));
        let lines = group_lines(&glyphs);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn group_lines_inserts_space_on_gap() {
        let mut glyphs = word("Hello", 10.0, 10.0, 10.0);
        glyphs.extend(word("world", 45.0, 10.0, 10.0));
        let lines = group_lines(&glyphs);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn group_lines_uses_explicit_spaces_once() {
        let glyphs = word("a  b", 0.0, 0.0, 10.0);
        let lines = group_lines(&glyphs);
        assert_eq!(lines[0].text, "a b");
    }

    #[test]
    fn heading_scale_single_size_has_no_headings() {
        let scale = HeadingScale::from_sizes(vec![10.0; 50]);
        assert_eq!(scale.level(10.0), None);
    }

    #[test]
    fn heading_scale_levels() {
        let mut sizes = vec![10.0; 70];
        sizes.extend(vec![14.0; 15]);
        sizes.extend(vec![20.0; 15]);
        let scale = HeadingScale::from_sizes(sizes);
        assert_eq!(scale.level(20.0), Some(2));
        assert_eq!(scale.level(14.0), Some(3));
        assert_eq!(scale.level(10.0), None);
    }

    #[test]
    fn page_footer_is_noise() {
        assert!(is_noise("-- 3 of 12 --"));
        assert!(is_noise("--1 OF 2--"));
        assert!(!is_noise("3 of 12"));
    }

    #[test]
    fn paragraphs_split_on_vertical_gap() {
        let mut glyphs = word("one", 10.0, 10.0, 10.0);
        glyphs.extend(word("two", 10.0, 22.0, 10.0));
        glyphs.extend(word("three", 10.0, 60.0, 10.0));
        let page = PageContent {
            glyphs,
            ..Default::default()
        };
        let scale = HeadingScale::from_sizes(vec![10.0]);
        let md = render_page(&page, &scale, TableStrategy::None);
        assert_eq!(md, "one\ntwo\n\nthree");
    }

    #[test]
    fn image_placed_between_paragraphs() {
        let mut glyphs = word("above", 10.0, 10.0, 10.0);
        glyphs.extend(word("below", 10.0, 200.0, 10.0));
        let page = PageContent {
            glyphs,
            paths: vec![],
            images: vec![PlacedImage {
                bbox: BBox::new(10.0, 50.0, 200.0, 150.0),
                link: "![](doc.pdf-0-0.png)".into(),
            }],
        };
        let scale = HeadingScale::from_sizes(vec![10.0]);
        let md = render_page(&page, &scale, TableStrategy::LinesStrict);
        assert_eq!(md, "above\n\n![](doc.pdf-0-0.png)\n\nbelow");
    }

    #[test]
    fn heading_rendered_with_hashes() {
        let mut glyphs = word("Title", 10.0, 10.0, 24.0);
        for i in 0..20 {
            glyphs.extend(word("body text", 10.0, 60.0 + i as f32 * 40.0, 10.0));
        }
        let md = render_document(
            &[PageContent {
                glyphs,
                ..Default::default()
            }],
            TableStrategy::None,
        );
        assert!(md.starts_with("## Title\n\n"), "got: {md}");
    }

    #[test]
    fn empty_document_renders_empty() {
        assert_eq!(render_document(&[], TableStrategy::LinesStrict), "");
        assert_eq!(
            render_document(&[PageContent::default()], TableStrategy::LinesStrict),
            ""
        );
    }

    #[test]
    fn document_joins_pages_and_ends_with_newline() {
        let p1 = PageContent {
            glyphs: word("page one", 10.0, 10.0, 10.0),
            ..Default::default()
        };
        let p2 = PageContent {
            glyphs: word("page two", 10.0, 10.0, 10.0),
            ..Default::default()
        };
        let md = render_document(&[p1, p2], TableStrategy::None);
        assert_eq!(md, "page one\n\npage two\n");
    }
}
