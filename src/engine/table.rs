//! Ruled-table detection from vector path geometry.
//!
//! Pipeline: path boxes → edges → select by [`TableStrategy`] → cluster
//! touching edges → snap edge positions into a grid → fill cells with text.
//!
//! Only the bounding box of each path object is known, so a path counts as a
//! ruling line when its box is hairline-thin in one direction. A grid drawn as
//! a single path object shows up as one rectangle and is only picked up (as
//! its outer border) under [`TableStrategy::Lines`].

use super::layout::{self, BBox, Glyph};
use crate::config::TableStrategy;
use std::collections::HashMap;

/// Maximum thickness of a path box that still reads as a line.
const MAX_RULE_THICKNESS: f32 = 2.0;
/// Shorter edges are ignored.
const MIN_EDGE_LENGTH: f32 = 3.0;
/// Edge positions closer than this are treated as the same grid line.
const SNAP_TOLERANCE: f32 = 3.0;
/// Bucket side used when clustering edges.
const CLUSTER_CELL: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Where an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSource {
    /// A stroked or hairline-filled line segment.
    Line,
    /// One side of a rectangle.
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub bbox: BBox,
    pub orientation: Orientation,
    pub source: EdgeSource,
}

impl Edge {
    fn horizontal(x0: f32, x1: f32, y: f32, source: EdgeSource) -> Self {
        Self {
            bbox: BBox::new(x0, y, x1, y),
            orientation: Orientation::Horizontal,
            source,
        }
    }

    fn vertical(x: f32, top: f32, bottom: f32, source: EdgeSource) -> Self {
        Self {
            bbox: BBox::new(x, top, x, bottom),
            orientation: Orientation::Vertical,
            source,
        }
    }

    /// The coordinate that identifies the grid line: `y` for horizontal edges,
    /// `x` for vertical ones.
    fn position(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.bbox.top,
            Orientation::Vertical => self.bbox.x0,
        }
    }
}

/// A detected table; `rows[0]` is rendered as the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub bbox: BBox,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Render as a GitHub-flavoured Markdown table.
    ///
    /// Multi-line cell text is joined with `<br>`; `|` is escaped.
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.replace('|', "\\|").replace('\n', "<br>"))
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
            if i == 0 {
                let sep: Vec<&str> = cells.iter().map(|_| "---").collect();
                lines.push(format!("| {} |", sep.join(" | ")));
            }
        }
        lines.join("\n")
    }
}

/// Derive edges from path bounding boxes.
pub fn edges_from_paths(paths: &[BBox]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for b in paths {
        let (w, h) = (b.width(), b.height());
        let (cx, cy) = b.center();
        if h <= MAX_RULE_THICKNESS && w >= MIN_EDGE_LENGTH {
            edges.push(Edge::horizontal(b.x0, b.x1, cy, EdgeSource::Line));
        } else if w <= MAX_RULE_THICKNESS && h >= MIN_EDGE_LENGTH {
            edges.push(Edge::vertical(cx, b.top, b.bottom, EdgeSource::Line));
        } else if w >= MIN_EDGE_LENGTH && h >= MIN_EDGE_LENGTH {
            edges.push(Edge::horizontal(b.x0, b.x1, b.top, EdgeSource::Rect));
            edges.push(Edge::horizontal(b.x0, b.x1, b.bottom, EdgeSource::Rect));
            edges.push(Edge::vertical(b.x0, b.top, b.bottom, EdgeSource::Rect));
            edges.push(Edge::vertical(b.x1, b.top, b.bottom, EdgeSource::Rect));
        }
    }
    edges
}

fn select_edges(edges: &[Edge], strategy: TableStrategy) -> Vec<Edge> {
    match strategy {
        TableStrategy::LinesStrict => edges
            .iter()
            .filter(|e| e.source == EdgeSource::Line)
            .copied()
            .collect(),
        TableStrategy::Lines => edges.to_vec(),
        TableStrategy::None => Vec::new(),
    }
}

/// Find ruled tables among `edges` and fill their cells from `glyphs`.
///
/// A cluster of touching edges becomes a table when it spans at least two
/// grid lines in each direction and encloses at least two cells; a lone box
/// around a paragraph is not a table.
pub fn find_tables(edges: &[Edge], strategy: TableStrategy, glyphs: &[Glyph]) -> Vec<Table> {
    let edges = select_edges(edges, strategy);
    if edges.is_empty() {
        return Vec::new();
    }

    let mut tables: Vec<Table> = cluster_edges(&edges)
        .into_iter()
        .filter_map(|cluster| grid_table(&cluster, glyphs))
        .collect();
    tables.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));
    tables
}

/// Union-find over edges whose boxes touch within the snap tolerance.
///
/// Edges are hashed into square buckets by the area their grown box covers, so
/// each edge is only compared with edges sharing a bucket.
fn cluster_edges(edges: &[Edge]) -> Vec<Vec<Edge>> {
    let mut parent: Vec<usize> = (0..edges.len()).collect();

    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut buckets: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        let grown = edge.bbox.expand(SNAP_TOLERANCE);
        for cell in cells_covering(&grown) {
            let bucket = buckets.entry(cell).or_default();
            for &j in bucket.iter() {
                if grown.intersects(&edges[j].bbox) {
                    let (a, b) = (root(&mut parent, j), root(&mut parent, i));
                    if a != b {
                        parent[b] = a;
                    }
                }
            }
            bucket.push(i);
        }
    }

    let mut index: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<Edge>> = Vec::new();
    for (i, edge) in edges.iter().enumerate() {
        let r = root(&mut parent, i);
        let g = *index.entry(r).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(*edge);
    }
    groups
}

/// Bucket coordinates of every cell `bbox` overlaps.
fn cells_covering(bbox: &BBox) -> impl Iterator<Item = (i32, i32)> {
    let cell = |v: f32| (v / CLUSTER_CELL).floor() as i32;
    let (cx0, cx1) = (cell(bbox.x0), cell(bbox.x1));
    let (cy0, cy1) = (cell(bbox.top), cell(bbox.bottom));
    (cx0..=cx1).flat_map(move |cx| (cy0..=cy1).map(move |cy| (cx, cy)))
}

/// Sort positions and merge those within [`SNAP_TOLERANCE`] of each other.
fn snap_positions(mut positions: Vec<f32>) -> Vec<f32> {
    positions.sort_by(f32::total_cmp);
    let mut snapped: Vec<(f32, usize)> = Vec::new();
    for p in positions {
        match snapped.last_mut() {
            Some((mean, n)) if p - *mean <= SNAP_TOLERANCE => {
                *mean = (*mean * *n as f32 + p) / (*n as f32 + 1.0);
                *n += 1;
            }
            _ => snapped.push((p, 1)),
        }
    }
    snapped.into_iter().map(|(mean, _)| mean).collect()
}

fn grid_table(cluster: &[Edge], glyphs: &[Glyph]) -> Option<Table> {
    let positions = |o: Orientation| {
        snap_positions(
            cluster
                .iter()
                .filter(|e| e.orientation == o)
                .map(Edge::position)
                .collect(),
        )
    };
    let xs = positions(Orientation::Vertical);
    let ys = positions(Orientation::Horizontal);

    if xs.len() < 2 || ys.len() < 2 || (xs.len() - 1) * (ys.len() - 1) < 2 {
        return None;
    }

    let bbox = BBox::new(xs[0], ys[0], xs[xs.len() - 1], ys[ys.len() - 1]);
    let rows = ys
        .windows(2)
        .map(|band| {
            xs.windows(2)
                .map(|col| cell_text(BBox::new(col[0], band[0], col[1], band[1]), glyphs))
                .collect()
        })
        .collect();

    Some(Table { bbox, rows })
}

fn cell_text(cell: BBox, glyphs: &[Glyph]) -> String {
    let inside: Vec<Glyph> = glyphs
        .iter()
        .filter(|g| cell.contains(g.bbox.center()))
        .copied()
        .collect();
    layout::group_lines(&inside)
        .into_iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n")
}
