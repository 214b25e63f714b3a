//! Table conversion.
//!
//! When every cell declares an absolute width, the table is analysed up
//! front to find the column boundaries.  Cells then get column spans from
//! those boundaries.  Otherwise the table is converted without column
//! geometry.

use markup5ever_rcdom::Handle;
use std::rc::Rc;

use crate::builder::{Builder, Step, Work};
use crate::css::{self, parser::LengthUnit};
use crate::flow::{FlowKind, NodeId};
use crate::properties::{format_number, resolve, PropertySet};
use crate::schema::{attribute, children, element_name, SourceElement};

const EPSILON: f64 = 1e-6;

const CELL_BORDER_THICKNESS: &str = "1,1,1,1";
const CELL_BORDER_BRUSH: &str = "Black";

fn is_group(tag: &str) -> bool {
    matches!(tag, "tbody" | "thead" | "tfoot")
}

fn is_cell(tag: &str) -> bool {
    matches!(tag, "td" | "th")
}

/// The declared width of a cell or column in pixels.  Only points, pixels
/// and bare numbers are understood; anything else, or zero, is unknown.
pub(crate) fn cell_width(handle: &Handle) -> Option<f64> {
    let text = match attribute(handle, "width") {
        Some(width) => width,
        None => attribute(handle, "style").and_then(|style| css::declared(&style, "width"))?,
    };
    let len = css::parser::length(&text.to_ascii_lowercase())?;
    let px = match len.unit {
        None | Some(LengthUnit::Px) => len.value,
        Some(LengthUnit::Pt) => len.value * 96.0 / 72.0,
        Some(_) => return None,
    };
    (px > 0.0 && px.is_finite()).then_some(f64::from(px))
}

/// The declared row span of a cell, at least 1.
fn row_span(handle: &Handle) -> usize {
    attribute(handle, "rowspan")
        .and_then(|span| span.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Remaining row spans per column.
///
/// Each counter holds the number of rows below the current one still
/// covered by a cell which spans down into that column.
#[derive(Debug, Default)]
struct RowSpans {
    remaining: Vec<usize>,
    occupied: Vec<bool>,
}

impl RowSpans {
    fn with_columns(count: usize) -> RowSpans {
        RowSpans {
            remaining: vec![0; count],
            occupied: vec![false; count],
        }
    }

    fn clear(&mut self) {
        self.remaining.iter_mut().for_each(|r| *r = 0);
    }

    /// Move to the next row: columns still spanned become occupied in it.
    fn start_row(&mut self) {
        self.occupied = self.remaining.iter().map(|&r| r > 0).collect();
        for r in &mut self.remaining {
            *r = r.saturating_sub(1);
        }
    }

    fn is_occupied(&self, column: usize) -> bool {
        self.occupied.get(column).copied().unwrap_or(false)
    }

    fn insert(&mut self, column: usize, remaining: usize, occupied: bool) {
        self.remaining.insert(column, remaining);
        self.occupied.insert(column, occupied);
    }

    fn cover(&mut self, columns: std::ops::Range<usize>, rows: usize) {
        for column in columns {
            if let Some(r) = self.remaining.get_mut(column) {
                *r = rows - 1;
            }
        }
    }
}

/// Column boundaries found so far.
#[derive(Debug, Default)]
struct ColumnGrid {
    starts: Vec<f64>,
    spans: RowSpans,
}

impl ColumnGrid {
    fn len(&self) -> usize {
        self.starts.len()
    }

    /// Skip occupied columns from `column`, returning the first free one
    /// and where it starts.
    fn skip_occupied(&self, mut column: usize, mut start: f64, table_width: f64) -> (usize, f64) {
        while column < self.len() && self.spans.is_occupied(column) {
            column += 1;
            start = self.starts.get(column).copied().unwrap_or(table_width);
        }
        (column, start)
    }

    fn analyze_row(&mut self, row: &Handle, table_width: f64) -> Option<f64> {
        self.spans.start_row();
        let (mut column, mut start) = self.skip_occupied(0, 0.0, table_width);

        for cell in children(row) {
            match element_name(&cell) {
                Some(tag) if is_cell(&tag) => (),
                _ => continue,
            }

            if column == self.len() {
                self.starts.push(start);
                self.spans.insert(column, 0, false);
            } else if start < self.starts[column] - EPSILON {
                // Split the column this cell starts inside.
                let (remaining, occupied) = match column.checked_sub(1) {
                    Some(prev) => (self.spans.remaining[prev], self.spans.is_occupied(prev)),
                    None => (0, false),
                };
                self.starts.insert(column, start);
                self.spans.insert(column, remaining, occupied);
            }
            if self.spans.is_occupied(column) {
                html_trace!("analyze_row: cell overlaps a row span");
                return None;
            }

            let width = cell_width(&cell)?;
            let next = next_column_index(&self.starts, &self.spans, column, width)?;
            self.spans.cover(column..next, row_span(&cell));
            column = next;
            start += width;

            if column < self.len() && (self.starts[column] - start).abs() < EPSILON {
                (column, start) = self.skip_occupied(column, start, table_width.max(start));
            }
        }
        Some(start)
    }

    fn analyze_group(&mut self, group: &Handle, table_width: f64) -> Option<f64> {
        self.spans.clear();
        let mut width: f64 = 0.0;
        for child in children(group) {
            match element_name(&child).as_deref() {
                Some("tr") => {
                    let row_width = self.analyze_row(&child, table_width.max(width))?;
                    width = width.max(row_width);
                }
                Some(tag) if is_cell(tag) => return None,
                _ => (),
            }
        }
        self.spans.clear();
        Some(width)
    }
}

/// The index of the first column starting at or after the end of a cell
/// placed at `column`.  Fails if the cell would cover an occupied column.
fn next_column_index(starts: &[f64], spans: &RowSpans, column: usize, width: f64) -> Option<usize> {
    let end = starts[column] + width;
    let mut next = column + 1;
    while next < starts.len() && starts[next] < end - EPSILON {
        if spans.is_occupied(next) {
            return None;
        }
        next += 1;
    }
    Some(next)
}

/// Find the column boundaries of `table`.  The result ends with the total
/// width, so it has one more entry than there are columns.  `None` if any
/// cell has no usable width, or the rows don't line up.
pub(crate) fn analyze_table(table: &Handle) -> Option<Vec<f64>> {
    let mut grid = ColumnGrid::default();
    let mut table_width: f64 = 0.0;

    for child in children(table) {
        let width = match element_name(&child).as_deref() {
            Some(tag) if is_group(tag) => grid.analyze_group(&child, table_width)?,
            Some("tr") => grid.analyze_row(&child, table_width)?,
            Some(tag) if is_cell(tag) => return None,
            _ => continue,
        };
        table_width = table_width.max(width);
    }

    if table_width <= 0.0 {
        return None;
    }
    let mut starts = grid.starts;
    starts.push(table_width);
    if starts.first().is_some_and(|s| *s < 0.0) || starts.windows(2).any(|w| w[0] >= w[1]) {
        html_trace!("analyze_table: column starts out of order {:?}", starts);
        return None;
    }
    Some(starts)
}

/// The number of grid columns from `column` needed to cover `width`.
pub(crate) fn calculate_column_span(column: usize, width: f64, starts: &[f64]) -> usize {
    let mut covered = 0.0;
    let mut span = 0;
    let mut index = column;
    while covered < width - EPSILON && index + 1 < starts.len() {
        covered += starts[index + 1] - starts[index];
        index += 1;
        span += 1;
    }
    span.max(1)
}

/// The only cell of `table`, if it has exactly one.
fn single_cell(table: &Handle) -> Option<Handle> {
    fn collect_cells(row: &Handle, cells: &mut Vec<Handle>) {
        cells.extend(
            children(row)
                .into_iter()
                .filter(|c| element_name(c).is_some_and(|t| is_cell(&t))),
        );
    }

    let mut cells = Vec::new();
    for child in children(table) {
        match element_name(&child).as_deref() {
            Some(tag) if is_group(tag) => {
                for row in children(&child) {
                    if element_name(&row).as_deref() == Some("tr") {
                        collect_cells(&row, &mut cells);
                    }
                }
            }
            Some("tr") => collect_cells(&child, &mut cells),
            _ => (),
        }
        if cells.len() > 1 {
            return None;
        }
    }
    cells.pop()
}

/// Where each row of a table is being placed.
struct Placement<'a> {
    starts: Option<&'a [f64]>,
    spans: RowSpans,
}

impl<'c> Builder<'c> {
    /// Build the table structure now.  The content of each cell is returned
    /// as work for the walk.
    pub(crate) fn add_table(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let (_local, current) = resolve(&element, inherited);
        let current = Rc::new(current);

        if let Some(cell) = single_cell(&element.handle) {
            html_trace!("add_table: single cell table");
            let content = Work::Blocks {
                parent,
                source: cell,
                inherited: current,
            };
            return self.pending(Some(&element.handle), vec![content], |_| ());
        }

        let table = self.tree.create(FlowKind::Table);
        let starts = analyze_table(&element.handle);
        match starts {
            Some(ref starts) => self.add_geometry_columns(table, starts),
            None => self.add_declared_columns(table, &element.handle),
        }

        let mut placement = Placement {
            spans: RowSpans::with_columns(starts.as_ref().map_or(0, Vec::len)),
            starts: starts.as_deref(),
        };
        let mut contents = Vec::new();

        let siblings = children(&element.handle);
        let mut index = 0;
        while index < siblings.len() {
            let child = &siblings[index];
            match SourceElement::from_handle(child) {
                Some(group) if is_group(&group.name) => {
                    let (_local, group_current) = resolve(&group, &current);
                    let group_node = self.tree.create(FlowKind::TableRowGroup);
                    placement.spans.clear();
                    self.add_table_rows(
                        group_node,
                        &children(child),
                        0,
                        &group_current,
                        &mut placement,
                        &mut contents,
                    );
                    if self.tree.has_children(group_node) {
                        self.tree.append(table, group_node);
                    }
                }
                Some(row) if row.name == "tr" || is_cell(&row.name) => {
                    // Rows without a group get one of their own.
                    let group_node = self.tree.create(FlowKind::TableRowGroup);
                    placement.spans.clear();
                    index = self.add_table_rows(
                        group_node,
                        &siblings,
                        index,
                        &current,
                        &mut placement,
                        &mut contents,
                    );
                    if self.tree.has_children(group_node) {
                        self.tree.append(table, group_node);
                    }
                }
                _ => (),
            }
            index += 1;
        }

        let has_rows = self
            .tree
            .children(table)
            .iter()
            .any(|&c| self.tree.kind(c) == FlowKind::TableRowGroup);
        if has_rows {
            self.tree.append(parent, table);
        }
        self.pending(Some(&element.handle), contents, |_| ())
    }

    fn add_geometry_columns(&mut self, table: NodeId, starts: &[f64]) {
        for pair in starts.windows(2) {
            let column = self.tree.create(FlowKind::TableColumn);
            self.tree
                .set_attribute(column, "Width", format_number((pair[1] - pair[0]) as f32));
            self.tree.append(table, column);
        }
    }

    /// Columns from `colgroup` and `col` elements which come before the
    /// rows.
    fn add_declared_columns(&mut self, table: NodeId, handle: &Handle) {
        let add_column = |builder: &mut Self, col: &Handle| {
            let column = builder.tree.create(FlowKind::TableColumn);
            if let Some(width) = cell_width(col) {
                builder
                    .tree
                    .set_attribute(column, "Width", format_number(width as f32));
            }
            builder.tree.append(table, column);
        };

        for child in children(handle) {
            match element_name(&child).as_deref() {
                Some("colgroup") => {
                    for col in children(&child) {
                        if element_name(&col).as_deref() == Some("col") {
                            add_column(self, &col);
                        }
                    }
                }
                Some("col") => add_column(self, &child),
                Some("caption") | None => (),
                Some(_) => break,
            }
        }
    }

    /// Add rows from `siblings`, starting at `start`, to a row group.  Stops
    /// before the next row group element, and returns the index of the last
    /// sibling consumed.
    fn add_table_rows(
        &mut self,
        group: NodeId,
        siblings: &[Handle],
        start: usize,
        inherited: &PropertySet,
        placement: &mut Placement,
        contents: &mut Vec<Work>,
    ) -> usize {
        let mut index = start;
        let mut last = start;
        while index < siblings.len() {
            let handle = &siblings[index];
            match SourceElement::from_handle(handle) {
                Some(element) if is_group(&element.name) => break,
                Some(element) if element.name == "tr" => {
                    let (_local, current) = resolve(&element, inherited);
                    let row = self.tree.create(FlowKind::TableRow);
                    self.add_table_cells(row, &children(handle), 0, &current, placement, contents);
                    if self.tree.has_children(row) {
                        self.tree.append(group, row);
                    }
                }
                Some(element) if is_cell(&element.name) => {
                    let row = self.tree.create(FlowKind::TableRow);
                    index = self.add_table_cells(row, siblings, index, inherited, placement, contents);
                    if self.tree.has_children(row) {
                        self.tree.append(group, row);
                    }
                }
                _ => (),
            }
            last = index;
            index += 1;
        }
        last
    }

    /// Add cells from `siblings`, starting at `start`, to `row`.  Stops before
    /// the next row or row group, and returns the index of the last sibling
    /// consumed.
    fn add_table_cells(
        &mut self,
        row: NodeId,
        siblings: &[Handle],
        start: usize,
        inherited: &PropertySet,
        placement: &mut Placement,
        contents: &mut Vec<Work>,
    ) -> usize {
        placement.spans.start_row();
        let mut column = 0;
        let mut last = start;

        for (index, handle) in siblings.iter().enumerate().skip(start) {
            let Some(element) = SourceElement::from_handle(handle) else {
                last = index;
                continue;
            };
            if element.name == "tr" || is_group(&element.name) {
                break;
            }
            last = index;
            if !is_cell(&element.name) {
                continue;
            }

            let (_local, current) = resolve(&element, inherited);
            let cell = self.tree.create(FlowKind::TableCell);
            self.tree
                .set_attribute(cell, "BorderThickness", CELL_BORDER_THICKNESS);
            self.tree.set_attribute(cell, "BorderBrush", CELL_BORDER_BRUSH);

            let rows = row_span(handle);
            if attribute(handle, "rowspan").is_some() {
                self.tree.set_attribute(cell, "RowSpan", rows.to_string());
            }
            if let Some(starts) = placement.starts {
                while placement.spans.is_occupied(column) {
                    column += 1;
                }
                let width = cell_width(handle).unwrap_or(0.0);
                let span = calculate_column_span(column, width, starts);
                self.tree.set_attribute(cell, "ColumnSpan", span.to_string());
                placement.spans.cover(column..column + span, rows);
                column += span;
            }

            self.tree.append(row, cell);
            contents.push(Work::Blocks {
                parent: cell,
                source: handle.clone(),
                inherited: Rc::new(current),
            });
        }
        last
    }
}
