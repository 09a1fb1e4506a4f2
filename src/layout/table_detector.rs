//! Table detection using column alignment across consecutive rows.
//!
//! A table shows up in OCR output as a run of rows with similar token counts
//! whose tokens stack into the same horizontal columns. Detection works on
//! such runs:
//!
//! 1. Find contiguous candidate runs where neighbouring rows' token counts
//!    differ by at most one (one missing cell is tolerated). A single-token
//!    row must also sit within a line gap of its neighbour.
//! 2. Project every token's horizontal span of the run onto one axis and
//!    merge spans that overlap enough into columns.
//! 3. Accept the run only if it has enough rows and columns, clean gutters
//!    between columns and a high enough share of filled cells.
//! 4. Assign each token to the column containing its horizontal center.
//!
//! Rejected runs are not an error; their rows simply stay flowing text.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::geometry::span_overlap;
use crate::layout::clustering::Row;
use crate::layout::model::{Table, TableCell};
use crate::layout::token::{mean_confidence, Token};
use crate::pipeline::config::LayoutConfig;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A horizontal interval occupied by one table column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    /// Left edge of the left-most member span
    pub left: f32,
    /// Right edge of the right-most member span
    pub right: f32,
}

/// Column layout shared by all rows of a candidate run.
///
/// Derived from the run's tokens, never stored on the resulting table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBoundaries {
    spans: Vec<ColumnSpan>,
    dividers: Vec<f32>,
}

impl ColumnBoundaries {
    /// Cluster the horizontal spans of every token in `rows` into columns.
    ///
    /// Two spans share a column when their overlap exceeds
    /// `min_overlap` times the narrower span; membership is transitive.
    pub fn from_rows(rows: &[Row], min_overlap: f32) -> Self {
        let spans: Vec<(f32, f32)> = rows
            .iter()
            .flat_map(|row| row.tokens.iter())
            .map(|t| (t.bbox().left(), t.bbox().right()))
            .collect();

        let mut sets = DisjointSet::new(spans.len());
        for i in 0..spans.len() {
            for j in (i + 1)..spans.len() {
                let (a, b) = (spans[i], spans[j]);
                let narrower = (a.1 - a.0).min(b.1 - b.0);
                if span_overlap(a.0, a.1, b.0, b.1) > min_overlap * narrower {
                    sets.union(i, j);
                }
            }
        }

        let mut clusters: Vec<(usize, ColumnSpan)> = vec![];
        for (idx, &(left, right)) in spans.iter().enumerate() {
            let root = sets.find(idx);
            match clusters.iter_mut().find(|(r, _)| *r == root) {
                Some((_, span)) => {
                    span.left = span.left.min(left);
                    span.right = span.right.max(right);
                },
                None => clusters.push((root, ColumnSpan { left, right })),
            }
        }

        let mut spans: Vec<ColumnSpan> = clusters.into_iter().map(|(_, span)| span).collect();
        spans.sort_by(|a, b| a.left.total_cmp(&b.left).then(a.right.total_cmp(&b.right)));

        let dividers = spans
            .windows(2)
            .map(|pair| (pair[0].right + pair[1].left) / 2.0)
            .collect();

        Self { spans, dividers }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when there are no columns.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Column intervals, left to right.
    pub fn spans(&self) -> &[ColumnSpan] {
        &self.spans
    }

    /// Whether every pair of adjacent columns is separated by whitespace.
    pub fn has_clean_gutters(&self) -> bool {
        self.spans.windows(2).all(|pair| pair[0].right <= pair[1].left)
    }

    /// Column index for a horizontal position.
    ///
    /// A position exactly on a divider belongs to the column on its left.
    pub fn column_for(&self, x: f32) -> usize {
        self.dividers.iter().take_while(|&&d| x > d).count()
    }
}

/// Union-find over span indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower root wins so the result does not depend on call order
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}

/// Why a candidate run was left as plain rows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum TableRejection {
    #[error("only {0} rows")]
    TooFewRows(usize),
    #[error("only {0} columns")]
    TooFewColumns(usize),
    #[error("columns overlap without a gutter")]
    RaggedColumns,
    #[error("sparse grid ({fill:.0}% filled)", fill = .0 * 100.0)]
    Sparse(f32),
}

/// Output of the table detection stage.
#[derive(Debug, Clone)]
pub struct TableDetection {
    /// Accepted tables, top to bottom
    pub tables: Vec<Table>,
    /// Rows not consumed by any table, in their original order
    pub residual_rows: Vec<Row>,
}

/// Detect tables among clustered rows.
///
/// # Arguments
///
/// * `rows` - Rows ordered top-to-bottom
/// * `config` - Supplies column overlap, fill ratio and minimum table size
///
/// # Returns
///
/// Accepted tables plus every row that no table consumed. Each row ends up in
/// exactly one of the two.
///
/// # Examples
///
/// ```
/// use ocr_layout::geometry::Rect;
/// use ocr_layout::layout::{cluster_rows, detect_tables, Token};
/// use ocr_layout::LayoutConfig;
///
/// let cell = |text: &str, x: f32, y: f32| Token::new(text, Rect::new(x, y, 40.0, 12.0), 0.9).unwrap();
/// let tokens = vec![
///     cell("Name", 0.0, 0.0), cell("Age", 100.0, 0.0),
///     cell("Ada", 0.0, 20.0), cell("36", 100.0, 20.0),
/// ];
/// let config = LayoutConfig::default();
/// let rows = cluster_rows(&tokens, &config);
/// let detection = detect_tables(&rows, &config);
/// assert_eq!(detection.tables.len(), 1);
/// assert_eq!(detection.tables[0].num_columns(), 2);
/// assert!(detection.residual_rows.is_empty());
/// ```
pub fn detect_tables(rows: &[Row], config: &LayoutConfig) -> TableDetection {
    let runs = candidate_runs(rows, config);

    #[cfg(feature = "parallel")]
    let verdicts: Vec<Option<(Range<usize>, Table)>> = runs
        .par_iter()
        .map(|run| evaluate_candidate(rows, run.clone(), config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let verdicts: Vec<Option<(Range<usize>, Table)>> = runs
        .iter()
        .map(|run| evaluate_candidate(rows, run.clone(), config))
        .collect();

    let mut consumed = vec![false; rows.len()];
    let mut tables = vec![];
    for (range, table) in verdicts.into_iter().flatten() {
        consumed[range].iter_mut().for_each(|c| *c = true);
        tables.push(table);
    }

    let residual_rows: Vec<Row> = rows
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(row, _)| row.clone())
        .collect();

    log::debug!(
        "table detection: {} candidate runs, {} tables, {} residual rows",
        runs.len(),
        tables.len(),
        residual_rows.len()
    );

    TableDetection {
        tables,
        residual_rows,
    }
}

/// Contiguous row ranges that could be tables.
///
/// Neighbouring rows must differ by at most one token, and at least one of
/// each neighbouring pair must hold two or more tokens. A row with a single
/// token only links when it sits within `config.paragraph_gap` row heights of
/// its neighbour, so isolated lines such as footers stay out of the run.
fn candidate_runs(rows: &[Row], config: &LayoutConfig) -> Vec<Range<usize>> {
    let links = |a: &Row, b: &Row| {
        let counts_match = a.len().abs_diff(b.len()) <= 1 && (a.len() >= 2 || b.len() >= 2);
        let full_rows = a.len() >= 2 && b.len() >= 2;
        counts_match && (full_rows || b.top() - a.bottom() <= config.paragraph_gap * a.height())
    };

    let mut runs = vec![];
    let mut start = 0;
    for i in 1..=rows.len() {
        let continues = i < rows.len() && links(&rows[i - 1], &rows[i]);
        if !continues {
            if i - start >= config.min_table_rows {
                runs.push(start..i);
            }
            start = i;
        }
    }
    runs
}

/// Most common token count in a run; ties go to the larger count.
fn modal_len(rows: &[Row]) -> usize {
    let mut frequency: BTreeMap<usize, usize> = BTreeMap::new();
    for row in rows {
        *frequency.entry(row.len()).or_default() += 1;
    }
    frequency
        .into_iter()
        .max_by_key(|&(len, count)| (count, len))
        .map_or(0, |(len, _)| len)
}

/// Evaluate a run, retrying once with its edge rows trimmed.
///
/// The retry drops leading and trailing rows that hold a single token or
/// whose token count differs from the run's most common count, which peels
/// titles and prose lines off an otherwise clean grid.
fn evaluate_candidate(
    rows: &[Row],
    run: Range<usize>,
    config: &LayoutConfig,
) -> Option<(Range<usize>, Table)> {
    match build_table(&rows[run.clone()], config) {
        Ok(table) => {
            log::debug!(
                "rows {:?} accepted as {}x{} table",
                run,
                table.num_rows(),
                table.num_columns()
            );
            return Some((run, table));
        },
        Err(reason) => log::debug!("rows {:?} rejected as table: {}", run, reason),
    }

    let modal = modal_len(&rows[run.clone()]);
    let off_grid = |row: &Row| row.len() < 2 || row.len() != modal;

    let mut trimmed = run.clone();
    while trimmed.start < trimmed.end && off_grid(&rows[trimmed.start]) {
        trimmed.start += 1;
    }
    while trimmed.end > trimmed.start && off_grid(&rows[trimmed.end - 1]) {
        trimmed.end -= 1;
    }
    if trimmed == run {
        return None;
    }

    match build_table(&rows[trimmed.clone()], config) {
        Ok(table) => {
            log::debug!("trimmed rows {:?} accepted as table", trimmed);
            Some((trimmed, table))
        },
        Err(reason) => {
            log::debug!("trimmed rows {:?} rejected as table: {}", trimmed, reason);
            None
        },
    }
}

/// Validate a run and lay its tokens out as a grid.
fn build_table(rows: &[Row], config: &LayoutConfig) -> Result<Table, TableRejection> {
    if rows.len() < config.min_table_rows.max(2) {
        return Err(TableRejection::TooFewRows(rows.len()));
    }

    let columns = ColumnBoundaries::from_rows(rows, config.column_overlap);
    if columns.len() < config.min_table_columns.max(2) {
        return Err(TableRejection::TooFewColumns(columns.len()));
    }
    if !columns.has_clean_gutters() {
        return Err(TableRejection::RaggedColumns);
    }

    let grid: Vec<Vec<Vec<&Token>>> = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Vec<&Token>> = vec![vec![]; columns.len()];
            // Row tokens are already left-to-right, so cell order is too
            for token in &row.tokens {
                cells[columns.column_for(token.bbox().center().x)].push(token);
            }
            cells
        })
        .collect();

    let total = rows.len() * columns.len();
    let filled = grid.iter().flatten().filter(|cell| !cell.is_empty()).count();
    let fill = filled as f32 / total as f32;
    if fill < config.min_table_fill {
        return Err(TableRejection::Sparse(fill));
    }

    let cells: Vec<Vec<TableCell>> = grid
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, tokens)| TableCell::from_tokens(r, c, tokens))
                .collect()
        })
        .collect();

    let first = rows[0].bbox;
    let bbox = rows.iter().skip(1).fold(first, |acc, row| acc.union(&row.bbox));
    let confidence = mean_confidence(rows.iter().flat_map(|row| row.tokens.iter()));

    Ok(Table::new(cells, confidence, bbox))
}
