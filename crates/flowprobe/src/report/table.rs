//! Plain-text table with `+---+` borders.
//!
//! Cells may span several lines; every line of a cell is aligned on its
//! own and shorter cells are padded at the bottom.

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    /// Flush left
    Left,
    /// Centered (extra space goes right)
    #[default]
    Center,
    /// Flush right
    Right,
}

/// Column-aligned text table.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
    title: Option<String>,
}

impl TextTable {
    /// Create a table with the given column headers, all centered.
    #[must_use]
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = vec![Align::Center; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
            title: None,
        }
    }

    /// Line printed above the table.
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Set the alignment of the column named `header`.
    #[must_use]
    pub fn with_align(mut self, header: &str, align: Align) -> Self {
        if let Some(index) = self.headers.iter().position(|h| h == header) {
            self.align[index] = align;
        }
        self
    }

    /// Append a row. Missing cells render empty; extra cells are dropped.
    pub fn add_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                self.rows
                    .iter()
                    .flat_map(|row| row[col].lines())
                    .map(|line| line.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn separator(widths: &[usize]) -> String {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    }

    fn render_row(cells: &[String], widths: &[usize], align: &[Align]) -> Vec<String> {
        let split: Vec<Vec<&str>> = cells
            .iter()
            .map(|cell| {
                let lines: Vec<&str> = cell.lines().collect();
                if lines.is_empty() {
                    vec![""]
                } else {
                    lines
                }
            })
            .collect();
        let height = split.iter().map(Vec::len).max().unwrap_or(1);

        (0..height)
            .map(|n| {
                let mut line = String::from("|");
                for (col, lines) in split.iter().enumerate() {
                    let text = lines.get(n).copied().unwrap_or("");
                    let width = widths[col];
                    let cell = match align[col] {
                        Align::Left => format!("{text:<width$}"),
                        Align::Center => format!("{text:^width$}"),
                        Align::Right => format!("{text:>width$}"),
                    };
                    line.push(' ');
                    line.push_str(&cell);
                    line.push_str(" |");
                }
                line
            })
            .collect()
    }

    /// Render the table.
    #[must_use]
    pub fn render(&self) -> String {
        let widths = self.widths();
        let separator = Self::separator(&widths);
        let header_align = vec![Align::Center; self.headers.len()];

        let mut lines = Vec::new();
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        lines.push(separator.clone());
        lines.extend(Self::render_row(&self.headers, &widths, &header_align));
        lines.push(separator.clone());
        for row in &self.rows {
            lines.extend(Self::render_row(row, &widths, &self.align));
        }
        if !self.rows.is_empty() {
            lines.push(separator);
        }
        lines.join("\n")
    }
}

impl std::fmt::Display for TextTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
