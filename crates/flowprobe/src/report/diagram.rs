//! ASCII traversal diagram.
//!
//! Renders a list of visited states as a chain of boxes that snakes across
//! the page, `items_per_line` boxes at a time:
//!
//! ```text
//!                             STEP 1               STEP 2
//!    +=============+      +-------------+      +-------------+
//!    |    READY    |----->|   1: DNE    |----->| 2: BUILDING |----->+
//!    +=============+      +-------------+      +-------------+      |
//!                                                                   |
//!                             STEP 4               STEP 3           |
//!    +=============+      +-------------+      +-------------+      |
//!    |     END     |<-----| 4: DELETED  |<-----|  3: ACTIVE  |<-----+
//!    +=============+      +-------------+      +-------------+
//! ```

use std::fmt;

/// Minimum box width.
pub const DEFAULT_ITEM_SIZE: usize = 20;

const BUFFER: usize = 10;
const CONNECTOR: &str = "|   ";
const TRIGGER_PREFIX: &str = "Trigger";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Start,
    End { fwd: bool },
    Standard { caption: String, text: String, fwd: bool },
    Arrow,
    /// Half of the loop that joins two rows.
    NextLine { fwd: bool, first: bool },
}

impl Block {
    fn lines(&self, size: usize) -> [String; 5] {
        let blank = " ".repeat(size);
        let border = |ch: char| {
            format!("   +{}+   ", ch.to_string().repeat(size.saturating_sub(8)))
        };
        let middle = |prefix: &str, text: &str, suffix: &str| {
            let width = size.saturating_sub(8);
            format!("{prefix}{text:^width$}{suffix}")
        };

        match self {
            Self::Start => [
                blank.clone(),
                border('='),
                middle("   |", "READY", "|---"),
                border('='),
                blank,
            ],
            Self::End { fwd } => {
                let (prefix, suffix) = if *fwd { ("-->|", "|   ") } else { ("   |", "|<--") };
                [
                    blank.clone(),
                    border('='),
                    middle(prefix, "END", suffix),
                    border('='),
                    blank,
                ]
            }
            Self::Standard { caption, text, fwd } => {
                let (prefix, suffix) = if *fwd { ("-->|", "|---") } else { ("---|", "|<--") };
                [
                    format!("{caption:^size$}"),
                    border('-'),
                    middle(prefix, text, suffix),
                    border('-'),
                    blank,
                ]
            }
            Self::Arrow => [
                blank.clone(),
                blank.clone(),
                "-".repeat(size),
                blank.clone(),
                blank,
            ],
            Self::NextLine { fwd, first } => {
                let space = " ".repeat(size.saturating_sub(CONNECTOR.len()));
                let left = |tail: &str| format!("{space}{tail}");
                match (*fwd, *first) {
                    (true, true) => [
                        blank.clone(),
                        blank,
                        "-->+".to_string(),
                        "   |".to_string(),
                        "   |".to_string(),
                    ],
                    (false, false) => [
                        "   |".to_string(),
                        "   |".to_string(),
                        "---+".to_string(),
                        blank.clone(),
                        blank,
                    ],
                    (false, true) => [
                        blank.clone(),
                        blank,
                        left("+<--"),
                        left(CONNECTOR),
                        left(CONNECTOR),
                    ],
                    (true, false) => [
                        left(CONNECTOR),
                        left(CONNECTOR),
                        left("+---"),
                        blank.clone(),
                        blank,
                    ],
                }
            }
        }
    }
}

/// Builder for the traversal diagram of a path.
#[derive(Debug, Clone)]
pub struct TraversalDiagram {
    states: Vec<String>,
    triggers: Vec<String>,
    items_per_line: usize,
    item_size: usize,
    add_index: bool,
}

impl TraversalDiagram {
    /// Diagram of `states`, captioned with the trigger that led to each one.
    /// With no triggers, boxes are captioned `STEP n`.
    pub fn new<S: AsRef<str>>(states: impl IntoIterator<Item = S>, triggers: &[String]) -> Self {
        Self {
            states: states.into_iter().map(|s| s.as_ref().to_string()).collect(),
            triggers: triggers.to_vec(),
            items_per_line: 3,
            item_size: DEFAULT_ITEM_SIZE,
            add_index: false,
        }
    }

    /// Boxes per row (at least one).
    #[must_use]
    pub fn items_per_line(mut self, items: usize) -> Self {
        self.items_per_line = items.max(1);
        self
    }

    /// Minimum box width; boxes grow to fit the longest label.
    #[must_use]
    pub fn item_size(mut self, size: usize) -> Self {
        self.item_size = size;
        self
    }

    /// Prefix each label with its 1-based position.
    #[must_use]
    pub fn add_index(mut self, add_index: bool) -> Self {
        self.add_index = add_index;
        self
    }

    fn labels(&self) -> Vec<String> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| {
                if self.add_index {
                    format!("{}: {state}", index + 1)
                } else {
                    state.clone()
                }
            })
            .collect()
    }

    fn caption(&self, step: usize) -> String {
        if self.triggers.is_empty() {
            return format!("STEP {step:<2}");
        }
        match step.checked_sub(2).and_then(|index| self.triggers.get(index)) {
            Some(trigger) => format!("{TRIGGER_PREFIX}:{trigger}"),
            None => String::new(),
        }
    }

    fn blocks(&self, labels: Vec<String>) -> Vec<Block> {
        let per_line = self.items_per_line;
        let line_length = per_line + 2;
        let total = labels.len();
        let mut blocks = vec![Block::Start];
        let mut fwd = true;
        let mut step = 1;
        let mut labels = labels.into_iter();

        while step <= total {
            let in_row = per_line.min(total - step + 1);
            for _ in 0..in_row {
                let text = labels.next().unwrap_or_default();
                blocks.push(Block::Standard {
                    caption: self.caption(step),
                    text,
                    fwd,
                });
                step += 1;
            }
            if in_row == per_line && step <= total {
                blocks.push(Block::NextLine { fwd, first: true });
                fwd = !fwd;
                blocks.push(Block::NextLine { fwd, first: false });
            }
        }

        let arrows = if fwd {
            let placed = (step - 1) % per_line;
            if total > per_line && placed != 0 {
                per_line - placed
            } else {
                0
            }
        } else {
            let mut subtotal = blocks.len();
            while subtotal > line_length {
                subtotal -= line_length;
            }
            line_length.saturating_sub(subtotal + 1)
        };
        blocks.extend(std::iter::repeat(Block::Arrow).take(arrows));
        blocks.push(Block::End { fwd });
        blocks
    }

    /// Render the diagram. Each row of boxes is five lines of text; trailing
    /// spaces are trimmed.
    #[must_use]
    pub fn render(&self) -> String {
        let labels = self.labels();
        let size = labels
            .iter()
            .map(|label| label.chars().count() + BUFFER)
            .fold(self.item_size, usize::max);
        let blocks = self.blocks(labels);

        let mut output = String::new();
        for (row, chunk) in blocks.chunks(self.items_per_line + 2).enumerate() {
            let mut lines: [String; 5] = Default::default();
            let ordered: Box<dyn Iterator<Item = &Block>> = if row % 2 == 0 {
                Box::new(chunk.iter())
            } else {
                Box::new(chunk.iter().rev())
            };
            for block in ordered {
                for (line, part) in lines.iter_mut().zip(block.lines(size)) {
                    line.push_str(&part);
                }
            }
            for line in &lines {
                output.push_str(line.trim_end());
                output.push('\n');
            }
        }
        output
    }
}

impl fmt::Display for TraversalDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
