//! Text reports: model description, execution summary, traversal diagram
//! and DOT export.

pub mod describe;
pub mod diagram;
pub mod dot;
pub mod summary;
pub mod table;

pub use describe::{describe_model, END_STATE_NOTE, INITIAL_STATE_NOTE};
pub use diagram::{TraversalDiagram, DEFAULT_ITEM_SIZE};
pub use dot::to_dot;
pub use summary::{render_summary, BLANK};
pub use table::{Align, TextTable};
