pub mod program;
pub mod rect;
pub mod table;

pub use program::ProgramSpec;
pub use rect::Rect;
pub use table::NamedTable;

/// Program name to target rectangle, in application order.
pub type Layout = NamedTable<Rect>;
