// Selection DSL parser module

pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use pipeline::{parse_selection, parse_selection_str};
