//! Deterministic, offline scoring rules.

pub mod competitive;
pub mod lexicon;
pub mod text;

pub use competitive::*;
pub use lexicon::*;
pub use text::*;
