//! sablec-util - Core Utilities and Foundation Types
//!
//! Foundation types shared by every stage of the sablec pipeline: interned
//! strings (`Symbol`), source spans (`Span`), typed index vectors
//! (`Idx`/`IndexVec`), and the diagnostic infrastructure (`Diagnostic`,
//! `Handler`).

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::Symbol;

// Re-export commonly used hash collections
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
