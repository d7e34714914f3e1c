//! String interning.
//!
//! A `Symbol` is a compact 4-byte handle to a string stored in a global
//! string table, giving O(1) equality and hashing for identifiers that
//! appear many times over (names, keywords, string literals).

use std::fmt;
use std::sync::{OnceLock, RwLock};

use rustc_hash::FxHashMap;

/// An interned string identifier.
///
/// Two `Symbol`s compare equal exactly when the strings they were interned
/// from are equal.
///
/// # Example
///
/// ```
/// use sablec_util::Symbol;
///
/// let a = Symbol::intern("x");
/// let b = Symbol::intern("x");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "x");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the global string table.
    index: u32,
}

impl Symbol {
    /// Intern a string, returning its symbol.
    ///
    /// Thread-safe; repeated interning of the same string returns the same
    /// symbol.
    pub fn intern(string: &str) -> Self {
        global_table()
            .write()
            .expect("string table poisoned")
            .intern(string)
    }

    /// Get the string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        global_table()
            .read()
            .expect("string table poisoned")
            .get(self)
    }

    /// The raw index value, for debugging.
    pub fn as_u32(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn global_table() -> &'static RwLock<StringTable> {
    static TABLE: OnceLock<RwLock<StringTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(StringTable::new()))
}

/// The backing store for interned strings.
///
/// Strings are never removed (leak-on-purpose strategy): the set of unique
/// strings in a compilation is bounded and typically small, and leaking
/// gives every entry a `'static` lifetime.
struct StringTable {
    /// Maps string contents to symbol index.
    index: FxHashMap<&'static str, u32>,

    /// Storage for the actual string data, indexed by symbol.
    strings: Vec<&'static str>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, string: &str) -> Symbol {
        if let Some(&index) = self.index.get(string) {
            return Symbol { index };
        }

        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let index = self.strings.len() as u32;
        self.strings.push(interned);
        self.index.insert(interned, index);

        Symbol { index }
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        self.strings[symbol.index as usize]
    }
}
