//! String interner implementation using DashMap for concurrent access.
//!
//! Interned strings are allocated once and leaked to obtain `'static`
//! references. That is safe and deliberate: the table lives for the whole
//! program, entries are never removed (the runtime's symbol table is
//! append-only by contract), and it avoids lifetime plumbing through every
//! token and runtime value.

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::LazyLock;

use super::{InternerStats, Symbol};

/// Number of symbol indices reserved for known keywords and selectors
///
/// Must match `RESERVED_SYMBOLS_END` in `mod.rs`.
const RESERVED_SYMBOLS_END: u32 = 256;

/// Global string table instance
///
/// Initialized on first use via `LazyLock`. All known keywords are
/// pre-interned during initialization so they get stable, predictable
/// indices matching the `KW_*` / `SEL_*` constants.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.initialize_known_symbols();
    table
});

/// Thread-safe string table
pub struct StringTable {
    /// string -> symbol index
    map: DashMap<&'static str, u32, RandomState>,

    /// symbol index -> string (for `Symbol::as_str`)
    strings: DashMap<u32, &'static str, RandomState>,

    /// Counter for the next dynamic index
    ///
    /// Starts past the reserved range so known symbols keep their indices.
    next_index: AtomicU32,

    /// Number of lookups that found an existing entry
    hits: AtomicUsize,

    /// Number of lookups that allocated a new entry
    misses: AtomicUsize,
}

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            next_index: AtomicU32::new(RESERVED_SYMBOLS_END),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Pre-intern every known symbol, in constant-index order
    ///
    /// The order of this list defines the indices of the `KW_*` and `SEL_*`
    /// constants in `mod.rs`; the two must not drift apart.
    fn initialize_known_symbols(&self) {
        let known_symbols = [
            // Keywords
            "alias",
            "and",
            "begin",
            "break",
            "case",
            "class",
            "def",
            "defined?",
            "do",
            "else",
            "elsif",
            "end",
            "ensure",
            "false",
            "for",
            "if",
            "in",
            "module",
            "next",
            "nil",
            "not",
            "or",
            "redo",
            "rescue",
            "retry",
            "return",
            "self",
            "super",
            "then",
            "true",
            "undef",
            "unless",
            "until",
            "when",
            "while",
            "yield",
            "BEGIN",
            "END",
            "__FILE__",
            "__LINE__",
            "__ENCODING__",
            // Selectors
            "new",
            "initialize",
            "inspect",
            "to_s",
            "call",
            "each",
            "==",
            "===",
            "<=>",
            "+",
            "-",
            "*",
            "/",
            "%",
            "**",
            "[]",
            "[]=",
            "<<",
            "method_missing",
        ];
        for (index, string) in known_symbols.into_iter().enumerate() {
            let index = index as u32;
            self.map.insert(string, index);
            self.strings.insert(index, string);
        }
    }

    /// Intern a string, returning its symbol
    pub fn intern(&self, string: &str) -> Symbol {
        if let Some(index) = self.map.get(string) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Symbol { index: *index };
        }

        // Miss path: leak a copy for the 'static lifetime, then race to
        // insert it. A concurrent intern of the same string may win; in that
        // case the leaked copy is wasted, which is harmless.
        let leaked: &'static str = Box::leak(string.to_string().into_boxed_str());
        let index = match self.map.entry(leaked) {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(vacant) => {
                let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                vacant.insert(index);
                self.strings.insert(index, leaked);
                index
            },
        };
        self.misses.fetch_add(1, Ordering::Relaxed);
        Symbol { index }
    }

    /// Get the string for a symbol, if the index is valid
    pub fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.strings.get(&symbol.index).map(|s| *s)
    }

    /// Snapshot of interner statistics
    pub fn stats(&self) -> InternerStats {
        InternerStats {
            count: self.strings.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Reset hit/miss counters (test helper)
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbols_have_reserved_indices() {
        let sym = STRING_TABLE.intern("alias");
        assert_eq!(sym.as_u32(), 0);
        let sym = STRING_TABLE.intern("yield");
        assert_eq!(sym.as_u32(), 35);
    }

    #[test]
    fn test_dynamic_symbols_start_past_reserved_range() {
        let sym = STRING_TABLE.intern("definitely_not_reserved");
        assert!(sym.as_u32() >= RESERVED_SYMBOLS_END);
    }

    #[test]
    fn test_get_invalid_index() {
        let bogus = Symbol { index: u32::MAX };
        assert!(STRING_TABLE.get(bogus).is_none());
    }
}
