//! Symbol module - String interning for identifiers, messages, and runtime
//! symbol values.
//!
//! A [`Symbol`] is a compact (4-byte) handle to a string stored in a global
//! table. Interning gives O(1) equality, which the runtime relies on: its
//! instance-variable and method tables are keyed by `Symbol`, so "pointer
//! identity" of a Beryl symbol is just index equality here.
//!
//! # Thread Safety
//!
//! The interner is fully thread-safe (`Sync + Send`), backed by DashMap.
//! Interned strings live for the program duration and are never freed.
//!
//! # Examples
//!
//! ```
//! use beryl_util::symbol::Symbol;
//!
//! let s1 = Symbol::intern("hello");
//! let s2 = Symbol::intern("hello");
//! let s3 = Symbol::intern("world");
//!
//! assert_eq!(s1, s2);
//! assert_ne!(s1, s3);
//! assert_eq!(s1.as_str(), "hello");
//! ```

mod interner;

pub use interner::STRING_TABLE;

/// Statistics about the string interner for profiling
#[derive(Clone, Copy, Debug, Default)]
pub struct InternerStats {
    /// Number of interned strings
    pub count: usize,
    /// Number of cache hits (string already interned)
    pub hits: usize,
    /// Number of cache misses (new string allocation)
    pub misses: usize,
}

impl InternerStats {
    /// Calculate the hit rate (hits / (hits + misses))
    ///
    /// Returns 0.0 if no lookups have been performed.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Symbol - An interned string identifier
///
/// `Symbol` is exactly 4 bytes, making it cache-friendly compared to
/// `String`. Comparison is O(1) index comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the global string table
    pub(crate) index: u32,
}

/// Reserved symbol indices for known symbols (keywords and selectors)
///
/// All symbols with index < this value are pre-defined at startup.
const RESERVED_SYMBOLS_END: u32 = 256;

// ----------------------------------------------------------------------------
// Keywords
// ----------------------------------------------------------------------------

/// Known symbol for the `alias` keyword
pub const KW_ALIAS: Symbol = Symbol { index: 0 };
/// Known symbol for the `and` keyword
pub const KW_AND: Symbol = Symbol { index: 1 };
/// Known symbol for the `begin` keyword
pub const KW_BEGIN: Symbol = Symbol { index: 2 };
/// Known symbol for the `break` keyword
pub const KW_BREAK: Symbol = Symbol { index: 3 };
/// Known symbol for the `case` keyword
pub const KW_CASE: Symbol = Symbol { index: 4 };
/// Known symbol for the `class` keyword
pub const KW_CLASS: Symbol = Symbol { index: 5 };
/// Known symbol for the `def` keyword
pub const KW_DEF: Symbol = Symbol { index: 6 };
/// Known symbol for the `defined?` keyword
pub const KW_DEFINED: Symbol = Symbol { index: 7 };
/// Known symbol for the `do` keyword
pub const KW_DO: Symbol = Symbol { index: 8 };
/// Known symbol for the `else` keyword
pub const KW_ELSE: Symbol = Symbol { index: 9 };
/// Known symbol for the `elsif` keyword
pub const KW_ELSIF: Symbol = Symbol { index: 10 };
/// Known symbol for the `end` keyword
pub const KW_END: Symbol = Symbol { index: 11 };
/// Known symbol for the `ensure` keyword
pub const KW_ENSURE: Symbol = Symbol { index: 12 };
/// Known symbol for the `false` keyword
pub const KW_FALSE: Symbol = Symbol { index: 13 };
/// Known symbol for the `for` keyword
pub const KW_FOR: Symbol = Symbol { index: 14 };
/// Known symbol for the `if` keyword
pub const KW_IF: Symbol = Symbol { index: 15 };
/// Known symbol for the `in` keyword
pub const KW_IN: Symbol = Symbol { index: 16 };
/// Known symbol for the `module` keyword
pub const KW_MODULE: Symbol = Symbol { index: 17 };
/// Known symbol for the `next` keyword
pub const KW_NEXT: Symbol = Symbol { index: 18 };
/// Known symbol for the `nil` keyword
pub const KW_NIL: Symbol = Symbol { index: 19 };
/// Known symbol for the `not` keyword
pub const KW_NOT: Symbol = Symbol { index: 20 };
/// Known symbol for the `or` keyword
pub const KW_OR: Symbol = Symbol { index: 21 };
/// Known symbol for the `redo` keyword
pub const KW_REDO: Symbol = Symbol { index: 22 };
/// Known symbol for the `rescue` keyword
pub const KW_RESCUE: Symbol = Symbol { index: 23 };
/// Known symbol for the `retry` keyword
pub const KW_RETRY: Symbol = Symbol { index: 24 };
/// Known symbol for the `return` keyword
pub const KW_RETURN: Symbol = Symbol { index: 25 };
/// Known symbol for the `self` keyword
pub const KW_SELF: Symbol = Symbol { index: 26 };
/// Known symbol for the `super` keyword
pub const KW_SUPER: Symbol = Symbol { index: 27 };
/// Known symbol for the `then` keyword
pub const KW_THEN: Symbol = Symbol { index: 28 };
/// Known symbol for the `true` keyword
pub const KW_TRUE: Symbol = Symbol { index: 29 };
/// Known symbol for the `undef` keyword
pub const KW_UNDEF: Symbol = Symbol { index: 30 };
/// Known symbol for the `unless` keyword
pub const KW_UNLESS: Symbol = Symbol { index: 31 };
/// Known symbol for the `until` keyword
pub const KW_UNTIL: Symbol = Symbol { index: 32 };
/// Known symbol for the `when` keyword
pub const KW_WHEN: Symbol = Symbol { index: 33 };
/// Known symbol for the `while` keyword
pub const KW_WHILE: Symbol = Symbol { index: 34 };
/// Known symbol for the `yield` keyword
pub const KW_YIELD: Symbol = Symbol { index: 35 };
/// Known symbol for the `BEGIN` keyword
pub const KW_UPPER_BEGIN: Symbol = Symbol { index: 36 };
/// Known symbol for the `END` keyword
pub const KW_UPPER_END: Symbol = Symbol { index: 37 };
/// Known symbol for `__FILE__`
pub const KW_FILE: Symbol = Symbol { index: 38 };
/// Known symbol for `__LINE__`
pub const KW_LINE: Symbol = Symbol { index: 39 };
/// Known symbol for `__ENCODING__`
pub const KW_ENCODING: Symbol = Symbol { index: 40 };

// ----------------------------------------------------------------------------
// Common selectors
// ----------------------------------------------------------------------------

/// Known symbol for `new`
pub const SEL_NEW: Symbol = Symbol { index: 41 };
/// Known symbol for `initialize`
pub const SEL_INITIALIZE: Symbol = Symbol { index: 42 };
/// Known symbol for `inspect`
pub const SEL_INSPECT: Symbol = Symbol { index: 43 };
/// Known symbol for `to_s`
pub const SEL_TO_S: Symbol = Symbol { index: 44 };
/// Known symbol for `call`
pub const SEL_CALL: Symbol = Symbol { index: 45 };
/// Known symbol for `each`
pub const SEL_EACH: Symbol = Symbol { index: 46 };
/// Known symbol for the `==` operator
pub const SEL_EQ: Symbol = Symbol { index: 47 };
/// Known symbol for the `===` operator
pub const SEL_CASE_EQ: Symbol = Symbol { index: 48 };
/// Known symbol for the `<=>` operator
pub const SEL_CMP: Symbol = Symbol { index: 49 };
/// Known symbol for the `+` operator
pub const SEL_PLUS: Symbol = Symbol { index: 50 };
/// Known symbol for the `-` operator
pub const SEL_MINUS: Symbol = Symbol { index: 51 };
/// Known symbol for the `*` operator
pub const SEL_MUL: Symbol = Symbol { index: 52 };
/// Known symbol for the `/` operator
pub const SEL_DIV: Symbol = Symbol { index: 53 };
/// Known symbol for the `%` operator
pub const SEL_MOD: Symbol = Symbol { index: 54 };
/// Known symbol for the `**` operator
pub const SEL_POW: Symbol = Symbol { index: 55 };
/// Known symbol for the `[]` operator
pub const SEL_REF: Symbol = Symbol { index: 56 };
/// Known symbol for the `[]=` operator
pub const SEL_REF_SET: Symbol = Symbol { index: 57 };
/// Known symbol for the `<<` operator
pub const SEL_LSHIFT: Symbol = Symbol { index: 58 };
/// Known symbol for `method_missing`
pub const SEL_METHOD_MISSING: Symbol = Symbol { index: 59 };

impl Symbol {
    /// The maximum index value for a symbol
    pub const MAX_INDEX: u32 = u32::MAX;

    /// Intern a string, returning its symbol
    ///
    /// # Examples
    ///
    /// ```
    /// use beryl_util::symbol::Symbol;
    ///
    /// let sym = Symbol::intern("message");
    /// assert_eq!(Symbol::intern("message"), sym);
    /// ```
    #[inline]
    pub fn intern(string: &str) -> Self {
        STRING_TABLE.intern(string)
    }

    /// Intern a known keyword, returning its predefined symbol
    ///
    /// Known keywords resolve without hashing; anything else falls back to
    /// [`Symbol::intern`].
    #[inline]
    pub fn intern_known(string: &str) -> Self {
        match string {
            "alias" => KW_ALIAS,
            "and" => KW_AND,
            "begin" => KW_BEGIN,
            "break" => KW_BREAK,
            "case" => KW_CASE,
            "class" => KW_CLASS,
            "def" => KW_DEF,
            "defined?" => KW_DEFINED,
            "do" => KW_DO,
            "else" => KW_ELSE,
            "elsif" => KW_ELSIF,
            "end" => KW_END,
            "ensure" => KW_ENSURE,
            "false" => KW_FALSE,
            "for" => KW_FOR,
            "if" => KW_IF,
            "in" => KW_IN,
            "module" => KW_MODULE,
            "next" => KW_NEXT,
            "nil" => KW_NIL,
            "not" => KW_NOT,
            "or" => KW_OR,
            "redo" => KW_REDO,
            "rescue" => KW_RESCUE,
            "retry" => KW_RETRY,
            "return" => KW_RETURN,
            "self" => KW_SELF,
            "super" => KW_SUPER,
            "then" => KW_THEN,
            "true" => KW_TRUE,
            "undef" => KW_UNDEF,
            "unless" => KW_UNLESS,
            "until" => KW_UNTIL,
            "when" => KW_WHEN,
            "while" => KW_WHILE,
            "yield" => KW_YIELD,
            "BEGIN" => KW_UPPER_BEGIN,
            "END" => KW_UPPER_END,
            "__FILE__" => KW_FILE,
            "__LINE__" => KW_LINE,
            "__ENCODING__" => KW_ENCODING,
            "new" => SEL_NEW,
            "initialize" => SEL_INITIALIZE,
            "inspect" => SEL_INSPECT,
            "to_s" => SEL_TO_S,
            "call" => SEL_CALL,
            "each" => SEL_EACH,
            "==" => SEL_EQ,
            "===" => SEL_CASE_EQ,
            "<=>" => SEL_CMP,
            "+" => SEL_PLUS,
            "-" => SEL_MINUS,
            "*" => SEL_MUL,
            "/" => SEL_DIV,
            "%" => SEL_MOD,
            "**" => SEL_POW,
            "[]" => SEL_REF,
            "[]=" => SEL_REF_SET,
            "<<" => SEL_LSHIFT,
            "method_missing" => SEL_METHOD_MISSING,
            _ => Self::intern(string),
        }
    }

    /// Get the string value associated with this symbol
    ///
    /// Returns an empty string for a symbol with an out-of-range index.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        STRING_TABLE.get(*self).unwrap_or("")
    }

    /// Check if the symbol's string is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Compare the symbol's string with a `&str` without interning it
    #[inline]
    pub fn eq_str(&self, other: &str) -> bool {
        self.as_str() == other
    }

    /// Returns true if this is a "known" symbol (predefined keyword or
    /// selector)
    #[inline]
    pub fn is_known(&self) -> bool {
        self.index < RESERVED_SYMBOLS_END
    }

    /// Get the raw index value
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.index
    }

    /// Create a symbol from a raw index
    ///
    /// # Safety
    ///
    /// The index must correspond to a valid entry in the string table.
    #[inline]
    pub unsafe fn from_u32_unchecked(index: u32) -> Self {
        Self { index }
    }

    /// Get statistics about the string interner for profiling
    #[inline]
    pub fn stats() -> InternerStats {
        STRING_TABLE.stats()
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Symbols cross the compiler/runtime boundary; they must stay shareable.
static_assertions::assert_impl_all!(Symbol: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_symbol_intern() {
        let s1 = Symbol::intern("hello");
        let s2 = Symbol::intern("hello");
        let s3 = Symbol::intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
        assert_eq!(s1.as_str(), "hello");
        assert_eq!(s3.as_str(), "world");
    }

    #[test]
    fn test_symbol_display() {
        let s = Symbol::intern("test");
        assert_eq!(format!("{}", s), "test");
        assert_eq!(format!("{:?}", s), "Symbol(test)");
    }

    #[test]
    fn test_known_keywords() {
        assert_eq!(KW_DEF.as_str(), "def");
        assert_eq!(KW_DEFINED.as_str(), "defined?");
        assert_eq!(KW_ENCODING.as_str(), "__ENCODING__");
        assert_eq!(SEL_CMP.as_str(), "<=>");
        assert_eq!(SEL_REF_SET.as_str(), "[]=");
        assert!(KW_DEF.is_known());
        assert!(!Symbol::intern("my_local").is_known());
    }

    #[test]
    fn test_intern_known() {
        assert_eq!(Symbol::intern_known("rescue"), KW_RESCUE);
        assert_eq!(Symbol::intern_known("<=>"), SEL_CMP);
        let other = Symbol::intern_known("not_a_keyword");
        assert_eq!(other.as_str(), "not_a_keyword");
        assert!(!other.is_known());
    }

    #[test]
    fn test_known_matches_interned() {
        // Interning a keyword string must resolve to the reserved index.
        assert_eq!(Symbol::intern("while"), KW_WHILE);
        assert_eq!(Symbol::intern("=="), SEL_EQ);
    }

    #[test]
    fn test_from_u32_unchecked() {
        let sym = Symbol::intern("roundtrip");
        let sym2 = unsafe { Symbol::from_u32_unchecked(sym.as_u32()) };
        assert_eq!(sym, sym2);
    }

    #[test]
    fn test_concurrent_same_string() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| Symbol::intern("concurrent_same")))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for symbol in &results[1..] {
            assert_eq!(results[0], *symbol);
        }
    }

    #[test]
    fn test_concurrent_distinct_strings() {
        let handles: Vec<_> = (0..8)
            .map(|i| thread::spawn(move || Symbol::intern(&format!("thread_{}", i))))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                assert_ne!(symbols[i], symbols[j]);
            }
        }
    }

    #[test]
    fn test_unicode_and_empty() {
        for s in ["", "你好", "🦀", "hello\nworld\t!"] {
            assert_eq!(Symbol::intern(s).as_str(), s);
        }
    }

    #[test]
    fn test_stats_tracking() {
        let _ = Symbol::intern("stats_probe");
        let _ = Symbol::intern("stats_probe");
        let stats = Symbol::stats();
        assert!(stats.count > 0);
        assert!(stats.hits >= 1);
        assert!(stats.hit_rate() > 0.0);
    }
}
