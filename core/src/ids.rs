//! Dense integer handles into the arenas owned by [`crate::builder::Builder`].
//!
//! The reference design threads pointers through a cyclic object graph
//! (symbol ⇄ rule ⇄ configuration ⇄ state). Here every entity kind gets its
//! own `Vec` arena and is addressed by one of these `newtype` indices instead,
//! per the arena/index design note.

use std::fmt;

macro_rules! index_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(i: usize) -> Self {
                $name(i as u32)
            }
        }
    };
}

index_type!(SymbolId);
index_type!(RuleId);
index_type!(StateId);
index_type!(ConfigId);

/// Symbol index 0 is always the end-of-input terminal, per §6.
pub const EOF_SYMBOL: SymbolId = SymbolId(0);

/// State 0 is always the initial state, per §6.
pub const START_STATE: StateId = StateId(0);
