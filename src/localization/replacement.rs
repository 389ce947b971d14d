//! Replacement descriptors: what a matched literal is rewritten to.
//!
//! A fixed replacement always yields the same value. An ordered sequence yields its
//! elements across successive occurrences of the same original literal within one
//! method, then repeats its designated default indefinitely once exhausted -- the
//! default is the persisted plain `NewString` when present, else the sequence's first
//! element.

/// Replacement descriptor for one original literal within one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Every occurrence is rewritten to the same value.
    Fixed(String),
    /// Successive occurrences consume `values` in order, then repeat `default`.
    Ordered {
        /// Sequence elements in persisted `_1`, `_2`, ... order
        values: Vec<String>,
        /// Value repeated once the sequence is exhausted
        default: String,
        /// Occurrences served so far
        cursor: usize,
    },
}

impl Replacement {
    /// A fixed replacement.
    #[must_use]
    pub fn fixed(value: impl Into<String>) -> Self {
        Replacement::Fixed(value.into())
    }

    /// An ordered sequence with an explicitly designated default.
    ///
    /// With `default = None` the first element is the default. `values` must be
    /// non-empty.
    #[must_use]
    pub fn ordered(values: Vec<String>, default: Option<String>) -> Self {
        debug_assert!(!values.is_empty(), "ordered replacement needs at least one value");
        let default = default.unwrap_or_else(|| values[0].clone());
        Replacement::Ordered {
            values,
            default,
            cursor: 0,
        }
    }

    /// The value for the next occurrence, advancing the occurrence cursor.
    pub fn next_value(&mut self) -> &str {
        match self {
            Replacement::Fixed(value) => value,
            Replacement::Ordered {
                values,
                default,
                cursor,
            } => {
                if *cursor < values.len() {
                    let value = &values[*cursor];
                    *cursor += 1;
                    value
                } else {
                    default
                }
            }
        }
    }
}
