use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the failure modes of literal substitution: lookups that come up empty
/// (types, methods, localization keys) and persisted localization tables that violate the
/// key naming convention. Usage-resolution failure is deliberately *not* represented here --
/// it is an expected "unknown" answer modeled as [`Option::None`] by
/// [`crate::analysis::find_consuming_call`].
///
/// Misusing the one-shot [`crate::metadata::TypeIndex`] (reinitializing it, or touching it
/// after teardown) is a programming error, not a recoverable condition, and panics instead
/// of surfacing here.
#[derive(Error, Debug)]
pub enum Error {
    /// No type with the requested short name exists in the module index.
    #[error("No type named '{0}' in the module index")]
    TypeNotFound(String),

    /// No type with the requested full name exists in the module index.
    #[error("No type with full name '{0}' in the module index")]
    TypeFullNameNotFound(String),

    /// The requested method does not exist on the given type.
    #[error("No method '{method}' on type '{type_name}'")]
    MethodNotFound {
        /// Full name of the type that was searched
        type_name: String,
        /// Name of the method that was not found
        method: String,
    },

    /// A localization key was expected to exist in the text provider but does not.
    #[error("Localization key '{0}' does not exist")]
    KeyNotFound(String),

    /// The method has no body to patch (abstract, extern, or stripped).
    #[error("Method '{0}' has no body")]
    NoBody(String),

    /// A persisted localization entry violates the key naming convention.
    ///
    /// The offending key prefix is included so the broken entry can be located in the
    /// host's localization files.
    #[error("Malformed localization entry at '{key}': {message}")]
    MalformedEntry {
        /// Key prefix of the malformed entry (`<method-key>.<i>.`)
        key: String,
        /// What the convention violation was
        message: String,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Other(String),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
