//! Error types for overrider-driver.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while loading files or running a tweak.
#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
    /// Failed to read or write a file.
    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(overrider::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse `overrider.toml`.
    #[error("failed to parse config {}", path.display())]
    #[diagnostic(code(overrider::config))]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The file does not have a C++ extension.
    #[error("not a C++ source file: {}", .0.display())]
    #[diagnostic(
        code(overrider::not_cpp),
        help("accepted extensions: .cpp .cc .cxx .c++ .h .hh .hpp .hxx")
    )]
    NotCpp(PathBuf),

    /// The frontend could not index the file at all.
    #[error("failed to index {}: {message}", path.display())]
    #[diagnostic(code(overrider::index))]
    Index { path: PathBuf, message: String },

    /// A source id that was never loaded into this driver.
    #[error("source {0} is not loaded")]
    UnknownSource(u32),

    /// No class with this name is defined in the file.
    #[error("no class named `{class}` in {}", path.display())]
    #[diagnostic(code(overrider::unknown_class))]
    UnknownClass { class: String, path: PathBuf },

    /// Selection offset past the end of the file.
    #[error("offset {offset} is out of range (file is {len} bytes)")]
    #[diagnostic(code(overrider::offset))]
    OffsetOutOfRange { offset: u32, len: u32 },

    /// No tweak registered under this id.
    #[error("unknown tweak `{0}`")]
    #[diagnostic(code(overrider::unknown_tweak))]
    UnknownTweak(String),

    /// The tweak is not available on the selection.
    #[error("{tweak} is not applicable to {target}")]
    #[diagnostic(
        code(overrider::not_applicable),
        help("the class must derive from an abstract class and leave some pure virtual method unimplemented")
    )]
    NotApplicable { tweak: String, target: String },
}
