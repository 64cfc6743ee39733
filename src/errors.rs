//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! Fatal conditions (invalid handles, oversubscribed buffers, out-of-bounds
//! pass indices) panic; recoverable conditions (shader compilation, asset
//! decoding) surface as [`KestrelError`] values and a log line, and the
//! caller decides whether to substitute a default or abort.

use thiserror::Error;

/// The main error type for the Kestrel engine.
#[derive(Error, Debug)]
pub enum KestrelError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// Shader compilation or link failure.
    #[error("Shader error in '{name}': {message}")]
    ShaderError {
        /// Debug name of the failing shader
        name: String,
        /// Compiler output
        message: String,
    },

    // ========================================================================
    // Asset & Resource Errors
    // ========================================================================
    /// The requested resource was not found in its group.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A binary resource payload failed to decode.
    #[error("NBR decode error: {0}")]
    NbrDecodeError(String),

    /// A skeleton or animation failed validation.
    #[error("Animation data error: {0}")]
    AnimationDataError(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Alias for `Result<T, KestrelError>`.
pub type Result<T> = std::result::Result<T, KestrelError>;
