//! Rendering error types.

use dentiscope_core::DentiscopeError;
use thiserror::Error;

/// Errors raised while rendering or saving frames.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create GPU adapter")]
    AdapterCreationFailed,

    #[error("failed to create GPU device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    #[error("surface has no supported format")]
    SurfaceConfigurationFailed,

    #[error("surface lost")]
    SurfaceLost,

    #[error("surface outdated")]
    SurfaceOutdated,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("timed out waiting for the GPU")]
    Timeout,

    #[error("failed to read back frame: {0}")]
    BufferMapFailed(String),

    #[error("invalid render target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("pixel buffer does not match {width}x{height}")]
    InvalidImageData { width: u32, height: u32 },

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to save image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(error: wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost => Self::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            wgpu::SurfaceError::Timeout => Self::Timeout,
            _ => Self::SurfaceOutdated,
        }
    }
}

impl From<RenderError> for DentiscopeError {
    fn from(error: RenderError) -> Self {
        match error {
            RenderError::Io(e) => DentiscopeError::Io(e),
            other => DentiscopeError::Render(other.to_string()),
        }
    }
}

/// A specialized Result type for rendering.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
