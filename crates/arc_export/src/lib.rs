//! Image export for arclight.
//!
//! Two paths out of a finished [`arc_renderer::Framebuffer`]:
//!
//! - [`write_exr`]: deep multi-channel OpenEXR with half-precision AOVs and
//!   cryptomatte-compatible object/material identity ranks, so compositing
//!   tools can reconstruct per-object mattes from the embedded manifest.
//! - [`write_png`]: plain 8-bit RGB, no identity data.

mod cryptomatte;
mod hash;
mod plain;

pub use cryptomatte::{build_manifests, write_exr};
pub use hash::{hash_id, id_hash_to_f32, murmur3_32, to_hex8};
pub use plain::write_png;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid EXR channel or attribute name: {0}")]
    InvalidName(String),
    #[error("failed to encode cryptomatte manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error(transparent)]
    Exr(#[from] exr::error::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
