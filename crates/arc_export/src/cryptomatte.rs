//! Cryptomatte-compatible EXR export.
//!
//! Channel layout follows the cryptomatte convention: alongside the beauty
//! and AOV channels, each identity group gets one rank of four full-float
//! channels (hash, coverage, two reserved zeros) plus header attributes
//! naming the hash function, the conversion, and a JSON manifest keyed by
//! 8-hex-digit hash mapping to a human-readable name. Only one rank is
//! populated; background pixels carry zero coverage and never enter the
//! manifest.

use crate::hash::{hash_id, id_hash_to_f32, to_hex8};
use crate::ExportError;
use arc_renderer::Framebuffer;
use exr::meta::attribute::{AttributeValue, Text};
use exr::prelude::*;
use half::f16;
use std::collections::BTreeMap;
use std::path::Path;
use std::result::Result;

/// Manifest maps for the object and material groups: hash hex -> name.
pub fn build_manifests(
    framebuffer: &Framebuffer,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let mut objects = BTreeMap::new();
    let mut materials = BTreeMap::new();

    for pixel in framebuffer.iter() {
        if !pixel.hit {
            continue;
        }
        objects
            .entry(to_hex8(hash_id(pixel.object_id)))
            .or_insert_with(|| format!("/object_{}", pixel.object_id));
        materials
            .entry(to_hex8(hash_id(pixel.mat_id)))
            .or_insert_with(|| format!("/material_{}", pixel.mat_id));
    }

    (objects, materials)
}

fn text(value: &str) -> Result<Text, ExportError> {
    Text::new_or_none(value).ok_or_else(|| ExportError::InvalidName(value.to_string()))
}

fn half_channel(name: &str, data: Vec<f16>) -> Result<AnyChannel<FlatSamples>, ExportError> {
    Ok(AnyChannel {
        name: text(name)?,
        sample_data: FlatSamples::F16(data),
        quantize_linearly: false,
        sampling: Vec2(1, 1),
    })
}

fn float_channel(name: &str, data: Vec<f32>) -> Result<AnyChannel<FlatSamples>, ExportError> {
    Ok(AnyChannel {
        name: text(name)?,
        sample_data: FlatSamples::F32(data),
        quantize_linearly: false,
        sampling: Vec2(1, 1),
    })
}

/// Write the framebuffer as a multi-channel EXR with cryptomatte identity
/// groups for objects and materials.
pub fn write_exr(path: &Path, framebuffer: &Framebuffer) -> Result<(), ExportError> {
    let width = framebuffer.width() as usize;
    let height = framebuffer.height() as usize;
    let count = width * height;

    let mut r = Vec::with_capacity(count);
    let mut g = Vec::with_capacity(count);
    let mut b = Vec::with_capacity(count);
    let mut a = Vec::with_capacity(count);

    let mut nx = Vec::with_capacity(count);
    let mut ny = Vec::with_capacity(count);
    let mut nz = Vec::with_capacity(count);
    let mut depth = Vec::with_capacity(count);

    let mut px = Vec::with_capacity(count);
    let mut py = Vec::with_capacity(count);
    let mut pz = Vec::with_capacity(count);
    let mut facing = Vec::with_capacity(count);

    let mut object_hash = Vec::with_capacity(count);
    let mut object_coverage = Vec::with_capacity(count);
    let mut material_hash = Vec::with_capacity(count);
    let mut material_coverage = Vec::with_capacity(count);

    for pixel in framebuffer.iter() {
        r.push(f16::from_f32(pixel.rgb.x));
        g.push(f16::from_f32(pixel.rgb.y));
        b.push(f16::from_f32(pixel.rgb.z));
        a.push(f16::from_f32(if pixel.hit { 1.0 } else { 0.0 }));

        nx.push(f16::from_f32(pixel.normal.x));
        ny.push(f16::from_f32(pixel.normal.y));
        nz.push(f16::from_f32(pixel.normal.z));
        depth.push(f16::from_f32(pixel.depth));

        px.push(f16::from_f32(pixel.p.x));
        py.push(f16::from_f32(pixel.p.y));
        pz.push(f16::from_f32(pixel.p.z));
        facing.push(f16::from_f32(pixel.facing_ratio));

        if pixel.hit {
            object_hash.push(id_hash_to_f32(hash_id(pixel.object_id)));
            object_coverage.push(1.0);
            material_hash.push(id_hash_to_f32(hash_id(pixel.mat_id)));
            material_coverage.push(1.0);
        } else {
            object_hash.push(0.0);
            object_coverage.push(0.0);
            material_hash.push(0.0);
            material_coverage.push(0.0);
        }
    }

    let zeros = vec![0.0f32; count];

    let mut channels = SmallVec::<[AnyChannel<FlatSamples>; 4]>::new();
    channels.push(half_channel("R", r)?);
    channels.push(half_channel("G", g)?);
    channels.push(half_channel("B", b)?);
    channels.push(half_channel("A", a)?);

    channels.push(half_channel("N.red", nx)?);
    channels.push(half_channel("N.green", ny)?);
    channels.push(half_channel("N.blue", nz)?);
    channels.push(half_channel("depth.Z", depth)?);

    channels.push(half_channel("P.x", px)?);
    channels.push(half_channel("P.y", py)?);
    channels.push(half_channel("P.z", pz)?);
    channels.push(half_channel("facing_ratio.r", facing)?);

    channels.push(float_channel("CryptoObject00.R", object_hash)?);
    channels.push(float_channel("CryptoObject00.G", object_coverage)?);
    channels.push(float_channel("CryptoObject00.B", zeros.clone())?);
    channels.push(float_channel("CryptoObject00.A", zeros.clone())?);

    channels.push(float_channel("CryptoMaterial00.R", material_hash)?);
    channels.push(float_channel("CryptoMaterial00.G", material_coverage)?);
    channels.push(float_channel("CryptoMaterial00.B", zeros.clone())?);
    channels.push(float_channel("CryptoMaterial00.A", zeros)?);

    let (object_manifest, material_manifest) = build_manifests(framebuffer);

    let mut attributes = LayerAttributes::default();
    for (group, manifest) in [
        ("CryptoObject", &object_manifest),
        ("CryptoMaterial", &material_manifest),
    ] {
        let manifest_json = serde_json::to_string(manifest)?;
        attributes.other.insert(
            text(&format!("cryptomatte/{group}/manifest"))?,
            AttributeValue::Text(text(&manifest_json)?),
        );
        attributes.other.insert(
            text(&format!("cryptomatte/{group}/hash"))?,
            AttributeValue::Text(text("MurmurHash3_32")?),
        );
        attributes.other.insert(
            text(&format!("cryptomatte/{group}/conversion"))?,
            AttributeValue::Text(text("uint32_to_float32")?),
        );
        attributes.other.insert(
            text(&format!("cryptomatte/{group}/name"))?,
            AttributeValue::Text(text(group)?),
        );
    }

    let layer = Layer::new(
        (width, height),
        attributes,
        Encoding::SMALL_LOSSLESS,
        AnyChannels::sort(channels),
    );

    Image::from_layer(layer).write().to_file(path)?;
    log::info!(
        "wrote EXR {} ({}x{}, {} object ids, {} material ids)",
        path.display(),
        width,
        height,
        object_manifest.len(),
        material_manifest.len()
    );

    Ok(())
}
