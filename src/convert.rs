use crate::archive::ArchiveEntry;
use crate::constants::WEBP_EXTENSION;
use crate::error::{ConverterError, Result};
use crate::preview::{PreviewHandle, PreviewStore};
use crate::selection::CandidateFile;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::sync::Arc;

/// The output of converting one candidate file to WebP.
///
/// Built once by [`convert_file`] and never mutated afterwards. Dropping the
/// result releases its preview.
#[derive(Debug)]
pub struct ConversionResult {
    source_name: String,
    output_name: String,
    original_size: u64,
    width: u32,
    height: u32,
    payload: Arc<[u8]>,
    preview: PreviewHandle,
}

impl ConversionResult {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn webp_size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// Bytes saved by this file; negative when the WebP output is larger.
    pub fn saved(&self) -> i64 {
        self.original_size as i64 - self.webp_size() as i64
    }

    pub fn archive_entry(&self) -> ArchiveEntry {
        ArchiveEntry::new(self.output_name.clone(), Arc::clone(&self.payload))
    }
}

/// Derives `<base>.webp` from a source file name.
///
/// The base is everything before the first `.`, so `a.b.png` becomes
/// `a.webp`. Names starting with a dot fall back to their stem.
pub fn output_name_for(source_name: &str) -> String {
    let base = match source_name.split('.').next() {
        Some(first) if !first.is_empty() => first,
        _ => source_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(source_name),
    };
    format!("{}.{}", base, WEBP_EXTENSION)
}

/// Decodes raw bytes into an RGBA surface at the image's native size.
pub fn decode_surface(name: &str, bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|source| ConverterError::Decode {
        name: name.to_string(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Encodes a surface as WebP with the encoder's default settings.
pub fn encode_webp(name: &str, surface: &RgbaImage) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    WebPEncoder::new_lossless(&mut payload)
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ConverterError::Encode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    if payload.is_empty() {
        return Err(ConverterError::Encode {
            name: name.to_string(),
            reason: "encoder produced no data".to_string(),
        });
    }
    Ok(payload)
}

/// Converts one candidate file to WebP.
///
/// Suspends on the read, on the decode and on the encode; the CPU-bound
/// steps run on tokio's blocking pool.
pub async fn convert_file(file: &CandidateFile, previews: &PreviewStore) -> Result<ConversionResult> {
    let name = file.name().to_string();
    crate::verbose!("Converting {}", name);

    let bytes = tokio::fs::read(file.path())
        .await
        .map_err(|source| ConverterError::Read {
            name: name.clone(),
            source,
        })?;

    let decode_name = name.clone();
    let surface =
        tokio::task::spawn_blocking(move || decode_surface(&decode_name, &bytes)).await??;
    let (width, height) = surface.dimensions();

    let encode_name = name.clone();
    let payload =
        tokio::task::spawn_blocking(move || encode_webp(&encode_name, &surface)).await??;

    let output_name = output_name_for(&name);
    let store = previews.clone();
    let preview_name = output_name.clone();
    let (payload, preview) = tokio::task::spawn_blocking(move || {
        let preview = store.acquire(&preview_name, &payload);
        (payload, preview)
    })
    .await?;
    let preview = preview.map_err(|source| ConverterError::Preview {
        name: name.clone(),
        source,
    })?;

    crate::verbose!(
        "Converted {} ({}x{}) -> {} ({} bytes)",
        name,
        width,
        height,
        output_name,
        payload.len()
    );

    Ok(ConversionResult {
        source_name: name,
        output_name,
        original_size: file.size(),
        width,
        height,
        payload: Arc::from(payload),
        preview,
    })
}
