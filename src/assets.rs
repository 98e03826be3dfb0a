use crate::error::CardError;
use crate::placeholder;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// The three image inputs a card accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Background,
    Portrait,
    Logo,
}

impl ImageSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSlot::Background => "background",
            ImageSlot::Portrait => "portrait",
            ImageSlot::Logo => "logo",
        }
    }

    /// Built-in image used when this slot's asset is missing or undecodable.
    /// The background slot has none.
    pub fn placeholder(&self) -> Option<ImageHandle> {
        match self {
            ImageSlot::Background => None,
            ImageSlot::Portrait => Some(placeholder::portrait()),
            ImageSlot::Logo => Some(placeholder::logo()),
        }
    }
}

/// A decoded raster with known pixel dimensions. Cloning shares the pixels.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pixels: Option<Arc<Pixmap>>,
    width: u32,
    height: u32,
}

impl ImageHandle {
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        let width = pixmap.width();
        let height = pixmap.height();
        Self {
            pixels: Some(Arc::new(pixmap)),
            width,
            height,
        }
    }

    /// A handle whose dimensions are known but whose pixels never decoded.
    /// Never ready; layout treats it exactly like an absent image.
    pub fn undecoded(width: u32, height: u32) -> Self {
        Self {
            pixels: None,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_ready(&self) -> bool {
        self.pixels.is_some() && self.width > 0 && self.height > 0
    }

    /// Width over height, or `None` when not ready.
    pub fn aspect(&self) -> Option<f32> {
        if !self.is_ready() {
            return None;
        }
        Some(self.width as f32 / self.height as f32)
    }

    pub(crate) fn pixmap(&self) -> Option<&Pixmap> {
        self.pixels.as_deref()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CardError> {
        decode_image_to_pixmap(data, None)
            .map(Self::from_pixmap)
            .ok_or_else(|| CardError::Asset(format!("undecodable image ({} bytes)", data.len())))
    }

    /// Accepts a `data:` URI or a filesystem path.
    pub fn load(source: &str) -> Result<Self, CardError> {
        if let Some((mime, data)) = parse_data_uri(source) {
            return decode_image_to_pixmap(&data, Some(&mime))
                .map(Self::from_pixmap)
                .ok_or_else(|| CardError::Asset(format!("undecodable data URI ({mime})")));
        }
        let bytes = std::fs::read(Path::new(source))?;
        Self::decode(&bytes)
    }
}

/// Resolves one slot: the decoded asset when possible, otherwise the slot's
/// placeholder (or `None` for the background).
pub fn resolve_slot(slot: ImageSlot, source: Option<&str>) -> Option<ImageHandle> {
    let Some(source) = source else {
        return slot.placeholder();
    };
    match ImageHandle::load(source) {
        Ok(handle) if handle.is_ready() => Some(handle),
        Ok(_) | Err(_) => {
            if std::env::var("BIOCARD_ASSET_DEBUG").is_ok() {
                eprintln!(
                    "[assets] {} image '{}' unusable, using fallback",
                    slot.as_str(),
                    truncate_source(source)
                );
            }
            slot.placeholder()
        }
    }
}

fn truncate_source(source: &str) -> String {
    const MAX_CHARS: usize = 48;
    if source.chars().count() <= MAX_CHARS {
        return source.to_string();
    }
    let mut out: String = source.chars().take(MAX_CHARS).collect();
    out.push_str("...");
    out
}

pub(crate) fn decode_image_to_pixmap(data: &[u8], mime: Option<&str>) -> Option<Pixmap> {
    let guessed_format = if let Some(mime) = mime {
        if mime.contains("png") {
            Some(image::ImageFormat::Png)
        } else if mime.contains("jpeg") || mime.contains("jpg") {
            Some(image::ImageFormat::Jpeg)
        } else {
            None
        }
    } else {
        image::guess_format(data).ok()
    };

    let decoded = if let Some(fmt) = guessed_format {
        image::load_from_memory_with_format(data, fmt).ok()?
    } else {
        image::load_from_memory(data).ok()?
    };
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    let src = rgba.as_raw();
    let dst = pixmap.data_mut();
    for (src_px, dst_px) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let a = src_px[3];
        dst_px[0] = premul_u8(src_px[0], a);
        dst_px[1] = premul_u8(src_px[1], a);
        dst_px[2] = premul_u8(src_px[2], a);
        dst_px[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    if !uri.starts_with("data:") {
        return None;
    }
    let (header, payload) = uri.split_once(',')?;
    let mime = header
        .trim_start_matches("data:")
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let src = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 128]));
        let mut bytes = Vec::new();
        src.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn parse_data_uri_base64_decodes_payload() {
        let uri = "data:text/plain;base64,SGVsbG8=";
        let (mime, data) = parse_data_uri(uri).unwrap();
        assert_eq!(mime, "text/plain");
        assert_eq!(data, b"Hello");
    }

    #[test]
    fn decode_png_yields_ready_handle_with_premultiplied_pixels() {
        let handle = ImageHandle::decode(&png_bytes(3, 2)).unwrap();
        assert!(handle.is_ready());
        assert_eq!((handle.width(), handle.height()), (3, 2));
        let px = handle.pixmap().unwrap().pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 128);
    }

    #[test]
    fn load_accepts_base64_data_uri() {
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png_bytes(4, 4))
        );
        let handle = ImageHandle::load(&uri).unwrap();
        assert_eq!(handle.aspect(), Some(1.0));
    }

    #[test]
    fn undecoded_handle_is_never_ready() {
        let handle = ImageHandle::undecoded(640, 480);
        assert!(!handle.is_ready());
        assert_eq!(handle.aspect(), None);
    }

    #[test]
    fn garbage_bytes_are_an_asset_error() {
        let err = ImageHandle::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CardError::Asset(_)));
    }

    #[test]
    fn resolve_slot_substitutes_placeholders_but_not_for_background() {
        let missing = "no-such-dir/biocard-missing-photo.png";
        let portrait = resolve_slot(ImageSlot::Portrait, Some(missing)).unwrap();
        assert!(portrait.is_ready());
        assert_eq!((portrait.width(), portrait.height()), (100, 125));
        let logo = resolve_slot(ImageSlot::Logo, None).unwrap();
        assert_eq!((logo.width(), logo.height()), (100, 100));
        assert!(resolve_slot(ImageSlot::Background, Some(missing)).is_none());
        assert!(resolve_slot(ImageSlot::Background, None).is_none());
    }
}
