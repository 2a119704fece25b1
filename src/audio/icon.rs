//! Icon payload encoding.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// Raw 32-bit RGBA pixels extracted from an executable's icon.
#[derive(Debug, Clone)]
pub struct RawIcon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Encode icon pixels as an inline `data:image/png;base64,` URI.
///
/// Returns `None` when the pixel buffer does not form a valid image;
/// callers degrade to an empty icon rather than failing.
pub fn encode_data_uri(icon: &RawIcon) -> Option<String> {
    let image = image::RgbaImage::from_raw(icon.width, icon.height, icon.rgba.clone())?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .ok()?;
    Some(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(&png)
    ))
}
