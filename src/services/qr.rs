/// Decoder seam for the check-in scanner: raw image bytes in, payload out.
/// The concrete decoder is linked at build time; the scanning UI only sees
/// this signature.
pub trait QrDecoder {
    fn decode(&self, image: &[u8]) -> Option<String>;
}

/// Static decoder over the `image` + `rqrr` stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticQrDecoder;

impl QrDecoder for StaticQrDecoder {
    fn decode(&self, image: &[u8]) -> Option<String> {
        decode(image)
    }
}

/// Decode the first QR grid found in an uploaded camera frame.
pub fn decode(image_bytes: &[u8]) -> Option<String> {
    let gray = image::load_from_memory(image_bytes).ok()?.to_luma8();
    let (width, height) = gray.dimensions();

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32)[0]
        });

    let grids = prepared.detect_grids();
    let grid = grids.first()?;
    let (_meta, content) = grid.decode().ok()?;
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_decode_to_none() {
        assert_eq!(decode(&[0u8, 1, 2, 3]), None);
    }

    #[test]
    fn blank_frame_has_no_grid() {
        // A flat grey PNG carries no QR grid; the decoder must not panic.
        let img = image::GrayImage::from_pixel(64, 64, image::Luma([200u8]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        assert_eq!(decode(png.get_ref()), None);
    }
}
