//! Box overlays for the raw-frame detection path.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use roadsign_core::detection::DetectionBox;

use crate::frame::PixelArray;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Copy `frame` to RGB and outline every box in green.
///
/// Boxes carry normalized coordinates and are scaled back to the frame size.
pub fn annotate(frame: &PixelArray, boxes: &[DetectionBox]) -> RgbImage {
    let mut canvas = frame.to_rgb_image();
    let (w, h) = (f64::from(frame.width()), f64::from(frame.height()));

    for b in boxes {
        let x = (b.bbox_x * w).round() as i32;
        let y = (b.bbox_y * h).round() as i32;
        let width = ((b.bbox_width * w).round() as u32).max(1);
        let height = ((b.bbox_height * h).round() as u32).max(1);

        for inset in 0..BOX_THICKNESS {
            let (iw, ih) = (width.saturating_sub(2 * inset), height.saturating_sub(2 * inset));
            if iw == 0 || ih == 0 {
                break;
            }
            let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(iw, ih);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }

    canvas
}

/// Encode an image as a `data:image/png;base64,...` URI.
pub fn to_png_data_uri(image: &RgbImage) -> Result<String, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use roadsign_core::geometry::NormalizedBox;

    use super::*;

    #[test]
    fn outlines_box_edges_and_leaves_interior() {
        let frame = PixelArray::from_raw(10, 10, 3, vec![0; 300]).unwrap();
        let b = DetectionBox::new(
            "Stop",
            0.9,
            NormalizedBox { x: 0.2, y: 0.2, width: 0.6, height: 0.6 },
        );

        let out = annotate(&frame, &[b]);
        assert_eq!(out.get_pixel(2, 2), &BOX_COLOR);
        assert_eq!(out.get_pixel(3, 3), &BOX_COLOR);
        assert_eq!(out.get_pixel(7, 7), &BOX_COLOR);
        assert_eq!(out.get_pixel(5, 5), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn png_data_uri_round_trips_through_decoder() {
        let image = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let uri = to_png_data_uri(&image).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let frame = crate::frame::decode(&uri).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.rgb_at(0, 0), [1, 2, 3]);
    }
}
