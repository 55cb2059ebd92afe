use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::imaging::domain::frame_annotator::{FrameAnnotator, OverlayColors};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Outlines faces with one-pixel rectangles.
///
/// The measured face is drawn last, in its own colour and one pixel thicker,
/// so it stays visible where it overlaps other boxes.
pub struct BoxAnnotator {
    colors: OverlayColors,
}

impl BoxAnnotator {
    pub fn new(colors: OverlayColors) -> Self {
        Self { colors }
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new(OverlayColors::default())
    }
}

fn outline(img: &mut RgbImage, region: &Region, color: [u8; 3], thickness: i32) {
    let Some(clamped) = region.clamp_to(img.width(), img.height()) else {
        return;
    };
    for inset in 0..thickness {
        let w = clamped.width - 2 * inset;
        let h = clamped.height - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(clamped.x + inset, clamped.y + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, rect, Rgb(color));
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[Region],
        measured: Option<&Region>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!(
                "Annotation needs an RGB frame, got {} channels",
                frame.channels()
            )
            .into());
        }
        if frame.is_empty() {
            return Ok(());
        }

        let (width, height) = (frame.width(), frame.height());
        let mut img = RgbImage::from_raw(width, height, frame.data().to_vec())
            .ok_or("Frame data does not match its size")?;

        for face in faces {
            outline(&mut img, face, self.colors.face_box, 1);
        }
        if let Some(face) = measured {
            outline(&mut img, face, self.colors.measured_box, 2);
        }

        frame.data_mut().copy_from_slice(img.as_raw());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(width: u32, height: u32) -> Frame {
        Frame::new(vec![0; (width * height * 3) as usize], width, height, 3)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    #[test]
    fn test_draws_face_outline_only() {
        let mut frame = black(20, 20);
        let face = Region::new(5, 5, 10, 10);
        BoxAnnotator::default()
            .annotate(&mut frame, &[face], None)
            .unwrap();

        assert_eq!(pixel(&frame, 5, 5), [0, 255, 0]);
        assert_eq!(pixel(&frame, 14, 14), [0, 255, 0]);
        assert_eq!(pixel(&frame, 10, 10), [0, 0, 0]);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_measured_face_drawn_over_detection() {
        let mut frame = black(20, 20);
        let face = Region::new(2, 2, 12, 12);
        BoxAnnotator::default()
            .annotate(&mut frame, &[face], Some(&face))
            .unwrap();

        assert_eq!(pixel(&frame, 2, 2), [255, 0, 0]);
        assert_eq!(pixel(&frame, 3, 3), [255, 0, 0]);
        assert_eq!(pixel(&frame, 4, 4), [0, 0, 0]);
    }

    #[test]
    fn test_custom_colors() {
        let colors = OverlayColors {
            face_box: [1, 2, 3],
            measured_box: [4, 5, 6],
        };
        let mut frame = black(10, 10);
        BoxAnnotator::new(colors)
            .annotate(&mut frame, &[Region::new(0, 0, 5, 5)], None)
            .unwrap();
        assert_eq!(pixel(&frame, 0, 0), [1, 2, 3]);
    }

    #[test]
    fn test_region_outside_frame_is_skipped() {
        let mut frame = black(10, 10);
        BoxAnnotator::default()
            .annotate(&mut frame, &[Region::new(50, 50, 5, 5)], None)
            .unwrap();
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_grayscale_frame_rejected() {
        let mut frame = Frame::new(vec![0; 16], 4, 4, 1);
        assert!(BoxAnnotator::default()
            .annotate(&mut frame, &[], None)
            .is_err());
    }
}
