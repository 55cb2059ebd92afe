/// An axis-aligned face bounding box in image pixel coordinates.
///
/// `(x, y)` is the top-left corner. Width and height are in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clips the region to a `frame_w x frame_h` image.
    ///
    /// Returns `None` when nothing of the region lies inside the image.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + self.width).min(frame_w as i32);
        let y2 = (self.y + self.height).min(frame_h as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Region::new(10, 10, 20, 20), Some(Region::new(10, 10, 20, 20)))]
    #[case(Region::new(-5, -5, 20, 20), Some(Region::new(0, 0, 15, 15)))]
    #[case(Region::new(90, 40, 20, 20), Some(Region::new(90, 40, 10, 10)))]
    #[case(Region::new(200, 200, 20, 20), None)]
    fn test_clamp_to(#[case] region: Region, #[case] expected: Option<Region>) {
        assert_eq!(region.clamp_to(100, 50), expected);
    }
}

