use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::region::Region;

/// Which detected face a distance reading is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSelection {
    /// The widest box, i.e. the face nearest the camera.
    #[default]
    Widest,
    /// The first box in detector order.
    First,
}

impl FaceSelection {
    pub const ALL: &[FaceSelection] = &[FaceSelection::Widest, FaceSelection::First];
}

impl fmt::Display for FaceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSelection::Widest => write!(f, "widest"),
            FaceSelection::First => write!(f, "first"),
        }
    }
}

impl FromStr for FaceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "widest" => Ok(FaceSelection::Widest),
            "first" => Ok(FaceSelection::First),
            other => Err(format!(
                "Face selection must be 'widest' or 'first', got '{other}'"
            )),
        }
    }
}

/// Faces found in one frame, in detector order.
///
/// Ephemeral: recomputed per frame, with no identity across frames. An empty
/// result is a normal outcome, not an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    regions: Vec<Region>,
}

impl DetectionResult {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Pixel widths of every detected face, in detector order.
    pub fn widths(&self) -> Vec<i32> {
        self.regions.iter().map(|r| r.width).collect()
    }

    /// Picks the face to measure. Ties on width keep the earlier box.
    pub fn select(&self, selection: FaceSelection) -> Option<&Region> {
        match selection {
            FaceSelection::First => self.regions.first(),
            FaceSelection::Widest => self
                .regions
                .iter()
                .reduce(|best, r| if r.width > best.width { r } else { best }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn result() -> DetectionResult {
        DetectionResult::new(vec![
            Region::new(0, 0, 40, 40),
            Region::new(100, 0, 80, 80),
            Region::new(200, 0, 80, 60),
        ])
    }

    #[test]
    fn test_empty_result_selects_nothing() {
        let empty = DetectionResult::default();
        assert!(empty.is_empty());
        assert_eq!(empty.select(FaceSelection::First), None);
        assert_eq!(empty.select(FaceSelection::Widest), None);
    }

    #[test]
    fn test_select_first() {
        assert_eq!(
            result().select(FaceSelection::First),
            Some(&Region::new(0, 0, 40, 40))
        );
    }

    #[test]
    fn test_select_widest_keeps_earliest_on_tie() {
        assert_eq!(
            result().select(FaceSelection::Widest),
            Some(&Region::new(100, 0, 80, 80))
        );
    }

    #[test]
    fn test_widths_in_detector_order() {
        assert_eq!(result().widths(), vec![40, 80, 80]);
    }

    #[rstest]
    #[case("widest", FaceSelection::Widest)]
    #[case("FIRST", FaceSelection::First)]
    fn test_parse_face_selection(#[case] input: &str, #[case] expected: FaceSelection) {
        assert_eq!(input.parse::<FaceSelection>().unwrap(), expected);
    }

    #[test]
    fn test_parse_face_selection_rejects_unknown() {
        assert!("largest".parse::<FaceSelection>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for sel in FaceSelection::ALL {
            assert_eq!(sel.to_string().parse::<FaceSelection>().unwrap(), *sel);
        }
    }
}
