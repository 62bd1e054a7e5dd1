//! Hand landmark vocabulary.
//!
//! Landmarks arrive as a flat array of 21 tracked hand joints, each with 2 or
//! 3 coordinates, in the order produced by the upstream hand tracker. Point 0
//! is always the wrist and serves as the coordinate origin for relative
//! normalization (see [`crate::feature`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of tracked hand joints per landmark set.
pub const NUM_LANDMARKS: usize = 21;

/// Names for the hand pose landmarks.
///
/// The discriminant of each variant is the landmark's index in the flat input
/// array.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb, located near the wrist.
/// - **MCP**: Metacarpophalangeal joint, the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Which of the subject's hands a landmark set belongs to.
///
/// The left and right hand are mirror images of each other, so they are
/// classified by two independently trained models. [`Handedness`] selects
/// which one; callers that don't know default to [`Handedness::Right`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrist_is_origin_index() {
        assert_eq!(LandmarkIdx::Wrist as usize, 0);
        assert_eq!(LandmarkIdx::PinkyTip as usize, NUM_LANDMARKS - 1);
    }

    #[test]
    fn handedness_wire_names() {
        assert_eq!(serde_json::to_string(&Handedness::Left).unwrap(), "\"Left\"");
        let h: Handedness = serde_json::from_str("\"Right\"").unwrap();
        assert_eq!(h, Handedness::Right);
    }
}
