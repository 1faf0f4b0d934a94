//! Packet flag bitset

use serde::{Deserialize, Serialize};

/// Coding type of the frame carried by a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameType {
    /// Coding type not known or not applicable
    #[default]
    Unknown,
    /// Intra-coded frame
    I,
    /// Predicted frame
    P,
    /// Bidirectionally predicted frame
    B,
}

impl FrameType {
    /// Single-letter label used when dumping packets
    pub fn label(self) -> &'static str {
        match self {
            FrameType::Unknown => "?",
            FrameType::I => "I",
            FrameType::P => "P",
            FrameType::B => "B",
        }
    }
}

const TYPE_MASK: u32 = 0x3;
const NO_OUTPUT: u32 = 1 << 2;
const REFERENCE: u32 = 1 << 3;

/// Packet flag bitset: coding type in the low bits, behavior flags above
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketFlags(u32);

impl PacketFlags {
    /// Empty flag set (unknown frame type, no behavior flags)
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct from raw bits
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Coding type of the packet's frame
    pub fn frame_type(self) -> FrameType {
        match self.0 & TYPE_MASK {
            1 => FrameType::I,
            2 => FrameType::P,
            3 => FrameType::B,
            _ => FrameType::Unknown,
        }
    }

    /// Set the coding type
    pub fn set_frame_type(&mut self, t: FrameType) {
        let bits = match t {
            FrameType::Unknown => 0,
            FrameType::I => 1,
            FrameType::P => 2,
            FrameType::B => 3,
        };
        self.0 = (self.0 & !TYPE_MASK) | bits;
    }

    /// Whether the decoded frame must not be presented
    pub fn no_output(self) -> bool {
        self.0 & NO_OUTPUT != 0
    }

    /// Set the no-output flag
    pub fn set_no_output(&mut self, on: bool) {
        if on {
            self.0 |= NO_OUTPUT;
        } else {
            self.0 &= !NO_OUTPUT;
        }
    }

    /// Whether the frame is used as a reference by later frames
    pub fn is_reference(self) -> bool {
        self.0 & REFERENCE != 0
    }

    /// Set the reference flag
    pub fn set_reference(&mut self, on: bool) {
        if on {
            self.0 |= REFERENCE;
        } else {
            self.0 &= !REFERENCE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_round_trip() {
        for t in [FrameType::Unknown, FrameType::I, FrameType::P, FrameType::B] {
            let mut flags = PacketFlags::new();
            flags.set_frame_type(t);
            assert_eq!(flags.frame_type(), t);
        }
    }

    #[test]
    fn test_behavior_flags_independent_of_type() {
        let mut flags = PacketFlags::new();
        flags.set_frame_type(FrameType::B);
        flags.set_no_output(true);
        flags.set_reference(true);
        assert_eq!(flags.frame_type(), FrameType::B);
        assert!(flags.no_output());
        assert!(flags.is_reference());

        flags.set_no_output(false);
        assert!(!flags.no_output());
        assert!(flags.is_reference());
        assert_eq!(flags.frame_type(), FrameType::B);
    }

    #[test]
    fn test_bits_round_trip() {
        let mut flags = PacketFlags::new();
        flags.set_frame_type(FrameType::I);
        flags.set_reference(true);
        let restored = PacketFlags::from_bits(flags.bits());
        assert_eq!(restored, flags);
    }
}
