//! Road attributes shared by location references and map lines.

use std::fmt;

/// Functional road class.  `Frc0` is the most important (motorways),
/// `Frc7` the least.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Frc {
    Frc0 = 0,
    Frc1 = 1,
    Frc2 = 2,
    Frc3 = 3,
    Frc4 = 4,
    Frc5 = 5,
    Frc6 = 6,
    Frc7 = 7,
}

impl Frc {
    pub const ALL: [Frc; 8] = [
        Frc::Frc0, Frc::Frc1, Frc::Frc2, Frc::Frc3,
        Frc::Frc4, Frc::Frc5, Frc::Frc6, Frc::Frc7,
    ];

    /// Map a 3-bit code to its class.  Only the low three bits are used.
    #[inline]
    pub fn from_code(code: u8) -> Frc {
        Self::ALL[(code & 0x07) as usize]
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Frc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FRC{}", self.code())
    }
}

/// Form of way.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Fow {
    Undefined = 0,
    Motorway = 1,
    MultipleCarriageway = 2,
    SingleCarriageway = 3,
    Roundabout = 4,
    TrafficSquare = 5,
    SlipRoad = 6,
    Other = 7,
}

impl Fow {
    pub const ALL: [Fow; 8] = [
        Fow::Undefined, Fow::Motorway, Fow::MultipleCarriageway, Fow::SingleCarriageway,
        Fow::Roundabout, Fow::TrafficSquare, Fow::SlipRoad, Fow::Other,
    ];

    /// Map a 3-bit code to its form of way.  Only the low three bits are used.
    #[inline]
    pub fn from_code(code: u8) -> Fow {
        Self::ALL[(code & 0x07) as usize]
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Fow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
