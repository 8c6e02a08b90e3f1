//! # Photometric bands
//!
//! The six LSST filters `u, g, r, i, z, y`. Every [`ObjectSummaryRecord`](crate::ssobject::ObjectSummaryRecord)
//! carries one [`BandSummary`](crate::ssobject::BandSummary) per band, in the fixed order given by
//! [`Band::ALL`], even when a band has no observation.
//!
//! Each band also owns one bit of the record's `flags` bitmask, set when a phase-curve fit was
//! attempted in that band and failed (see [`Band::flag`]).

use std::fmt;
use std::str::FromStr;

use crate::ssp_errors::SspError;

/// One of the six photometric filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
    Y,
}

impl Band {
    /// All bands, in record order.
    pub const ALL: [Band; 6] = [Band::U, Band::G, Band::R, Band::I, Band::Z, Band::Y];

    /// Number of bands in a record.
    pub const COUNT: usize = 6;

    /// Position of the band inside [`Band::ALL`] and inside a record.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Single-character filter name.
    pub fn as_char(self) -> char {
        match self {
            Band::U => 'u',
            Band::G => 'g',
            Band::R => 'r',
            Band::I => 'i',
            Band::Z => 'z',
            Band::Y => 'y',
        }
    }

    /// Photometric fit-failure bit for this band.
    #[inline]
    pub fn flag(self) -> u64 {
        1 << self.index()
    }
}

impl TryFrom<char> for Band {
    type Error = SspError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'u' => Ok(Band::U),
            'g' => Ok(Band::G),
            'r' => Ok(Band::R),
            'i' => Ok(Band::I),
            'z' => Ok(Band::Z),
            'y' => Ok(Band::Y),
            other => Err(SspError::UnknownBand(other.to_string())),
        }
    }
}

impl FromStr for Band {
    type Err = SspError;

    /// Parse a band label such as `"r"`. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Band::try_from(c),
            _ => Err(SspError::UnknownBand(s.to_string())),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
