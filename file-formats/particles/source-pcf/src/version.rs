//! DMX/PCF format version handling
//!
//! Every PCF file starts with an ASCII header line naming its DMX binary
//! encoding revision and its PCF format revision. Six combinations are
//! recognized; everything else is rejected up front.

use std::fmt;

/// Recognized DMX encoding / PCF format version combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PcfVersion {
    /// Binary encoding 2, generic DMX format 1
    Binary2Dmx1,
    /// Binary encoding 2, PCF format 1
    Binary2Pcf1,
    /// Binary encoding 3, PCF format 1
    Binary3Pcf1,
    /// Binary encoding 3, PCF format 2
    Binary3Pcf2,
    /// Binary encoding 4, PCF format 2
    Binary4Pcf2,
    /// Binary encoding 5, PCF format 2
    Binary5Pcf2,
}

impl PcfVersion {
    /// All recognized versions, in header-marker order
    pub const ALL: [PcfVersion; 6] = [
        PcfVersion::Binary2Dmx1,
        PcfVersion::Binary2Pcf1,
        PcfVersion::Binary3Pcf1,
        PcfVersion::Binary3Pcf2,
        PcfVersion::Binary4Pcf2,
        PcfVersion::Binary5Pcf2,
    ];

    /// The exact ASCII header marker this version is identified by
    ///
    /// On the wire the marker is followed by `\n` and a NUL terminator.
    pub fn header(&self) -> &'static str {
        match self {
            PcfVersion::Binary2Dmx1 => "<!-- dmx encoding binary 2 format dmx 1 -->",
            PcfVersion::Binary2Pcf1 => "<!-- dmx encoding binary 2 format pcf 1 -->",
            PcfVersion::Binary3Pcf1 => "<!-- dmx encoding binary 3 format pcf 1 -->",
            PcfVersion::Binary3Pcf2 => "<!-- dmx encoding binary 3 format pcf 2 -->",
            PcfVersion::Binary4Pcf2 => "<!-- dmx encoding binary 4 format pcf 2 -->",
            PcfVersion::Binary5Pcf2 => "<!-- dmx encoding binary 5 format pcf 2 -->",
        }
    }

    /// Look up a version by its header marker (without the trailing newline)
    pub fn from_header(marker: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.header() == marker)
    }

    /// DMX binary encoding revision (2-5)
    pub fn encoding_revision(&self) -> u8 {
        match self {
            PcfVersion::Binary2Dmx1 | PcfVersion::Binary2Pcf1 => 2,
            PcfVersion::Binary3Pcf1 | PcfVersion::Binary3Pcf2 => 3,
            PcfVersion::Binary4Pcf2 => 4,
            PcfVersion::Binary5Pcf2 => 5,
        }
    }

    /// PCF format revision (1-2), or 1 for the generic DMX profile
    pub fn format_revision(&self) -> u8 {
        match self {
            PcfVersion::Binary2Dmx1
            | PcfVersion::Binary2Pcf1
            | PcfVersion::Binary3Pcf1 => 1,
            PcfVersion::Binary3Pcf2 | PcfVersion::Binary4Pcf2 | PcfVersion::Binary5Pcf2 => 2,
        }
    }

    /// Whether the string dictionary uses 32-bit counts and indices
    ///
    /// Binary encodings 2 and 3 use 16-bit dictionary counts and indices;
    /// encodings 4 and 5 widen both to 32 bits.
    pub fn wide_dictionary(&self) -> bool {
        self.encoding_revision() >= 4
    }
}

impl fmt::Display for PcfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "binary {} / pcf {}",
            self.encoding_revision(),
            self.format_revision()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup() {
        for version in PcfVersion::ALL {
            assert_eq!(PcfVersion::from_header(version.header()), Some(version));
        }
        assert_eq!(
            PcfVersion::from_header("<!-- dmx encoding binary 9 format pcf 9 -->"),
            None
        );
        assert_eq!(PcfVersion::from_header(""), None);
    }

    #[test]
    fn test_dictionary_width() {
        assert!(!PcfVersion::Binary2Pcf1.wide_dictionary());
        assert!(!PcfVersion::Binary3Pcf2.wide_dictionary());
        assert!(PcfVersion::Binary4Pcf2.wide_dictionary());
        assert!(PcfVersion::Binary5Pcf2.wide_dictionary());
    }

    #[test]
    fn test_revisions() {
        assert_eq!(PcfVersion::Binary2Dmx1.encoding_revision(), 2);
        assert_eq!(PcfVersion::Binary5Pcf2.encoding_revision(), 5);
        assert_eq!(PcfVersion::Binary3Pcf1.format_revision(), 1);
        assert_eq!(PcfVersion::Binary3Pcf2.format_revision(), 2);
    }
}
