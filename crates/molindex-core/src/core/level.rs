use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three tiers of the atom → residue → segment hierarchy.
///
/// Every atom belongs to exactly one residue and every residue to exactly one
/// segment. Segments are the terminal level and have no parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// Leaf level; each atom points at its owning residue.
    Atom,
    /// Intermediate level; each residue points at its owning segment.
    Residue,
    /// Top level; owns residues but has no parent itself.
    Segment,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Atom, Level::Residue, Level::Segment];

    /// Returns the level directly above this one, or `None` for segments.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Atom => Some(Level::Residue),
            Level::Residue => Some(Level::Segment),
            Level::Segment => None,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Level::Atom => 0,
            Level::Residue => 1,
            Level::Segment => 2,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid topology level string")]
pub struct ParseLevelError;

impl FromStr for Level {
    type Err = ParseLevelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atom" | "atoms" => Ok(Level::Atom),
            "residue" | "residues" | "res" => Ok(Level::Residue),
            "segment" | "segments" | "seg" => Ok(Level::Segment),
            _ => Err(ParseLevelError),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Level::Atom => "Atom",
                Level::Residue => "Residue",
                Level::Segment => "Segment",
            }
        )
    }
}
