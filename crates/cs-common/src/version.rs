//! Application version parsing, comparison, and checked bumps.
//!
//! A version is an ordered triple `(major, minor, patch)`. Bumping is not a
//! plain computation: the candidate is re-validated against the component
//! change invariant after it is produced, so an arithmetic defect can never
//! silently reach a published release.

use crate::error::{Error, Result};
use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Three-part application version, ordered by component comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which component a bump targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpKind::Major => write!(f, "major"),
            BumpKind::Minor => write!(f, "minor"),
            BumpKind::Patch => write!(f, "patch"),
        }
    }
}

impl Version {
    pub const ZERO: Version = Version {
        major: 0,
        minor: 0,
        patch: 0,
    };

    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version from `M.m.p`.
    ///
    /// Exactly three non-negative integers separated by two dots, with no
    /// surrounding content. Anything looser is rejected: a release version
    /// comes from a manifest this tool wrote, so drift means corruption.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidVersion(text.to_string());

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse::<u32>().map_err(|_| invalid())?;
        }

        Ok(Version::new(nums[0], nums[1], nums[2]))
    }

    /// Bump the targeted component, zeroing all lower components.
    ///
    /// The candidate is checked against the bump invariant before being
    /// returned; a violation is `BumpInvariantViolated`, never a wrong
    /// version.
    pub fn bump(self, kind: BumpKind) -> Result<Version> {
        let overflow = || Error::BumpInvariantViolated {
            from: self.to_string(),
            kind: kind.to_string(),
            candidate: "overflow".to_string(),
        };

        // Checked arithmetic: a wrapped component would otherwise satisfy the
        // invariant check and publish a version that sorts before its parent.
        let candidate = match kind {
            BumpKind::Major => {
                Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            BumpKind::Minor => Version::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            BumpKind::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };

        check_bump(self, kind, candidate)?;
        Ok(candidate)
    }
}

/// Post-condition check for a bump: the targeted component advanced by one
/// and every lower component is exactly zero (unchanged for `patch`).
///
/// Exposed separately so the release pipeline can re-verify a candidate that
/// arrived from anywhere other than [`Version::bump`].
pub fn check_bump(from: Version, kind: BumpKind, candidate: Version) -> Result<()> {
    let ok = match kind {
        BumpKind::Major => {
            from.major.checked_add(1) == Some(candidate.major)
                && candidate.minor == 0
                && candidate.patch == 0
        }
        BumpKind::Minor => {
            candidate.major == from.major
                && from.minor.checked_add(1) == Some(candidate.minor)
                && candidate.patch == 0
        }
        BumpKind::Patch => {
            candidate.major == from.major
                && candidate.minor == from.minor
                && from.patch.checked_add(1) == Some(candidate.patch)
        }
    };

    if ok {
        Ok(())
    } else {
        Err(Error::BumpInvariantViolated {
            from: from.to_string(),
            kind: kind.to_string(),
            candidate: candidate.to_string(),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Version::parse("1.2.7").unwrap(), Version::new(1, 2, 7));
        assert_eq!(Version::parse("0.0.0").unwrap(), Version::ZERO);
        assert_eq!(Version::parse("10.20.30").unwrap(), Version::new(10, 20, 30));
    }

    #[test]
    fn test_parse_invalid() {
        for text in ["", "1.2", "1.2.3.4", "v1.2.3", "1.2.3 ", " 1.2.3", "a.b.c", "1..3", "1.-2.3"] {
            assert!(Version::parse(text).is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Version::new(1, 3, 0) > Version::new(1, 2, 7));
        assert!(Version::new(2, 0, 0) > Version::new(1, 9, 9));
        assert!(Version::new(1, 2, 8) > Version::new(1, 2, 7));
    }

    #[test]
    fn test_bump_minor_then_major() {
        let v = Version::parse("1.2.7").unwrap();
        let v = v.bump(BumpKind::Minor).unwrap();
        assert_eq!(v, Version::new(1, 3, 0));
        let v = v.bump(BumpKind::Major).unwrap();
        assert_eq!(v, Version::new(2, 0, 0));
    }

    #[test]
    fn test_bump_patch_keeps_lower_components() {
        let v = Version::new(1, 2, 7).bump(BumpKind::Patch).unwrap();
        assert_eq!(v, Version::new(1, 2, 8));
    }

    #[test]
    fn test_forced_candidate_fails_invariant_check() {
        // A minor bump of 1.2.7 can only ever be 1.3.0.
        let err = check_bump(
            Version::new(1, 2, 7),
            BumpKind::Minor,
            Version::new(2, 0, 0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::BumpInvariantViolated { .. }));

        // Patch must not reset anything.
        assert!(check_bump(
            Version::new(1, 2, 7),
            BumpKind::Patch,
            Version::new(1, 2, 0),
        )
        .is_err());

        // Major must zero minor and patch.
        assert!(check_bump(
            Version::new(1, 2, 7),
            BumpKind::Major,
            Version::new(2, 2, 7),
        )
        .is_err());
    }

    #[test]
    fn test_bump_at_component_ceiling_is_rejected() {
        // Wrapping would turn 4294967295.x.y into 0.0.0 and pass the check.
        for (version, kind) in [
            (Version::new(u32::MAX, 0, 0), BumpKind::Major),
            (Version::new(1, u32::MAX, 0), BumpKind::Minor),
            (Version::new(1, 2, u32::MAX), BumpKind::Patch),
        ] {
            let err = version.bump(kind).unwrap_err();
            assert!(
                matches!(err, Error::BumpInvariantViolated { .. }),
                "{version} bump {kind} returned {err:?}"
            );
        }
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let v = Version::new(1, 3, 0);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1.3.0\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Version>("\"1.2\"").is_err());
    }
}
