use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The engine version that wrote a [CompressedMesh](crate::CompressedMesh).
/// The version determines which optional channels are serialized.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl FormatVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Bind poses moved out of the compressed mesh in version 5.
    pub fn has_bind_poses(&self) -> bool {
        self.major < 5
    }

    /// Float colors replaced byte colors in version 5.
    pub fn has_float_colors(&self) -> bool {
        self.major >= 5
    }

    /// Byte colors are only present for versions 3.5 up to but not including 5.
    pub fn has_colors(&self) -> bool {
        *self >= Self::new(3, 5, 0) && self.major < 5
    }

    /// The UV info bitfield replaces byte colors in version 5.
    pub fn has_uv_info(&self) -> bool {
        self.major >= 5
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Errors while parsing a [FormatVersion] from a string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Failed to parse {0:?} as a version. Expected a string like \"2019.4.3f1\".")]
pub struct ParseVersionError(pub String);

impl FromStr for FormatVersion {
    type Err = ParseVersionError;

    /// Parses versions like `"5.6.1"` or `"2019.4.3f1"`.
    /// Any release type and build suffix after the patch number is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseVersionError(s.to_string());

        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(error)?;

        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| error())?,
            None => 0,
        };

        let patch = match parts.next() {
            Some(p) => {
                let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().map_err(|_| error())?
            }
            None => 0,
        };

        if parts.next().is_some() {
            return Err(error());
        }

        Ok(Self::new(major, minor, patch))
    }
}
