use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CodecError, CodecResult};

/// File magic, written without a terminator.
pub const MAGIC: [u8; 10] = *b"BINARYMESH";
pub const HEADER_LEN: usize = MAGIC.len() + 2;
pub const FILE_EXTENSION: &str = "binarymesh";
/// Name of the single part every document carries.
pub const DEFAULT_PART_NAME: &str = "default";
/// Trailing material slot that unassigned faces resolve to.
pub const FALLBACK_MATERIAL: &str = "default";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub const fn byte_len(self) -> usize {
        match self {
            FloatWidth::F32 => 4,
            FloatWidth::F64 => 8,
        }
    }
}

/// Versions of the binarymesh layout.
///
/// Version 1 stores doubles uncompressed; version 3 wraps the payload in an
/// LZ4 envelope; version 4 additionally narrows floats to 32 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum FormatVersion {
    V1,
    V3,
    V4,
}

impl FormatVersion {
    pub const LATEST: FormatVersion = FormatVersion::V4;

    pub const fn as_u16(self) -> u16 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V3 => 3,
            FormatVersion::V4 => 4,
        }
    }

    pub const fn float_width(self) -> FloatWidth {
        match self {
            FormatVersion::V1 | FormatVersion::V3 => FloatWidth::F64,
            FormatVersion::V4 => FloatWidth::F32,
        }
    }

    pub const fn supports_compression(self) -> bool {
        !matches!(self, FormatVersion::V1)
    }
}

impl TryFrom<u16> for FormatVersion {
    type Error = CodecError;

    fn try_from(value: u16) -> CodecResult<Self> {
        match value {
            1 => Ok(FormatVersion::V1),
            3 => Ok(FormatVersion::V3),
            4 => Ok(FormatVersion::V4),
            other => Err(CodecError::InvalidConfig(format!("unknown format version {other}"))),
        }
    }
}

impl From<FormatVersion> for u16 {
    fn from(version: FormatVersion) -> u16 {
        version.as_u16()
    }
}

/// Per-call encoding options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportConfig {
    pub format_version: FormatVersion,
    pub float_width: FloatWidth,
    pub compression: bool,
    #[serde(default = "default_part_name")]
    pub part_name: String,
}

fn default_part_name() -> String {
    DEFAULT_PART_NAME.to_owned()
}

impl ExportConfig {
    pub fn for_version(format_version: FormatVersion) -> Self {
        Self {
            format_version,
            float_width: format_version.float_width(),
            compression: format_version.supports_compression(),
            part_name: default_part_name(),
        }
    }

    /// Rejects combinations a reader could not tell apart from the header
    /// alone, and part names too long for their length prefix.
    pub fn validate(&self) -> CodecResult<()> {
        let version = self.format_version;
        if self.float_width != version.float_width() {
            return Err(CodecError::InvalidConfig(format!(
                "version {} stores {:?} floats, not {:?}",
                version.as_u16(),
                version.float_width(),
                self.float_width
            )));
        }
        if self.compression != version.supports_compression() {
            return Err(CodecError::InvalidConfig(format!(
                "version {} {} a compressed envelope",
                version.as_u16(),
                if version.supports_compression() { "requires" } else { "does not support" }
            )));
        }
        if self.part_name.len() > usize::from(u16::MAX) {
            return Err(CodecError::NameTooLong {
                name: self.part_name.clone(),
                len: self.part_name.len(),
            });
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::for_version(FormatVersion::LATEST)
    }
}

pub fn has_binarymesh_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_carry_their_float_width() {
        assert_eq!(FormatVersion::V1.float_width().byte_len(), 8);
        assert_eq!(FormatVersion::V3.float_width().byte_len(), 8);
        assert_eq!(FormatVersion::V4.float_width().byte_len(), 4);
        assert!(!FormatVersion::V1.supports_compression());
        assert!(FormatVersion::V3.supports_compression());
    }

    #[test]
    fn unknown_versions_are_rejected() {
        assert!(FormatVersion::try_from(2).is_err());
        assert_eq!(FormatVersion::try_from(4).unwrap(), FormatVersion::V4);
    }

    #[test]
    fn config_for_version_is_valid() {
        for version in [FormatVersion::V1, FormatVersion::V3, FormatVersion::V4] {
            ExportConfig::for_version(version).validate().unwrap();
        }
        assert_eq!(ExportConfig::default().format_version, FormatVersion::V4);
    }

    #[test]
    fn mismatched_config_is_rejected() {
        let mut config = ExportConfig::for_version(FormatVersion::V1);
        config.compression = true;
        assert!(matches!(config.validate(), Err(CodecError::InvalidConfig(_))));

        let mut config = ExportConfig::for_version(FormatVersion::V4);
        config.float_width = FloatWidth::F64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_binarymesh_extension("out/box.binarymesh"));
        assert!(has_binarymesh_extension("BOX.BinaryMesh"));
        assert!(!has_binarymesh_extension("box.obj"));
        assert!(!has_binarymesh_extension("binarymesh"));
    }
}
