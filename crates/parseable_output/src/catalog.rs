use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Kinds of artifact a driver job consumes or produces.
///
/// Declaration order is the canonical catalog order. On the wire a type is
/// always identified by [`FileType::name`], never by its ordinal, so new
/// kinds can be added without changing the meaning of existing documents.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum FileType {
    Swift,
    Sil,
    Sib,
    Image,
    Object,
    DSym,
    Dependencies,
    Autolink,
    SwiftModule,
    SwiftDoc,
    Assembly,
    RawSil,
    RawSib,
    LlvmIr,
    LlvmBc,
    Diagnostics,
    ObjcHeader,
    SwiftDeps,
    Remapping,
    ImportedModules,
    Pch,
    /// Sentinel for jobs whose primary output is not a file. Never part of
    /// [`FileType::all`].
    #[default]
    Nothing,
}

static CATALOG: [FileType; 21] = [
    FileType::Swift,
    FileType::Sil,
    FileType::Sib,
    FileType::Image,
    FileType::Object,
    FileType::DSym,
    FileType::Dependencies,
    FileType::Autolink,
    FileType::SwiftModule,
    FileType::SwiftDoc,
    FileType::Assembly,
    FileType::RawSil,
    FileType::RawSib,
    FileType::LlvmIr,
    FileType::LlvmBc,
    FileType::Diagnostics,
    FileType::ObjcHeader,
    FileType::SwiftDeps,
    FileType::Remapping,
    FileType::ImportedModules,
    FileType::Pch,
];

impl FileType {
    /// Every real artifact kind in canonical order. `Nothing` is excluded.
    pub fn all() -> impl Iterator<Item = FileType> + Clone {
        CATALOG.iter().copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            FileType::Swift => "swift",
            FileType::Sil => "sil",
            FileType::Sib => "sib",
            FileType::Image => "image",
            FileType::Object => "object",
            FileType::DSym => "dSYM",
            FileType::Dependencies => "dependencies",
            FileType::Autolink => "autolink",
            FileType::SwiftModule => "swiftmodule",
            FileType::SwiftDoc => "swiftdoc",
            FileType::Assembly => "assembly",
            FileType::RawSil => "raw-sil",
            FileType::RawSib => "raw-sib",
            FileType::LlvmIr => "llvm-ir",
            FileType::LlvmBc => "llvm-bc",
            FileType::Diagnostics => "diagnostics",
            FileType::ObjcHeader => "objc-header",
            FileType::SwiftDeps => "swift-dependencies",
            FileType::Remapping => "remap",
            FileType::ImportedModules => "imported-modules",
            FileType::Pch => "pch",
            FileType::Nothing => "nothing",
        }
    }

    /// Conventional file extension, or `None` for in-memory kinds.
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            FileType::Swift => Some("swift"),
            FileType::Sil => Some("sil"),
            FileType::Sib => Some("sib"),
            FileType::Image => Some("out"),
            FileType::Object => Some("o"),
            FileType::DSym => Some("dSYM"),
            FileType::Dependencies => Some("d"),
            FileType::Autolink => Some("autolink"),
            FileType::SwiftModule => Some("swiftmodule"),
            FileType::SwiftDoc => Some("swiftdoc"),
            FileType::Assembly => Some("s"),
            FileType::RawSil | FileType::RawSib | FileType::Nothing => None,
            FileType::LlvmIr => Some("ir"),
            FileType::LlvmBc => Some("bc"),
            FileType::Diagnostics => Some("dia"),
            FileType::ObjcHeader => Some("h"),
            FileType::SwiftDeps => Some("swiftdeps"),
            FileType::Remapping => Some("remap"),
            FileType::ImportedModules => Some("importedmodules"),
            FileType::Pch => Some("pch"),
        }
    }

    /// Position in the catalog. `Nothing` has no position.
    pub fn ordinal(self) -> Option<usize> {
        CATALOG.iter().position(|ty| *ty == self)
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        CATALOG.get(ordinal).copied()
    }

    /// Resolves a wire name, including the `nothing` sentinel.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == FileType::Nothing.name() {
            return Some(FileType::Nothing);
        }
        Self::all().find(|ty| ty.name() == name)
    }

    pub fn is_nothing(self) -> bool {
        self == FileType::Nothing
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for FileType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        FileType::from_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown file type `{name}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_excludes_nothing_and_keeps_declaration_order() {
        let all: Vec<_> = FileType::all().collect();
        assert_eq!(all.len(), 21);
        assert!(!all.contains(&FileType::Nothing));
        assert_eq!(all.first(), Some(&FileType::Swift));
        assert_eq!(all.last(), Some(&FileType::Pch));
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn names_are_unique_and_resolve_back() {
        let mut seen = std::collections::BTreeSet::new();
        for ty in FileType::all() {
            assert!(seen.insert(ty.name()), "duplicate name {}", ty.name());
            assert_eq!(FileType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(FileType::from_name("nothing"), Some(FileType::Nothing));
        assert_eq!(FileType::from_name("invalid"), None);
    }

    #[test]
    fn ordinals_round_trip_within_catalog_only() {
        assert_eq!(FileType::Object.ordinal(), Some(4));
        assert_eq!(FileType::from_ordinal(4), Some(FileType::Object));
        assert_eq!(FileType::Nothing.ordinal(), None);
        assert_eq!(FileType::from_ordinal(21), None);
    }

    #[test]
    fn serializes_by_name() {
        assert_eq!(
            serde_json::to_string(&FileType::SwiftDeps).unwrap(),
            "\"swift-dependencies\""
        );
        let ty: FileType = serde_json::from_str("\"dSYM\"").unwrap();
        assert_eq!(ty, FileType::DSym);
        assert!(serde_json::from_str::<FileType>("\"exe\"").is_err());
    }
}
