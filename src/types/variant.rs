//! Pack variant identifiers and their fixed archive layouts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Texture resolution of a pack variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureResolution {
    #[serde(rename = "2k")]
    TwoK,
    #[serde(rename = "4k")]
    FourK,
}

impl TextureResolution {
    /// Both resolutions in order.
    pub const ALL: [TextureResolution; 2] = [TextureResolution::TwoK, TextureResolution::FourK];

    /// Edge length of the textures in pixels.
    pub fn pixels(&self) -> u32 {
        match self {
            TextureResolution::TwoK => 2048,
            TextureResolution::FourK => 4096,
        }
    }

    fn pack_suffix(&self) -> &'static str {
        match self {
            TextureResolution::TwoK => "Basic",
            TextureResolution::FourK => "High",
        }
    }
}

impl fmt::Display for TextureResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureResolution::TwoK => write!(f, "2K"),
            TextureResolution::FourK => write!(f, "4K"),
        }
    }
}

/// Mesh topology of a pack variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    MetaHuman,
    Default,
}

impl Topology {
    /// Both topologies in order.
    pub const ALL: [Topology; 2] = [Topology::MetaHuman, Topology::Default];

    fn pack_prefix(&self) -> &'static str {
        match self {
            Topology::MetaHuman => "MH",
            Topology::Default => "USC",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::MetaHuman => write!(f, "MetaHuman"),
            Topology::Default => write!(f, "Default"),
        }
    }
}

/// The four files every complete variant ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Model,
    Diffuse,
    Normal,
    Specular,
}

impl FileRole {
    pub const ALL: [FileRole; 4] = [
        FileRole::Model,
        FileRole::Diffuse,
        FileRole::Normal,
        FileRole::Specular,
    ];
}

/// A (resolution, topology) pair identifying one complete asset bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackVariant {
    pub resolution: TextureResolution,
    pub topology: Topology,
}

/// Archive paths per variant, in [`FileRole::ALL`] order.
const MH_BASIC_PATHS: [&str; 4] = [
    "MHBasicPack/model.obj",
    "MHBasicPack/texture_diffuse.png",
    "MHBasicPack/texture_normal.png",
    "MHBasicPack/texture_specular.png",
];
const USC_BASIC_PATHS: [&str; 4] = [
    "USCBasicPack/model.obj",
    "USCBasicPack/texture_diffuse.png",
    "USCBasicPack/texture_normal.png",
    "USCBasicPack/texture_specular.png",
];
const MH_HIGH_PATHS: [&str; 4] = [
    "MHHighPack/model.obj",
    "MHHighPack/texture_diffuse.png",
    "MHHighPack/texture_normal.png",
    "MHHighPack/texture_specular.png",
];
const USC_HIGH_PATHS: [&str; 4] = [
    "USCHighPack/model.obj",
    "USCHighPack/texture_diffuse.png",
    "USCHighPack/texture_normal.png",
    "USCHighPack/texture_specular.png",
];

impl PackVariant {
    /// All four variants, resolution-major.
    pub const ALL: [PackVariant; 4] = [
        PackVariant::new(TextureResolution::TwoK, Topology::MetaHuman),
        PackVariant::new(TextureResolution::TwoK, Topology::Default),
        PackVariant::new(TextureResolution::FourK, Topology::MetaHuman),
        PackVariant::new(TextureResolution::FourK, Topology::Default),
    ];

    pub const fn new(resolution: TextureResolution, topology: Topology) -> Self {
        Self { resolution, topology }
    }

    /// Directory name of the variant inside the archive, e.g. `USCBasicPack`.
    pub fn pack_name(&self) -> String {
        format!("{}{}Pack", self.topology.pack_prefix(), self.resolution.pack_suffix())
    }

    /// The four archive paths of this variant, in [`FileRole::ALL`] order.
    pub fn paths(&self) -> &'static [&'static str; 4] {
        match (self.resolution, self.topology) {
            (TextureResolution::TwoK, Topology::MetaHuman) => &MH_BASIC_PATHS,
            (TextureResolution::TwoK, Topology::Default) => &USC_BASIC_PATHS,
            (TextureResolution::FourK, Topology::MetaHuman) => &MH_HIGH_PATHS,
            (TextureResolution::FourK, Topology::Default) => &USC_HIGH_PATHS,
        }
    }

    /// Archive path of one file of this variant.
    pub fn path(&self, role: FileRole) -> &'static str {
        let paths = self.paths();
        match role {
            FileRole::Model => paths[0],
            FileRole::Diffuse => paths[1],
            FileRole::Normal => paths[2],
            FileRole::Specular => paths[3],
        }
    }
}

impl fmt::Display for PackVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resolution, self.topology)
    }
}
