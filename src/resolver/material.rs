//! Material requirements and slot-name classification.

use crate::types::{AdditionalElements, PackVariant, Topology};
use std::collections::BTreeSet;
use std::fmt;

/// Materials the import can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKind {
    Face,
    Backhead,
    Eye,
    Eyelashes,
    Fluid,
    Occlusion,
    Teeth,
    TeethFluid,
}

impl MaterialKind {
    /// Name of the material template and of the bound material prim.
    pub fn name(&self) -> &'static str {
        match self {
            MaterialKind::Face => "Face",
            MaterialKind::Backhead => "Backhead",
            MaterialKind::Eye => "Eye",
            MaterialKind::Eyelashes => "Eyelashes",
            MaterialKind::Fluid => "Fluid",
            MaterialKind::Occlusion => "Occlusion",
            MaterialKind::Teeth => "Teeth",
            MaterialKind::TeethFluid => "TeethFluid",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which eye an eyeball slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeSide {
    Left,
    Right,
}

/// Classification result for one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMaterial {
    pub material: MaterialKind,
    /// Only set for [`MaterialKind::Eye`].
    pub side: Option<EyeSide>,
}

impl SlotMaterial {
    fn plain(material: MaterialKind) -> Self {
        Self { material, side: None }
    }
}

/// Ordered set of material kinds.
pub type MaterialSet = BTreeSet<MaterialKind>;

pub const DEFAULT_MATERIALS: [MaterialKind; 1] = [MaterialKind::Face];
pub const BACKHEAD_MATERIALS: [MaterialKind; 1] = [MaterialKind::Backhead];
pub const COMPONENT_MATERIALS: [MaterialKind; 6] = [
    MaterialKind::Eye,
    MaterialKind::Eyelashes,
    MaterialKind::Fluid,
    MaterialKind::Occlusion,
    MaterialKind::Teeth,
    MaterialKind::TeethFluid,
];

/// Materials an import needs for a selection.
///
/// Both [`resolve_selection`](super::resolve_selection) and [`classify_slot`] use this.
pub fn required_materials(
    variant: PackVariant,
    selected: AdditionalElements,
    available: AdditionalElements,
) -> MaterialSet {
    let mut materials: MaterialSet = DEFAULT_MATERIALS.into_iter().collect();
    if variant.topology == Topology::MetaHuman {
        return materials;
    }

    if selected.contains(AdditionalElements::BACK_HEAD_TEXTURE) {
        materials.extend(BACKHEAD_MATERIALS);
    }
    let rigged_with_components = selected.contains(AdditionalElements::RIGGED_BODY)
        && available.contains(AdditionalElements::COMPONENTS);
    if selected.contains(AdditionalElements::COMPONENTS) || rigged_with_components {
        materials.extend(COMPONENT_MATERIALS);
    }
    materials
}

struct SlotRule {
    patterns: &'static [&'static str],
    requires: AdditionalElements,
    material: MaterialKind,
}

/// Substring rules for Default-topology slots. First match wins.
const SLOT_RULES: [SlotRule; 8] = [
    SlotRule {
        patterns: &["M_EyeLashes"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::Eyelashes,
    },
    SlotRule {
        patterns: &["teeth_fluid"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::TeethFluid,
    },
    SlotRule {
        patterns: &["Occ"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::Occlusion,
    },
    SlotRule {
        patterns: &["left_eyeball", "right_eyeball"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::Eye,
    },
    SlotRule {
        patterns: &["teeth"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::Teeth,
    },
    SlotRule {
        patterns: &["Fluid"],
        requires: AdditionalElements::COMPONENTS,
        material: MaterialKind::Fluid,
    },
    SlotRule {
        patterns: &["face", "M_Face"],
        requires: AdditionalElements::empty(),
        material: MaterialKind::Face,
    },
    SlotRule {
        patterns: &["back", "M_BackHead"],
        requires: AdditionalElements::BACK_HEAD_TEXTURE,
        material: MaterialKind::Backhead,
    },
];

/// Decide which material a slot of the imported model receives.
///
/// A rule applies when its substring occurs in `slot_name`, the pack has the elements
/// it depends on, and its material is part of [`required_materials`]. `None` leaves the
/// slot unbound.
pub fn classify_slot(
    slot_name: &str,
    variant: PackVariant,
    selected: AdditionalElements,
    available: AdditionalElements,
) -> Option<SlotMaterial> {
    if variant.topology == Topology::MetaHuman {
        return Some(SlotMaterial::plain(MaterialKind::Face));
    }

    let required = required_materials(variant, selected, available);
    let rule = SLOT_RULES.iter().find(|rule| {
        required.contains(&rule.material)
            && available.contains(rule.requires)
            && rule.patterns.iter().any(|p| slot_name.contains(p))
    })?;

    let side = match rule.material {
        MaterialKind::Eye if slot_name.contains("left_eyeball") => Some(EyeSide::Left),
        MaterialKind::Eye if slot_name.contains("right_eyeball") => Some(EyeSide::Right),
        _ => None,
    };
    Some(SlotMaterial {
        material: rule.material,
        side,
    })
}
