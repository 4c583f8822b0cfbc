//! Declarative existence rules over archive entry lists.

use crate::types::{AdditionalElements, PackVariant};
use std::collections::HashSet;

/// A conjunction of OR-groups over archive paths.
///
/// The rule holds when every group has at least one member present in the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRule {
    pub groups: &'static [&'static [&'static str]],
}

impl FileRule {
    pub const fn new(groups: &'static [&'static [&'static str]]) -> Self {
        Self { groups }
    }

    /// Evaluate the rule against an entry list.
    pub fn matches(&self, entries: &EntryList<'_>) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|path| entries.contains(path)))
    }
}

/// Archive paths of the optional elements. All live in the 2K Default directory.
pub const BACKHEAD_DIFFUSE: &str = "USCBasicPack/texture_diffuse_backhead.png";
pub const BACKHEAD_NORMAL: &str = "USCBasicPack/texture_normal_backhead.png";
pub const BACKHEAD_SPECULAR: &str = "USCBasicPack/texture_specular_backhead.png";
pub const RIGGED_BODY_MODEL: &str = "USCBasicPack/additional_body.fbx";
pub const COMPONENTS_MODEL: &str = "USCBasicPack/additional_component.fbx";
/// Components baked without blend shapes.
pub const COMPONENTS_NEUTRAL_MODEL: &str = "USCBasicPack/additional_component_neutral.obj";
pub const BLEND_SHAPES_MODEL: &str = "USCBasicPack/additional_blendshape.fbx";

pub const BACK_HEAD_TEXTURE_RULE: FileRule = FileRule::new(&[
    &[BACKHEAD_DIFFUSE],
    &[BACKHEAD_NORMAL],
    &[BACKHEAD_SPECULAR],
]);
pub const RIGGED_BODY_RULE: FileRule = FileRule::new(&[&[RIGGED_BODY_MODEL]]);
pub const COMPONENTS_RULE: FileRule =
    FileRule::new(&[&[COMPONENTS_MODEL, COMPONENTS_NEUTRAL_MODEL]]);
pub const BLEND_SHAPES_RULE: FileRule = FileRule::new(&[&[BLEND_SHAPES_MODEL]]);

/// Each optional element and the rule gating it.
pub const ELEMENT_RULES: [(AdditionalElements, FileRule); 4] = [
    (AdditionalElements::RIGGED_BODY, RIGGED_BODY_RULE),
    (AdditionalElements::COMPONENTS, COMPONENTS_RULE),
    (AdditionalElements::BLEND_SHAPES, BLEND_SHAPES_RULE),
    (AdditionalElements::BACK_HEAD_TEXTURE, BACK_HEAD_TEXTURE_RULE),
];

/// Exact-match lookup set over archive entry names.
#[derive(Debug, Clone, Default)]
pub struct EntryList<'a> {
    names: HashSet<&'a str>,
}

impl<'a> EntryList<'a> {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a S>,
        S: AsRef<str> + 'a + ?Sized,
    {
        Self {
            names: entries.into_iter().map(|s| s.as_ref()).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(path)
    }
}

/// Variants whose four files are all present, in [`PackVariant::ALL`] order.
pub fn list_packs(entries: &EntryList<'_>) -> Vec<PackVariant> {
    PackVariant::ALL
        .into_iter()
        .filter(|variant| variant.paths().iter().all(|path| entries.contains(path)))
        .collect()
}

/// Optional elements whose rules hold for the entry list.
pub fn additional_elements(entries: &EntryList<'_>) -> AdditionalElements {
    ELEMENT_RULES
        .iter()
        .filter(|(_, rule)| rule.matches(entries))
        .fold(AdditionalElements::empty(), |acc, (flag, _)| acc | *flag)
}
