//! Resolve a user selection to the model file, anchor object and material set.

use super::material::{required_materials, MaterialSet};
use crate::error::{ImportError, Result};
use crate::pack::rules::{
    BACKHEAD_DIFFUSE, BACKHEAD_NORMAL, BACKHEAD_SPECULAR, BLEND_SHAPES_MODEL, COMPONENTS_MODEL,
    COMPONENTS_NEUTRAL_MODEL, RIGGED_BODY_MODEL,
};
use crate::types::{AdditionalElements, FileRole, PackVariant, Topology};
use std::path::{Path, PathBuf};

/// Anchor object names, one per model authoring convention.
pub const METAHUMAN_ANCHOR: &str = "head_lod0_mesh";
pub const RIGGED_BODY_ANCHOR: &str = "template_fullbody";
pub const COMPONENTS_BLENDSHAPE_ANCHOR: &str = "tmppu_8s3mi";
pub const BLEND_SHAPES_ANCHOR: &str = "input_model";
pub const DEFAULT_ANCHOR: &str = "Mesh";

/// Diffuse, normal and specular texture paths, archive-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePaths {
    pub diffuse: &'static str,
    pub normal: &'static str,
    pub specular: &'static str,
}

impl TexturePaths {
    /// Textures of a variant.
    pub fn for_variant(variant: PackVariant) -> Self {
        Self {
            diffuse: variant.path(FileRole::Diffuse),
            normal: variant.path(FileRole::Normal),
            specular: variant.path(FileRole::Specular),
        }
    }

    /// Textures for the back of the head.
    pub fn backhead() -> Self {
        Self {
            diffuse: BACKHEAD_DIFFUSE,
            normal: BACKHEAD_NORMAL,
            specular: BACKHEAD_SPECULAR,
        }
    }
}

/// Everything an import needs to know about a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelection {
    pub variant: PackVariant,
    /// Elements that take part in the import. Always empty for MetaHuman.
    pub selected: AdditionalElements,
    /// Model file to load, archive-relative.
    pub model_path: &'static str,
    /// Object inside the model file that anchors the import.
    pub anchor_object: &'static str,
    pub textures: TexturePaths,
    pub backhead_textures: Option<TexturePaths>,
    pub materials: MaterialSet,
}

impl ResolvedSelection {
    /// Model path below an extraction root.
    pub fn model_path_in(&self, root: &Path) -> PathBuf {
        root.join(self.model_path)
    }
}

/// Components file shipped for the available elements.
pub fn components_model(available: AdditionalElements) -> &'static str {
    if available.contains(AdditionalElements::BLEND_SHAPES) {
        COMPONENTS_MODEL
    } else {
        COMPONENTS_NEUTRAL_MODEL
    }
}

/// Resolve a selection.
///
/// Default topology picks the model by precedence RiggedBody > Components >
/// BlendShapes > base model. MetaHuman always uses the variant's model.
pub fn resolve_selection(
    variant: PackVariant,
    selected: AdditionalElements,
    available: AdditionalElements,
) -> Result<ResolvedSelection> {
    let textures = TexturePaths::for_variant(variant);

    if variant.topology == Topology::MetaHuman {
        return Ok(ResolvedSelection {
            variant,
            selected: AdditionalElements::empty(),
            model_path: variant.path(FileRole::Model),
            anchor_object: METAHUMAN_ANCHOR,
            textures,
            backhead_textures: None,
            materials: required_materials(variant, AdditionalElements::empty(), available),
        });
    }

    let missing = selected.difference(available);
    if !missing.is_empty() {
        return Err(ImportError::InvalidSelection(format!(
            "{} not available in this pack",
            missing
        )));
    }

    let (model_path, anchor_object) = if selected.contains(AdditionalElements::RIGGED_BODY) {
        if selected.contains(AdditionalElements::COMPONENTS) {
            log::warn!("Rigged body selected with components; using the rigged body model");
        }
        (RIGGED_BODY_MODEL, RIGGED_BODY_ANCHOR)
    } else if selected.contains(AdditionalElements::COMPONENTS) {
        let anchor = if available.contains(AdditionalElements::BLEND_SHAPES) {
            COMPONENTS_BLENDSHAPE_ANCHOR
        } else {
            DEFAULT_ANCHOR
        };
        (components_model(available), anchor)
    } else if selected.contains(AdditionalElements::BLEND_SHAPES) {
        (BLEND_SHAPES_MODEL, BLEND_SHAPES_ANCHOR)
    } else {
        (variant.path(FileRole::Model), DEFAULT_ANCHOR)
    };

    let backhead_textures = selected
        .contains(AdditionalElements::BACK_HEAD_TEXTURE)
        .then(TexturePaths::backhead);

    Ok(ResolvedSelection {
        variant,
        selected,
        model_path,
        anchor_object,
        textures,
        backhead_textures,
        materials: required_materials(variant, selected, available),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::material::MaterialKind;
    use crate::types::TextureResolution;

    const DEFAULT_2K: PackVariant = PackVariant::new(TextureResolution::TwoK, Topology::Default);
    const MH_2K: PackVariant = PackVariant::new(TextureResolution::TwoK, Topology::MetaHuman);

    #[test]
    fn test_base_model_without_selection() {
        let resolved =
            resolve_selection(DEFAULT_2K, AdditionalElements::empty(), AdditionalElements::all())
                .unwrap();
        assert_eq!(resolved.model_path, "USCBasicPack/model.obj");
        assert_eq!(resolved.anchor_object, DEFAULT_ANCHOR);
        assert_eq!(resolved.materials, MaterialSet::from([MaterialKind::Face]));
    }

    #[test]
    fn test_blend_shapes_model() {
        let bs = AdditionalElements::BLEND_SHAPES;
        let resolved = resolve_selection(DEFAULT_2K, bs, bs).unwrap();
        assert_eq!(resolved.model_path, BLEND_SHAPES_MODEL);
        assert_eq!(resolved.anchor_object, BLEND_SHAPES_ANCHOR);
    }

    #[test]
    fn test_rigged_body_wins() {
        let resolved =
            resolve_selection(DEFAULT_2K, AdditionalElements::all(), AdditionalElements::all())
                .unwrap();
        assert_eq!(resolved.model_path, RIGGED_BODY_MODEL);
        assert_eq!(resolved.anchor_object, RIGGED_BODY_ANCHOR);
        assert!(resolved.materials.contains(&MaterialKind::Eye));
        assert!(resolved.materials.contains(&MaterialKind::Backhead));
        assert_eq!(resolved.backhead_textures, Some(TexturePaths::backhead()));
    }

    #[test]
    fn test_components_file_follows_blend_shape_availability() {
        let with_bs = AdditionalElements::COMPONENTS | AdditionalElements::BLEND_SHAPES;
        let resolved =
            resolve_selection(DEFAULT_2K, AdditionalElements::COMPONENTS, with_bs).unwrap();
        assert_eq!(resolved.model_path, COMPONENTS_MODEL);
        assert_eq!(resolved.anchor_object, COMPONENTS_BLENDSHAPE_ANCHOR);

        let resolved = resolve_selection(
            DEFAULT_2K,
            AdditionalElements::COMPONENTS,
            AdditionalElements::COMPONENTS,
        )
        .unwrap();
        assert_eq!(resolved.model_path, COMPONENTS_NEUTRAL_MODEL);
        assert_eq!(resolved.anchor_object, DEFAULT_ANCHOR);
    }

    #[test]
    fn test_unavailable_selection_fails() {
        let result = resolve_selection(
            DEFAULT_2K,
            AdditionalElements::RIGGED_BODY,
            AdditionalElements::BLEND_SHAPES,
        );
        assert!(matches!(result, Err(ImportError::InvalidSelection(_))));
    }

    #[test]
    fn test_metahuman_ignores_selection() {
        let resolved =
            resolve_selection(MH_2K, AdditionalElements::all(), AdditionalElements::empty())
                .unwrap();
        assert_eq!(resolved.model_path, "MHBasicPack/model.obj");
        assert_eq!(resolved.anchor_object, METAHUMAN_ANCHOR);
        assert!(resolved.selected.is_empty());
        assert_eq!(
            resolved.model_path_in(Path::new("/tmp/pack")),
            PathBuf::from("/tmp/pack/MHBasicPack/model.obj")
        );
    }
}
