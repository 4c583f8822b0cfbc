//! End-to-end pack handling: open, extract, select and resolve.

use chatavatar_import::{
    classify_slot, generate_mtl_files, load_pack, AdditionalElements, ImportError, MaterialKind,
    PackVariant, TextureResolution, Topology, UnpackMode,
};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

const DEFAULT_2K: PackVariant = PackVariant::new(TextureResolution::TwoK, Topology::Default);
const MH_2K: PackVariant = PackVariant::new(TextureResolution::TwoK, Topology::MetaHuman);

fn variant_files(dir: &str) -> Vec<(String, String)> {
    ["model.obj", "texture_diffuse.png", "texture_normal.png", "texture_specular.png"]
        .iter()
        .map(|file| {
            let contents = if *file == "model.obj" {
                "mtllib model.mtl\no Mesh\nusemtl M_Face\nf 1 2 3\n".to_string()
            } else {
                "png".to_string()
            };
            (format!("{}/{}", dir, file), contents)
        })
        .collect()
}

fn write_pack(dir: &Path, name: &str, entries: &[(String, String)]) -> PathBuf {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default();
        for (entry, data) in entries {
            zip.start_file(entry.as_str(), options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    let path = dir.join(name);
    fs::write(&path, buf).unwrap();
    path
}

fn extra(entry: &str) -> (String, String) {
    (entry.to_string(), "data".to_string())
}

#[test]
fn test_blend_shape_pack() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = variant_files("USCBasicPack");
    entries.push(extra("USCBasicPack/additional_blendshape.fbx"));
    entries.push(("prompt.txt".to_string(), "A smiling\u{a0}face\n".to_string()));
    let path = write_pack(dir.path(), "smile.zip", &entries);

    let pack = load_pack(&path, UnpackMode::Temp).unwrap();
    assert_eq!(pack.pack_name, "smile");
    assert_eq!(pack.available_variants, vec![DEFAULT_2K]);
    assert_eq!(pack.additional, AdditionalElements::BLEND_SHAPES);
    assert_eq!(pack.prompt, "A smiling face");

    let selection = pack
        .resolve(DEFAULT_2K, AdditionalElements::BLEND_SHAPES)
        .unwrap();
    assert_eq!(selection.model_path, "USCBasicPack/additional_blendshape.fbx");
    assert_eq!(selection.anchor_object, "input_model");
    assert!(selection.model_path_in(&pack.root).is_file());
    assert_eq!(
        selection.materials.iter().copied().collect::<Vec<_>>(),
        vec![MaterialKind::Face]
    );

    assert!(matches!(
        pack.resolve(DEFAULT_2K, AdditionalElements::COMPONENTS),
        Err(ImportError::InvalidSelection(_))
    ));
    assert!(matches!(
        pack.resolve(MH_2K, AdditionalElements::empty()),
        Err(ImportError::InvalidSelection(_))
    ));
}

#[test]
fn test_full_pack_rigged_body_with_components() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = variant_files("USCBasicPack");
    entries.extend(variant_files("MHBasicPack"));
    entries.extend(variant_files("USCHighPack"));
    for entry in [
        "USCBasicPack/additional_body.fbx",
        "USCBasicPack/additional_component.fbx",
        "USCBasicPack/additional_blendshape.fbx",
        "USCBasicPack/texture_diffuse_backhead.png",
        "USCBasicPack/texture_normal_backhead.png",
        "USCBasicPack/texture_specular_backhead.png",
    ] {
        entries.push(extra(entry));
    }
    let path = write_pack(dir.path(), "full.zip", &entries);

    let pack = load_pack(&path, UnpackMode::Temp).unwrap();
    assert_eq!(pack.available_variants.len(), 3);
    assert_eq!(pack.additional, AdditionalElements::all());

    let selected = AdditionalElements::RIGGED_BODY | AdditionalElements::BACK_HEAD_TEXTURE;
    let selection = pack.resolve(DEFAULT_2K, selected).unwrap();
    assert_eq!(selection.model_path, "USCBasicPack/additional_body.fbx");
    assert_eq!(selection.anchor_object, "template_fullbody");
    assert!(selection.backhead_textures.is_some());
    assert!(selection.materials.contains(&MaterialKind::Eye));
    assert!(selection.materials.contains(&MaterialKind::Backhead));

    let slot = classify_slot("M_BackHead_geo", DEFAULT_2K, selected, pack.additional);
    assert_eq!(slot.map(|s| s.material), Some(MaterialKind::Backhead));
    let slot = classify_slot("left_eyeball_geo", DEFAULT_2K, selected, pack.additional);
    assert_eq!(slot.map(|s| s.material), Some(MaterialKind::Eye));

    // MetaHuman ignores optional elements entirely.
    let metahuman = pack.resolve(MH_2K, AdditionalElements::COMPONENTS).unwrap();
    assert_eq!(metahuman.anchor_object, "head_lod0_mesh");
    assert!(metahuman.selected.is_empty());
}

#[test]
fn test_selection_state_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = variant_files("USCBasicPack");
    entries.extend(variant_files("MHBasicPack"));
    entries.push(extra("USCBasicPack/additional_component_neutral.obj"));
    let path = write_pack(dir.path(), "state.zip", &entries);
    let pack = load_pack(&path, UnpackMode::Temp).unwrap();

    let mut state = pack.selection_state();
    assert!(!state.can_confirm());
    assert!(state.resolution_enabled(TextureResolution::TwoK));
    assert!(!state.resolution_enabled(TextureResolution::FourK));

    state.select_resolution(TextureResolution::TwoK).unwrap();
    state.select_topology(Topology::Default).unwrap();
    assert!(state.part_enabled(AdditionalElements::COMPONENTS));
    assert!(!state.part_enabled(AdditionalElements::RIGGED_BODY));
    state.toggle_part(AdditionalElements::COMPONENTS).unwrap();

    let selection = state.confirm().unwrap();
    assert_eq!(selection.model_path, "USCBasicPack/additional_component_neutral.obj");
    assert_eq!(selection.anchor_object, "Mesh");
}

#[test]
fn test_local_extraction_keeps_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "avatar.zip", &variant_files("USCBasicPack"));

    let existing = dir.path().join("avatar/USCBasicPack");
    fs::create_dir_all(&existing).unwrap();
    fs::write(existing.join("texture_diffuse.png"), "edited").unwrap();

    let pack = load_pack(&path, UnpackMode::Local).unwrap();
    assert_eq!(pack.root, dir.path().join("avatar"));
    assert_eq!(
        fs::read_to_string(existing.join("texture_diffuse.png")).unwrap(),
        "edited"
    );
    assert!(existing.join("model.obj").is_file());

    let created = generate_mtl_files(existing.join("model.obj")).unwrap();
    assert_eq!(created, vec![existing.join("model.mtl")]);
    assert_eq!(
        fs::read_to_string(existing.join("model.mtl")).unwrap().trim(),
        "newmtl M_Face"
    );
}

#[test]
fn test_conflicting_destination_moves_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "avatar.zip", &variant_files("USCBasicPack"));
    fs::write(dir.path().join("avatar"), "not a directory").unwrap();

    let pack = load_pack(&path, UnpackMode::Local).unwrap();
    assert_ne!(pack.root, dir.path().join("avatar"));
    assert_eq!(pack.root.parent(), Some(dir.path()));
    assert!(pack.path("USCBasicPack/model.obj").is_file());
    assert_eq!(
        fs::read_to_string(dir.path().join("avatar")).unwrap(),
        "not a directory"
    );
}

#[test]
fn test_file_blocking_variant_directory_moves_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pack(dir.path(), "avatar.zip", &variant_files("USCBasicPack"));
    let existing = dir.path().join("avatar");
    fs::create_dir_all(&existing).unwrap();
    fs::write(existing.join("USCBasicPack"), "not a directory").unwrap();

    let pack = load_pack(&path, UnpackMode::Local).unwrap();
    assert_ne!(pack.root, existing);
    assert_eq!(pack.root.parent(), Some(dir.path()));
    assert!(pack.path("USCBasicPack/model.obj").is_file());
    assert_eq!(
        fs::read_to_string(existing.join("USCBasicPack")).unwrap(),
        "not a directory"
    );
}
