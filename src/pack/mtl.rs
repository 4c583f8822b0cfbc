//! Placeholder material libraries for OBJ models.
//!
//! Pack OBJ files reference `mtllib` files that the archives do not ship. Scene
//! importers need them to create material slots, so empty `newmtl` stubs are written
//! next to the model.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Write every missing material library referenced by an OBJ file.
///
/// Each library gets one `newmtl` line per material used while it was active.
/// Existing files are left untouched. Returns the files created.
pub fn generate_mtl_files<P: AsRef<Path>>(model_path: P) -> Result<Vec<PathBuf>> {
    let model_path = model_path.as_ref();
    let source = fs::read_to_string(model_path)?;
    let base = model_path.parent().unwrap_or_else(|| Path::new("."));

    let mut created = Vec::new();
    for (library, materials) in material_libraries(&source) {
        let library_path = base.join(&library);
        if library_path.exists() {
            continue;
        }
        let mut contents = String::new();
        for material in &materials {
            contents.push_str("newmtl ");
            contents.push_str(material);
            contents.push('\n');
        }
        fs::write(&library_path, contents)?;
        log::debug!("Created material stub {:?}", library_path);
        created.push(library_path);
    }
    Ok(created)
}

/// Libraries in order of first use, each with its materials in order of first use.
fn material_libraries(source: &str) -> Vec<(String, Vec<String>)> {
    let mut libraries: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<&str> = None;

    for line in source.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("mtllib") => current = tokens.next(),
            Some("usemtl") => {
                let (Some(library), Some(material)) = (current, tokens.next()) else {
                    continue;
                };
                let index = match libraries.iter().position(|(name, _)| name == library) {
                    Some(index) => index,
                    None => {
                        libraries.push((library.to_string(), Vec::new()));
                        libraries.len() - 1
                    }
                };
                let materials = &mut libraries[index].1;
                if !materials.iter().any(|m| m == material) {
                    materials.push(material.to_string());
                }
            }
            _ => {}
        }
    }
    libraries
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJ: &str = "\
mtllib model.mtl
o Mesh
v 0 0 0
usemtl M_Face
f 1 1 1
usemtl M_BackHead
f 1 1 1
usemtl M_Face
mtllib extra.mtl
usemtl teeth
";

    #[test]
    fn test_material_libraries() {
        let libraries = material_libraries(OBJ);
        assert_eq!(
            libraries,
            vec![
                (
                    "model.mtl".to_string(),
                    vec!["M_Face".to_string(), "M_BackHead".to_string()]
                ),
                ("extra.mtl".to_string(), vec!["teeth".to_string()]),
            ]
        );
    }

    #[test]
    fn test_usemtl_without_library_is_ignored() {
        assert!(material_libraries("usemtl orphan\n").is_empty());
    }

    #[test]
    fn test_generate_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.obj");
        fs::write(&model, OBJ).unwrap();
        fs::write(dir.path().join("extra.mtl"), "keep me").unwrap();

        let created = generate_mtl_files(&model).unwrap();
        assert_eq!(created, vec![dir.path().join("model.mtl")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("model.mtl")).unwrap(),
            "newmtl M_Face\nnewmtl M_BackHead\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("extra.mtl")).unwrap(),
            "keep me"
        );

        assert!(generate_mtl_files(&model).unwrap().is_empty());
    }
}
