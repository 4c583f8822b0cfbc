//! Opening and unpacking pack archives.

use super::extract::extract;
use super::rules::{additional_elements, list_packs, EntryList};
use crate::error::{ImportError, Result};
use crate::resolver::{resolve_selection, ResolvedSelection, SelectionState};
use crate::types::{AdditionalElements, PackVariant};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Archive entry holding the generation prompt.
pub const PROMPT_ENTRY: &str = "prompt.txt";

/// Archive entry holding the preview image.
pub const PREVIEW_IMAGE_ENTRY: &str = "image.png";

/// Where an archive is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnpackMode {
    /// A temporary directory removed when the pack is dropped.
    #[default]
    Temp,
    /// A directory named after the pack, next to the archive.
    Local,
}

/// An extracted pack and what it offers.
#[derive(Debug)]
pub struct UnpackedPack {
    pub pack_name: String,
    /// Root the archive was actually extracted to.
    pub root: PathBuf,
    pub entries: Vec<String>,
    pub prompt: String,
    pub preview_image: PathBuf,
    pub available_variants: Vec<PackVariant>,
    pub additional: AdditionalElements,
    // Removed recursively on drop, exactly once.
    temp_dir: Option<TempDir>,
}

impl UnpackedPack {
    /// Open a pack archive and extract it.
    pub fn open<P: AsRef<Path>>(path: P, mode: UnpackMode) -> Result<Self> {
        let path = path.as_ref();
        let pack_name = pack_name(path);

        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            ImportError::InvalidArchive(format!("{}: {}", path.display(), e))
        })?;
        let entries: Vec<String> = archive.file_names().map(String::from).collect();

        let entry_list = EntryList::new(&entries);
        let available_variants = list_packs(&entry_list);
        if available_variants.is_empty() {
            return Err(ImportError::InvalidArchive(format!(
                "{}: no complete pack variant",
                path.display()
            )));
        }
        let additional = additional_elements(&entry_list);

        let (temp_dir, destination) = match mode {
            UnpackMode::Temp => {
                let temp_dir = TempDir::new()?;
                let destination = temp_dir.path().join(&pack_name);
                (Some(temp_dir), destination)
            }
            UnpackMode::Local => {
                let parent = path.parent().unwrap_or_else(|| Path::new("."));
                (None, parent.join(&pack_name))
            }
        };

        let root = extract(&mut archive, &destination)?;
        log::info!("Extracted {} to {:?}", path.display(), root);

        let prompt = if entry_list.contains(PROMPT_ENTRY) {
            clean_prompt(&fs::read_to_string(root.join(PROMPT_ENTRY))?)
        } else {
            String::new()
        };
        let preview_image = root.join(PREVIEW_IMAGE_ENTRY);

        Ok(Self {
            pack_name,
            root,
            entries,
            prompt,
            preview_image,
            available_variants,
            additional,
            temp_dir,
        })
    }

    /// Whether the pack is extracted into a temporary directory.
    pub fn is_temporary(&self) -> bool {
        self.temp_dir.is_some()
    }

    /// Absolute path of an archive-relative entry.
    pub fn path(&self, entry: &str) -> PathBuf {
        self.root.join(entry)
    }

    /// Resolve a selection against this pack's availability.
    pub fn resolve(
        &self,
        variant: PackVariant,
        selected: AdditionalElements,
    ) -> Result<ResolvedSelection> {
        if !self.available_variants.contains(&variant) {
            return Err(ImportError::InvalidSelection(format!(
                "{} is not in pack {}",
                variant, self.pack_name
            )));
        }
        resolve_selection(variant, selected, self.additional)
    }

    /// Fresh selection state over this pack.
    pub fn selection_state(&self) -> SelectionState {
        SelectionState::new(&self.available_variants, self.additional)
    }
}

/// Pack name: the archive file name without its `.zip` suffix.
pub fn pack_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(".zip") {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}

fn clean_prompt(raw: &str) -> String {
    raw.trim().replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::extract::tests::build_zip;
    use crate::types::{TextureResolution, Topology};

    const DEFAULT_2K_FILES: [(&str, &str); 4] = [
        ("USCBasicPack/model.obj", "o Mesh\n"),
        ("USCBasicPack/texture_diffuse.png", "png"),
        ("USCBasicPack/texture_normal.png", "png"),
        ("USCBasicPack/texture_specular.png", "png"),
    ];

    fn write_pack(dir: &Path, name: &str, extra: &[(&str, &str)]) -> PathBuf {
        let mut entries = DEFAULT_2K_FILES.to_vec();
        entries.extend_from_slice(extra);
        let path = dir.join(name);
        fs::write(&path, build_zip(&entries)).unwrap();
        path
    }

    #[test]
    fn test_pack_name() {
        assert_eq!(pack_name(Path::new("/a/b/avatar.zip")), "avatar");
        assert_eq!(pack_name(Path::new("my.zip.pack.zip")), "my.zip.pack");
        assert_eq!(pack_name(Path::new("plain")), "plain");
    }

    #[test]
    fn test_open_temp_pack() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(
            dir.path(),
            "avatar.zip",
            &[("prompt.txt", "  a\u{a0}smiling face \n")],
        );

        let pack = UnpackedPack::open(&path, UnpackMode::Temp).unwrap();
        assert_eq!(pack.pack_name, "avatar");
        assert_eq!(pack.prompt, "a smiling face");
        assert!(pack.is_temporary());
        assert_eq!(
            pack.available_variants,
            vec![PackVariant::new(TextureResolution::TwoK, Topology::Default)]
        );
        assert!(pack.additional.is_empty());
        assert!(pack.path("USCBasicPack/model.obj").is_file());
        assert_eq!(pack.preview_image, pack.root.join("image.png"));

        let root = pack.root.clone();
        drop(pack);
        assert!(!root.exists());
    }

    #[test]
    fn test_open_local_pack() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(
            dir.path(),
            "avatar.zip",
            &[("USCBasicPack/additional_blendshape.fbx", "fbx")],
        );

        let pack = UnpackedPack::open(&path, UnpackMode::Local).unwrap();
        assert_eq!(pack.root, dir.path().join("avatar"));
        assert_eq!(pack.prompt, "");
        assert_eq!(pack.additional, AdditionalElements::BLEND_SHAPES);
        drop(pack);
        assert!(dir.path().join("avatar/USCBasicPack/model.obj").is_file());
    }

    #[test]
    fn test_archive_without_variant_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        fs::write(&path, build_zip(&[("readme.txt", "hi")])).unwrap();
        let result = UnpackedPack::open(&path, UnpackMode::Temp);
        assert!(matches!(result, Err(ImportError::InvalidArchive(_))));
    }

    #[test]
    fn test_not_a_zip_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        fs::write(&path, "definitely not a zip").unwrap();
        let result = UnpackedPack::open(&path, UnpackMode::Temp);
        assert!(matches!(result, Err(ImportError::InvalidArchive(_))));
    }

    #[test]
    fn test_resolve_rejects_missing_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pack(dir.path(), "avatar.zip", &[]);
        let pack = UnpackedPack::open(&path, UnpackMode::Temp).unwrap();

        let missing = PackVariant::new(TextureResolution::FourK, Topology::Default);
        assert!(matches!(
            pack.resolve(missing, AdditionalElements::empty()),
            Err(ImportError::InvalidSelection(_))
        ));

        let present = PackVariant::new(TextureResolution::TwoK, Topology::Default);
        let resolved = pack.resolve(present, AdditionalElements::empty()).unwrap();
        assert_eq!(resolved.model_path, "USCBasicPack/model.obj");
        assert!(pack.selection_state().resolution_enabled(TextureResolution::TwoK));
    }
}
