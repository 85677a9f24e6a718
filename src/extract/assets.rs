//! Materialization of chapter images into a local asset directory.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::epub::{EpubArchive, extension, parent_dir};
use crate::error::Result;

use super::ImageResolver;

/// URI scheme of rebased image references.
pub const ASSET_SCHEME: &str = "seedasset://";

/// Local file name for an archive entry: 16 hex digits of SHA-1 over the
/// entry path, plus the entry's lower-cased extension or `.bin`.
///
/// ```
/// use epubseed::extract::asset_file_name;
///
/// let name = asset_file_name("OEBPS/images/Fig1.PNG");
/// assert_eq!(name.len(), 20);
/// assert!(name.ends_with(".png"));
/// assert!(asset_file_name("OEBPS/images/raw").ends_with(".bin"));
/// ```
pub fn asset_file_name(archive_path: &str) -> String {
    let digest = sha1_smol::Sha1::from(archive_path.as_bytes()).digest().to_string();
    let ext = extension(archive_path).unwrap_or_else(|| ".bin".to_string());
    format!("{}{}", &digest[..16], ext)
}

/// Per-run image cache backed by a directory.
///
/// Each archive entry is written at most once; later references reuse the
/// memoized file name.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    /// Archive entry path -> local file name.
    cache: HashMap<String, String>,
}

impl AssetStore {
    /// Store writing into `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    /// Remove `root` if it exists and create it empty.
    pub fn recreate(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct archive entries materialized so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve an `<img src>` found in `chapter_path` to an output URI.
    ///
    /// `data:`, `http://` and `https://` sources are returned unchanged.
    /// Returns `Ok(None)` for empty sources and for sources that do not
    /// resolve to an archive entry.
    pub fn resolve_image<R: Read + Seek>(
        &mut self,
        archive: &mut EpubArchive<R>,
        chapter_path: &str,
        raw_src: &str,
    ) -> Result<Option<String>> {
        let src = raw_src.trim();
        if src.is_empty() {
            return Ok(None);
        }
        if src.starts_with("data:") || src.starts_with("http://") || src.starts_with("https://") {
            return Ok(Some(src.to_string()));
        }

        let Some(entry) = archive.resolve(parent_dir(chapter_path), src) else {
            log::debug!("unresolved image {src:?} in {chapter_path}");
            return Ok(None);
        };

        if let Some(name) = self.cache.get(&entry) {
            return Ok(Some(format!("{ASSET_SCHEME}{name}")));
        }

        let name = asset_file_name(&entry);
        let local = self.root.join(&name);
        if !local.exists() {
            let data = archive.read(&entry)?;
            fs::create_dir_all(&self.root)?;
            fs::write(&local, data)?;
        }

        let uri = format!("{ASSET_SCHEME}{name}");
        self.cache.insert(entry, name);
        Ok(Some(uri))
    }

    /// Bind the store to one chapter for block extraction.
    pub fn for_chapter<'a, R: Read + Seek>(
        &'a mut self,
        archive: &'a mut EpubArchive<R>,
        chapter_path: &'a str,
    ) -> ChapterImages<'a, R> {
        ChapterImages {
            store: self,
            archive,
            chapter_path,
        }
    }
}

/// [`ImageResolver`] for images referenced from a single chapter.
pub struct ChapterImages<'a, R> {
    store: &'a mut AssetStore,
    archive: &'a mut EpubArchive<R>,
    chapter_path: &'a str,
}

impl<R: Read + Seek> ImageResolver for ChapterImages<'_, R> {
    fn resolve(&mut self, src: &str) -> Result<Option<String>> {
        self.store.resolve_image(self.archive, self.chapter_path, src)
    }
}
