use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// A ZIP-backed EPUB archive with its entry list cached in enumeration order.
pub struct EpubArchive<R> {
    zip: ZipArchive<R>,
    /// Entry names in central-directory order.
    names: Vec<String>,
}

impl EpubArchive<File> {
    /// Open an EPUB file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;

        let mut names = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let file = zip.by_index(i)?;
            names.push(file.name().to_string());
        }

        Ok(Self { zip, names })
    }

    /// Entry names in archive enumeration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.iter().any(|name| name == path)
    }

    /// Read an entry by its exact name.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = match self.zip.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(Error::UnresolvableReference(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read `META-INF/container.xml`.
    pub fn read_container(&mut self) -> Result<Vec<u8>> {
        match self.read(CONTAINER_PATH) {
            Err(Error::UnresolvableReference(_)) => Err(Error::MissingRootfile),
            other => other,
        }
    }

    /// Map an href relative to `base` onto an entry name that exists in the
    /// archive.
    ///
    /// The naive join `base/href` wins when present. Otherwise the first entry
    /// (in archive order) whose file name matches, which equals the href, or
    /// which ends with the joined path is returned. Fragments and queries are
    /// ignored.
    pub fn resolve(&self, base: &str, href: &str) -> Option<String> {
        let href = strip_fragment(href);
        if href.is_empty() {
            return None;
        }

        let joined = join_path(base, href);
        if self.contains(&joined) {
            return Some(joined);
        }

        if let Ok(decoded) = percent_encoding::percent_decode_str(&joined).decode_utf8()
            && decoded != joined.as_str()
            && self.contains(&decoded)
        {
            return Some(decoded.into_owned());
        }

        let file_suffix = format!("/{}", file_name(href));
        let joined_suffix = format!("/{}", joined);
        self.names
            .iter()
            .find(|name| {
                name.ends_with(&file_suffix) || name.as_str() == href || name.ends_with(&joined_suffix)
            })
            .cloned()
    }

    /// Resolve `href` against `base` and read the entry.
    pub fn read_href(&mut self, base: &str, href: &str) -> Result<(String, Vec<u8>)> {
        let path = self
            .resolve(base, href)
            .ok_or_else(|| Error::UnresolvableReference(href.to_string()))?;
        let data = self.read(&path)?;
        Ok((path, data))
    }
}

/// Directory part of an archive path (`"OEBPS/content.opf"` -> `"OEBPS"`).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Last path component (`"../images/fig1.jpg"` -> `"fig1.jpg"`).
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lower-cased extension including the dot, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(i) if i > 0 && i + 1 < name.len() => Some(name[i..].to_ascii_lowercase()),
        _ => None,
    }
}

fn join_path(base: &str, href: &str) -> String {
    if base.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", base, href)
    }
}

fn strip_fragment(href: &str) -> &str {
    let end = href.find(['#', '?']).unwrap_or(href.len());
    href[..end].trim()
}
