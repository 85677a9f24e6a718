//! In-memory EPUB fixtures.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builds small EPUB archives entry by entry.
///
/// Entries are written in the order they are added, after `mimetype`,
/// `META-INF/container.xml` and the package document.
pub struct EpubBuilder {
    opf_path: String,
    title: String,
    metadata: String,
    container: Option<String>,
    manifest: Vec<String>,
    spine: Vec<String>,
    files: Vec<(String, Vec<u8>)>,
}

impl Default for EpubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self {
            opf_path: "OEBPS/content.opf".to_string(),
            title: "Test Book".to_string(),
            metadata: String::new(),
            container: None,
            manifest: Vec::new(),
            spine: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn opf_path(mut self, path: &str) -> Self {
        self.opf_path = path.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Extra raw XML inside `<metadata>`.
    pub fn metadata(mut self, xml: &str) -> Self {
        self.metadata.push_str(xml);
        self
    }

    /// Replace `META-INF/container.xml` with raw XML.
    pub fn container(mut self, xml: &str) -> Self {
        self.container = Some(xml.to_string());
        self
    }

    /// A manifest item without a spine entry or file.
    pub fn item(mut self, id: &str, href: &str, media_type: &str, properties: &str) -> Self {
        let properties = if properties.is_empty() {
            String::new()
        } else {
            format!(" properties=\"{properties}\"")
        };
        self.manifest.push(format!(
            "<item id=\"{id}\" href=\"{href}\" media-type=\"{media_type}\"{properties}/>"
        ));
        self
    }

    pub fn spine(mut self, idref: &str) -> Self {
        self.spine.push(format!("<itemref idref=\"{idref}\"/>"));
        self
    }

    /// A raw archive entry at an absolute archive path.
    pub fn file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), data.into()));
        self
    }

    /// An XHTML document: manifest item, spine entry and file next to the
    /// package document.
    pub fn chapter(self, id: &str, href: &str, html: impl Into<Vec<u8>>) -> Self {
        let path = self.package_relative(href);
        self.item(id, href, "application/xhtml+xml", "")
            .spine(id)
            .file(&path, html)
    }

    fn package_relative(&self, href: &str) -> String {
        match self.opf_path.rfind('/') {
            Some(i) => format!("{}/{}", &self.opf_path[..i], href),
            None => href.to_string(),
        }
    }

    pub fn opf(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:test</dc:identifier>
    <dc:title>{}</dc:title>
    {}
  </metadata>
  <manifest>
    {}
  </manifest>
  <spine>
    {}
  </spine>
</package>"#,
            self.title,
            self.metadata,
            self.manifest.join("\n    "),
            self.spine.join("\n    ")
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let container = self.container.clone().unwrap_or_else(|| container_xml(&self.opf_path));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        zip.start_file("mimetype", options.compression_method(zip::CompressionMethod::Stored))
            .unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(container.as_bytes()).unwrap();

        zip.start_file(self.opf_path.as_str(), options).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();

        for (path, data) in &self.files {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn cursor(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.build())
    }

    /// Write the archive to `dir/name` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

pub fn container_xml(opf_path: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{opf_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
    )
}

/// A complete XHTML document around `body`.
pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title><style>p {{ margin: 0 }}</style></head>
<body>{body}</body>
</html>"#
    )
}

/// A paragraph of exactly `chars` characters of text.
pub fn paragraph(chars: usize) -> String {
    let text: String = "abcdefghij".chars().cycle().take(chars).collect();
    format!("<p>{text}</p>")
}
