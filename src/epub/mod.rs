//! EPUB container access: the ZIP archive, `container.xml` and the package
//! document.

mod archive;
mod parser;

pub use archive::{EpubArchive, extension, file_name, parent_dir};
pub use parser::{Manifest, ManifestItem, Package, parse_container_xml, parse_opf, strip_bom};
