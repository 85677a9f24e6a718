//! Record files, JSONL and compat reconciliation.

mod common;

use std::fs;

use common::{EpubBuilder, paragraph, xhtml};
use epubseed::export::{
    self, CompatOptions, OutputOptions, compat_jsonl, to_json_array_string, to_jsonl_string,
};
use epubseed::{AssetStore, BookRecord, ChapterRecord, ConvertOptions, Converter};
use proptest::prelude::*;
use tempfile::TempDir;

fn sample_conversion(dir: &TempDir) -> epubseed::Conversion {
    let epub = EpubBuilder::new()
        .title("\u{56da}\u{5f92}\u{5065}\u{8eab}")
        .item("cover", "images/cover.png", "image/png", "cover-image")
        .file("OEBPS/images/cover.png", b"PNG".to_vec())
        .chapter("c1", "c1.xhtml", xhtml("\u{7b2c}\u{4e00}\u{7ae0}\u{b7}\u{5e8f}", &paragraph(100)))
        .chapter("c2", "c2.xhtml", xhtml("Two", &paragraph(120)));
    let mut converter = Converter::from_reader(epub.cursor()).unwrap();
    let mut assets = AssetStore::new(dir.path().join("assets"));
    converter.convert(&ConvertOptions::new("qiutu"), &mut assets).unwrap()
}

#[test]
fn test_records_round_trip_through_json() {
    let dir = TempDir::new().unwrap();
    let conversion = sample_conversion(&dir);

    let books_json = to_json_array_string(std::slice::from_ref(&conversion.book)).unwrap();
    let books: Vec<BookRecord> = serde_json::from_str(&books_json).unwrap();
    assert_eq!(books, vec![conversion.book.clone()]);

    let chapters_jsonl = to_jsonl_string(&conversion.chapters).unwrap();
    let chapters: Vec<ChapterRecord> = chapters_jsonl
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(chapters, conversion.chapters);
}

#[test]
fn test_write_conversion_files() {
    let dir = TempDir::new().unwrap();
    let conversion = sample_conversion(&dir);
    let out = dir.path().join("out");

    let options = OutputOptions::default().with_compat(true);
    let written = export::write_conversion(&out, &conversion, &options).unwrap();
    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "books.json",
            "book_chapters.json",
            "books.jsonl",
            "book_chapters.jsonl",
            "books.compat.jsonl",
            "book_chapters.compat.jsonl",
        ]
    );

    let books_json = fs::read_to_string(out.join("books.json")).unwrap();
    assert!(books_json.contains("\"title\": \"\u{56da}\u{5f92}\u{5065}\u{8eab}\""));
    assert!(!books_json.ends_with('\n'));

    let compat = fs::read_to_string(out.join("book_chapters.compat.jsonl")).unwrap();
    assert!(compat.is_ascii());
    assert!(compat.starts_with(r#"{"bookId":"qiutu","chapterNo":1,"chapterTitle":"\u7b2c\u4e00\u7ae0-\u5e8f","#));
    assert_eq!(compat.lines().count(), 2);

    let plain = fs::read_to_string(out.join("book_chapters.jsonl")).unwrap();
    assert!(plain.contains("\u{7b2c}\u{4e00}\u{7ae0}\u{b7}\u{5e8f}"));
}

#[test]
fn test_json_only_by_default() {
    let dir = TempDir::new().unwrap();
    let conversion = sample_conversion(&dir);
    let out = dir.path().join("out");

    let written = export::write_conversion(&out, &conversion, &OutputOptions::default()).unwrap();
    assert_eq!(written.len(), 2);
    assert!(!out.join("books.jsonl").exists());
}

#[test]
fn test_write_cover() {
    let dir = TempDir::new().unwrap();
    let conversion = sample_conversion(&dir);
    let cover = conversion.cover.as_ref().unwrap();

    let path = export::write_cover(dir.path(), "qiutu", cover).unwrap();
    assert_eq!(path.file_name().unwrap(), "qiutu-cover.png");
    assert_eq!(fs::read(&path).unwrap(), b"PNG");
}

#[test]
fn test_directory_stages() {
    let dir = TempDir::new().unwrap();
    let conversion = sample_conversion(&dir);
    let data = dir.path().join("data");
    export::write_conversion(&data, &conversion, &OutputOptions::default()).unwrap();

    export::json_to_jsonl(&data).unwrap();
    let jsonl = fs::read_to_string(data.join("book_chapters.jsonl")).unwrap();
    assert_eq!(jsonl, to_jsonl_string(&conversion.chapters).unwrap());

    export::compat_dir(&data, &CompatOptions::default()).unwrap();
    let compat = fs::read_to_string(data.join("book_chapters.compat.jsonl")).unwrap();

    let seed = dir.path().join("seed");
    let written = export::seed_dir(&data, &seed, "qiutu").unwrap();
    assert_eq!(written[0], seed.join("books.qiutu.json"));

    let chapters: Vec<ChapterRecord> =
        serde_json::from_str(&fs::read_to_string(seed.join("book_chapters.qiutu.json")).unwrap()).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].chapter_title, "\u{7b2c}\u{4e00}\u{7ae0}-\u{5e8f}");
    assert_eq!(chapters[1], conversion.chapters[1]);

    // Re-running the compat stage on compat output changes nothing.
    fs::copy(data.join("book_chapters.compat.jsonl"), data.join("book_chapters.jsonl")).unwrap();
    export::compat_dir(&data, &CompatOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(data.join("book_chapters.compat.jsonl")).unwrap(), compat);
}

#[test]
fn test_missing_stage_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(export::compat_dir(dir.path(), &CompatOptions::default()).is_err());
    assert!(export::json_to_jsonl(dir.path()).is_err());
}

proptest! {
    #[test]
    fn prop_compat_is_idempotent(
        title in "\\PC{0,24}",
        content in "\\PC{0,64}",
        word_count in 0usize..100_000,
    ) {
        let chapter = ChapterRecord {
            book_id: "b".to_string(),
            chapter_no: 1,
            chapter_title: title,
            content_html: content,
            word_count,
            image_count: Some(0),
        };
        let jsonl = to_jsonl_string(&[chapter]).unwrap();

        let once = compat_jsonl(&jsonl, &CompatOptions::default()).unwrap();
        let twice = compat_jsonl(&once, &CompatOptions::default()).unwrap();
        prop_assert!(once.is_ascii());
        prop_assert_eq!(once, twice);
    }
}
