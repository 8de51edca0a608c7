mod common;

use common::{write_fixture, zip_bytes};
use marky::converters::EpubConverter;
use marky::{Converter, Marky, PartFailurePolicy};
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

const PACKAGE: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" version="3.0">
  <metadata>
    <dc:title>Field Notes</dc:title>
    <dc:creator>Ann Lee</dc:creator>
    <dc:creator>Bo Chen</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/missing.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch3" href="text/ch3.xhtml#start" media-type="application/xhtml+xml"/>
    <item id="blank" href="text/blank.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="ch1"/><itemref idref="ch2"/><itemref idref="blank"/><itemref idref="ch3"/></spine>
</package>"#;

fn book(dir: &TempDir, parts: &[(&str, &[u8])]) -> PathBuf {
    write_fixture(dir.path(), "book.epub", &zip_bytes(parts))
}

fn full_book(dir: &TempDir) -> PathBuf {
    book(
        dir,
        &[
            ("mimetype", b"application/epub+zip"),
            ("META-INF/container.xml", CONTAINER.as_bytes()),
            ("OEBPS/content.opf", PACKAGE.as_bytes()),
            (
                "OEBPS/text/ch1.xhtml",
                b"<html><body><p>First chapter text</p></body></html>",
            ),
            ("OEBPS/text/blank.xhtml", b"<html><body></body></html>"),
            (
                "OEBPS/text/ch3.xhtml",
                b"<html><body><p>Third chapter text</p></body></html>",
            ),
        ],
    )
}

#[test]
fn epub_metadata_then_spine_chapters() {
    let dir = tempdir().expect("tempdir");
    let path = full_book(&dir);

    let markdown = Marky::default().convert(&path).expect("convert epub");
    assert!(
        markdown.starts_with("**Title:** Field Notes\n**Authors:** Ann Lee, Bo Chen\n**Language:** en\n\n"),
        "{markdown}"
    );
    let first = markdown.find("First chapter text").expect("chapter 1");
    let third = markdown.find("Third chapter text").expect("chapter 3");
    assert!(first < third);
}

#[test]
fn epub_abort_policy_surfaces_missing_chapter() {
    let dir = tempdir().expect("tempdir");
    let path = full_book(&dir);

    let err = EpubConverter::with_policy(PartFailurePolicy::Abort)
        .load(&path)
        .expect_err("missing chapter");
    assert_eq!(err.code(), "DOCUMENT_STRUCTURE_ERROR");
    assert!(err.to_string().contains("OEBPS/text/missing.xhtml"), "{err}");
}

#[test]
fn epub_without_container_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = book(&dir, &[("OEBPS/content.opf", PACKAGE.as_bytes())]);

    let err = EpubConverter::default().load(&path).expect_err("no container");
    assert_eq!(err.code(), "DOCUMENT_STRUCTURE_ERROR");
}

#[test]
fn epub_container_without_rootfile_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = book(
        &dir,
        &[("META-INF/container.xml", b"<container><rootfiles/></container>")],
    );

    let err = EpubConverter::default().load(&path).expect_err("no rootfile");
    assert!(
        err.to_string().contains("no rootfiles found in container.xml"),
        "{err}"
    );
}
