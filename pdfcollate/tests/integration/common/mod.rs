//! Shared helpers for the integration tests.
//!
//! Fixtures are generated on the fly: every page carries a `/Marker` string
//! so the order of pages in a merged document can be checked.

#![allow(dead_code)]

use lopdf::{Document, Object, dictionary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use pdfcollate::Config;
use pdfcollate::collate::{Collator, PairingStateMachine};
use pdfcollate::io::PdfReader;
use pdfcollate::merge::InterleavingMerger;

/// Source and destination directories for one test.
pub struct Workspace {
    _dir: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = dir.path().join("files");
        let destination = dir.path().join("output");
        std::fs::create_dir_all(&source).expect("Failed to create source dir");

        Self {
            _dir: dir,
            source,
            destination,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            source_dir: self.source.clone(),
            destination_dir: self.destination.clone(),
            collate_timeout: Duration::from_secs(600),
            output_name_suffix: "-collated".to_string(),
            delete_old_files: true,
        }
    }

    /// Write a PDF with one page per marker into the source directory.
    pub fn scan(&self, name: &str, markers: &[&str]) -> PathBuf {
        let path = self.source.join(name);
        write_marked_pdf(&path, markers);
        path
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.destination.join(name)
    }
}

/// A collator backed by the real reader and merger.
pub fn collator(config: Config) -> Collator<PdfReader, InterleavingMerger> {
    Collator::new(PairingStateMachine::new(
        config,
        PdfReader::new(),
        InterleavingMerger::new(),
    ))
}

pub fn write_marked_pdf(path: &Path, markers: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = markers
        .iter()
        .map(|marker| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Marker" => Object::string_literal(*marker),
            });
            page_id.into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => markers.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("Failed to write fixture");
}

/// Markers of the document at `path`, in page order.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load merged document");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            match doc.get_dictionary(page_id).and_then(|page| page.get(b"Marker")) {
                Ok(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
                _ => String::new(),
            }
        })
        .collect()
}
