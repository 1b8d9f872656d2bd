//! Interleaving merge of a duplex scan.
//!
//! The front sides are scanned in order; the stack is then flipped and the
//! back sides are scanned, which yields them in reverse. The collated
//! document therefore takes page `i` of the front scan followed by page
//! `n - 1 - i` of the back scan.

use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use std::time::Instant;

use crate::error::{CollateError, Result};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::{MergeReport, Merger};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `/Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Yields `(front_index, back_index)` pairs in output order.
///
/// # Examples
///
/// ```
/// use pdfcollate::merge::interleave::interleaved_indices;
///
/// let order: Vec<_> = interleaved_indices(3).collect();
/// assert_eq!(order, vec![(0, 2), (1, 1), (2, 0)]);
/// ```
pub fn interleaved_indices(page_count: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..page_count).map(move |i| (i, page_count - 1 - i))
}

/// Merger that interleaves a front-side scan with a reversed back-side scan.
#[derive(Debug, Clone, Default)]
pub struct InterleavingMerger {
    reader: PdfReader,
    writer: PdfWriter,
}

impl InterleavingMerger {
    /// Create a merger with the default reader and atomic writer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Merger for InterleavingMerger {
    fn merge(&self, first: &Path, second: &Path, destination: &Path) -> Result<MergeReport> {
        let start = Instant::now();

        let front = self.reader.load(first)?;
        let back = self.reader.load(second)?;

        if front.page_count != back.page_count {
            return Err(CollateError::PageCountMismatch {
                first: front.path,
                first_pages: front.page_count,
                second: back.path,
                second_pages: back.page_count,
            });
        }

        let mut merged = interleave(front.document, back.document).map_err(|e| {
            CollateError::corrupted_pdf(first.to_path_buf(), format!("page tree: {e}"))
        })?;
        let total_pages = merged.get_pages().len();

        let write_stats = self.writer.save(&mut merged, destination, Some(first))?;

        Ok(MergeReport {
            output_path: write_stats.output_path,
            total_pages,
            file_size: write_stats.file_size,
            merge_time: start.elapsed(),
        })
    }
}

/// Interleave the pages of `front` with the reversed pages of `back`.
///
/// Both documents must have the same number of pages. The result reuses the
/// catalog of `front`; objects only reachable from the catalog of `back` are
/// dropped.
pub fn interleave(front: Document, back: Document) -> lopdf::Result<Document> {
    let mut merged = front;
    let mut back = back;

    let front_pages: Vec<ObjectId> = merged.get_pages().into_values().collect();
    materialize_inherited_attributes(&mut merged, &front_pages)?;

    let back_pages: Vec<ObjectId> = back.get_pages().into_values().collect();
    materialize_inherited_attributes(&mut back, &back_pages)?;

    back.renumber_objects_with(merged.max_id + 1);
    let back_pages: Vec<ObjectId> = back.get_pages().into_values().collect();
    merged.max_id = back.max_id;
    merged.objects.extend(back.objects);

    let pages_id = merged.catalog()?.get(b"Pages")?.as_reference()?;

    let ordered: Vec<ObjectId> = interleaved_indices(front_pages.len())
        .flat_map(|(f, b)| [front_pages[f], back_pages[b]])
        .collect();

    for &page_id in &ordered {
        merged
            .get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));
    }

    let pages = merged.get_dictionary_mut(pages_id)?;
    pages.set("Count", Object::Integer(ordered.len() as i64));
    pages.set(
        "Kids",
        Object::Array(ordered.into_iter().map(Object::Reference).collect()),
    );

    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}

/// Copy inheritable attributes from ancestor page tree nodes onto each page.
///
/// Flattening the page tree would otherwise lose them.
fn materialize_inherited_attributes(doc: &mut Document, page_ids: &[ObjectId]) -> lopdf::Result<()> {
    for &page_id in page_ids {
        let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

        {
            let page = doc.get_dictionary(page_id)?;
            let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
                .into_iter()
                .filter(|key| !page.has(key))
                .collect();
            let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

            let mut depth = 0;
            while let Some(parent_id) = parent {
                if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                    break;
                }
                let Ok(node) = doc.get_dictionary(parent_id) else {
                    break;
                };

                missing.retain(|key| match node.get(key) {
                    Ok(value) => {
                        inherited.push((key.to_vec(), value.clone()));
                        false
                    }
                    Err(_) => true,
                });

                parent = node.get(b"Parent").and_then(Object::as_reference).ok();
                depth += 1;
            }
        }

        if !inherited.is_empty() {
            let page = doc.get_dictionary_mut(page_id)?;
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }

    Ok(())
}
