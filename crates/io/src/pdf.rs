// PDF bundles: concatenate the pages of many documents into one file.
//
// Pages are copied with everything they reference. Attributes a page
// inherits from its old page tree (MediaBox, Resources, ...) are copied onto
// the page itself, since the merged file gets a fresh, flat page tree.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{dictionary, Document, Object, ObjectId};

use ledgerdoc_recon::PageSink;

use crate::error::IoError;

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug)]
pub struct PdfBundle {
    objects: BTreeMap<ObjectId, Object>,
    pages: Vec<ObjectId>,
    next_id: u32,
    documents: usize,
}

impl PdfBundle {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            pages: Vec::new(),
            next_id: 1,
            documents: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Write the bundle. Empty bundles are not written; returns whether a
    /// file was produced.
    pub fn save(self, path: &Path) -> Result<bool, IoError> {
        if self.is_empty() {
            log::debug!("{}: no pages, not written", path.display());
            return Ok(false);
        }
        let pages = self.page_count();
        let mut doc = self.into_document();
        doc.save(path).map_err(|e| IoError::write(path, e))?;
        log::info!("wrote {} ({pages} pages)", path.display());
        Ok(true)
    }

    fn into_document(self) -> Document {
        let mut doc = Document::with_version("1.5");
        doc.objects = self.objects;
        doc.max_id = self.next_id.saturating_sub(1);

        let pages_id = doc.new_object_id();
        for &page in &self.pages {
            if let Ok(dict) = doc.get_object_mut(page).and_then(|o| o.as_dict_mut()) {
                dict.set("Parent", pages_id);
            }
        }
        let kids: Vec<Object> = self.pages.iter().map(|&id| Object::Reference(id)).collect();
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.prune_objects();
        doc.renumber_objects();
        doc.compress();
        doc
    }
}

impl Default for PdfBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSink for PdfBundle {
    fn append_document(&mut self, path: &Path) -> Result<usize, String> {
        let mut doc = Document::load(path).map_err(|e| e.to_string())?;
        doc.renumber_objects_with(self.next_id);

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err("document has no pages".to_string());
        }

        for &page in &pages {
            let inherited = inherited_attributes(&doc, page);
            if let Ok(dict) = doc.get_object_mut(page).and_then(|o| o.as_dict_mut()) {
                for (key, value) in inherited {
                    dict.set(key, value);
                }
            }
        }

        // The old catalog and page-tree nodes are replaced by the bundle's own.
        let objects = std::mem::take(&mut doc.objects);
        self.objects.extend(objects.into_iter().filter(|(_, object)| !is_tree_node(object)));
        self.next_id = doc.max_id + 1;
        self.pages.extend_from_slice(&pages);
        self.documents += 1;
        Ok(pages.len())
    }
}

fn is_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|d| d.get(b"Type"))
        .and_then(|t| t.as_name())
        .is_ok_and(|name| name == b"Catalog" || name == b"Pages")
}

/// Inheritable attributes the page lacks, taken from its nearest ancestor.
fn inherited_attributes(doc: &Document, page: ObjectId) -> Vec<(&'static [u8], Object)> {
    let mut found = Vec::new();
    let Ok(dict) = doc.get_dictionary(page) else {
        return found;
    };

    for key in INHERITABLE {
        if dict.has(key) {
            continue;
        }
        let mut parent = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let Some(id) = parent else { break };
            let Ok(node) = doc.get_dictionary(id) else { break };
            if let Ok(value) = node.get(key) {
                found.push((key, value.clone()));
                break;
            }
            parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
        }
    }
    found
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Write a small PDF whose pages show `label-1`, `label-2`, ... and
    /// inherit a `width` x 842 MediaBox from the page tree.
    pub fn write_pdf(path: &Path, label: &str, pages: usize, width: i64) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for n in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("{label}-{n}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    /// Page labels and widths of a bundle, in page order.
    pub fn read_pages(path: &Path) -> Vec<(String, i64)> {
        let mut doc = Document::load(path).unwrap();
        doc.decompress();
        doc.get_pages()
            .into_values()
            .map(|id| {
                let content = doc.get_page_content(id).unwrap();
                let text = String::from_utf8_lossy(&content).into_owned();
                let label = text
                    .split('(')
                    .nth(1)
                    .and_then(|rest| rest.split(')').next())
                    .unwrap_or_default()
                    .to_string();
                let width = doc
                    .get_dictionary(id)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()[2]
                    .as_i64()
                    .unwrap();
                (label, width)
            })
            .collect()
    }
}
