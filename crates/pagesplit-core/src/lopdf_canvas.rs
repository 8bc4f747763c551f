//! `PageCanvas` backed by lopdf
//!
//! The output is assembled inside the loaded source document so that fonts,
//! images and other shared resources are reused rather than copied:
//! 1. Pass-through pages are re-parented onto a flat page tree, with any
//!    inherited attributes written onto the page itself
//! 2. Pages being split become Form XObjects carrying the page content
//! 3. Each half is a new page whose content stream paints that form
//! 4. The page tree is rebuilt and unreachable objects are pruned on save

use crate::canvas::{EmbeddedPage, PageCanvas};
use crate::error::SplitError;
use crate::geometry::{ContentWindow, PageDimensions, PlacementTransform, Rotation};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains
const MAX_TREE_DEPTH: usize = 64;

/// Form XObject created from a source page
#[derive(Debug, Clone)]
pub struct EmbeddedForm {
    id: ObjectId,
    name: Vec<u8>,
    dimensions: PageDimensions,
}

/// Form XObject content, with the filter entries when it stays encoded
#[derive(Debug, Default)]
struct FormContent {
    data: Vec<u8>,
    filter: Option<Object>,
    decode_parms: Option<Object>,
}

/// Output document under construction
pub struct LopdfCanvas {
    doc: Document,
    pages_root: ObjectId,
    source_pages: BTreeMap<u32, ObjectId>,
    output: Vec<ObjectId>,
}

impl LopdfCanvas {
    /// Load the source document
    pub fn load(bytes: &[u8]) -> Result<Self, SplitError> {
        if bytes.is_empty() {
            return Err(SplitError::MissingInput);
        }

        let doc = Document::load_mem(bytes).map_err(|e| SplitError::LoadFailure(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(SplitError::LoadFailure(
                "Encrypted documents are not supported".into(),
            ));
        }

        Self::from_document(doc)
    }

    /// Wrap an already parsed document
    pub fn from_document(doc: Document) -> Result<Self, SplitError> {
        let pages_root = find_pages_root(&doc)?;
        let source_pages = doc.get_pages();

        Ok(Self {
            doc,
            pages_root,
            source_pages,
            output: Vec::new(),
        })
    }

    fn source_page_id(&self, page_num: u32) -> Result<ObjectId, SplitError> {
        self.source_pages
            .get(&page_num)
            .copied()
            .ok_or(SplitError::PageNotFound(page_num))
    }

    /// Page `/Rotate` of a source page (clockwise degrees, normalized)
    pub fn source_rotation(&self, page_num: u32) -> Result<i64, SplitError> {
        Ok(page_rotation(&self.doc, self.source_page_id(page_num)?))
    }

    /// Content of a page for its Form XObject.
    ///
    /// Streams are decoded and concatenated. A lone stream lopdf cannot decode
    /// is kept encoded and its filter moves onto the form; undecodable data
    /// among several streams cannot be joined and fails the page.
    fn page_content(&self, page_num: u32, page_id: ObjectId) -> Result<FormContent, SplitError> {
        let streams: Vec<&Stream> = self
            .doc
            .get_page_contents(page_id)
            .into_iter()
            .filter_map(|id| self.doc.get_object(id).and_then(Object::as_stream).ok())
            .collect();

        let mut content = FormContent::default();
        for stream in &streams {
            let data = if !stream.dict.has(b"Filter") {
                stream.content.clone()
            } else {
                match stream.decompressed_content() {
                    Ok(data) => data,
                    Err(_) if streams.len() == 1 => {
                        return Ok(FormContent {
                            data: stream.content.clone(),
                            filter: stream.dict.get(b"Filter").ok().cloned(),
                            decode_parms: stream.dict.get(b"DecodeParms").ok().cloned(),
                        });
                    }
                    Err(e) => {
                        return Err(SplitError::InvalidPage(format!(
                            "Page {} has a content stream that cannot be decoded: {}",
                            page_num, e
                        )))
                    }
                }
            };
            if !content.data.is_empty() {
                content.data.push(b'\n');
            }
            content.data.extend_from_slice(&data);
        }
        Ok(content)
    }

    fn rebuild_page_tree(&mut self) -> Result<(), SplitError> {
        let kids = self
            .output
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();

        let pages_dict = self
            .doc
            .get_dictionary_mut(self.pages_root)
            .map_err(|_| SplitError::OperationError("Invalid pages dictionary".into()))?;
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(self.output.len() as i64));

        Ok(())
    }
}

impl PageCanvas for LopdfCanvas {
    type Page = ObjectId;
    type Embedded = EmbeddedForm;

    fn page_count(&self) -> u32 {
        self.source_pages.len() as u32
    }

    fn page_size(&self, page_num: u32) -> Result<PageDimensions, SplitError> {
        let page_id = self.source_page_id(page_num)?;
        let dims = box_dimensions(page_box(&self.doc, page_id)?);
        Ok(Rotation::from_page_rotate(page_rotation(&self.doc, page_id)).apply(dims))
    }

    fn copy_page(&mut self, page_num: u32) -> Result<(), SplitError> {
        let page_id = self.source_page_id(page_num)?;

        // Intermediate /Pages nodes are dropped, so inherited values move onto the page
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|_| SplitError::InvalidPage(format!("Page {} is not a dictionary", page_num)))?;
        let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| !page_dict.has(key))
            .filter_map(|key| {
                inherited_attribute(&self.doc, page_id, key).map(|value| (*key, value.clone()))
            })
            .collect();

        let page_dict = self
            .doc
            .get_dictionary_mut(page_id)
            .map_err(|_| SplitError::InvalidPage(format!("Page {} is not a dictionary", page_num)))?;
        for (key, value) in inherited {
            page_dict.set(key.to_vec(), value);
        }
        page_dict.set("Parent", Object::Reference(self.pages_root));

        self.output.push(page_id);
        Ok(())
    }

    fn embed_page(
        &mut self,
        page_num: u32,
        rotation: Rotation,
    ) -> Result<EmbeddedPage<EmbeddedForm>, SplitError> {
        let page_id = self.source_page_id(page_num)?;
        let page_box = page_box(&self.doc, page_id)?;
        let box_dims = box_dimensions(page_box);
        let rotation = Rotation::from_page_rotate(page_rotation(&self.doc, page_id)).then(rotation);

        // Move the box to the origin, then turn it
        let matrix = concat(
            [1.0, 0.0, 0.0, 1.0, -page_box[0], -page_box[1]],
            rotation.matrix(box_dims),
        );

        let mut form = Dictionary::new();
        form.set("Type", Object::Name(b"XObject".to_vec()));
        form.set("Subtype", Object::Name(b"Form".to_vec()));
        form.set("FormType", Object::Integer(1));
        form.set("BBox", real_array(&page_box));
        form.set("Matrix", real_array(&matrix));
        if let Some(resources) = inherited_attribute(&self.doc, page_id, b"Resources") {
            form.set("Resources", resources.clone());
        }

        let content = self.page_content(page_num, page_id)?;
        if let Some(filter) = content.filter {
            form.set("Filter", filter);
        }
        if let Some(parms) = content.decode_parms {
            form.set("DecodeParms", parms);
        }
        let id = self.doc.add_object(Stream::new(form, content.data));
        let dimensions = rotation.apply(box_dims);

        tracing::debug!(
            "Embedded page {} as form {:?} ({}x{}, rotated {})",
            page_num,
            id,
            dimensions.width,
            dimensions.height,
            rotation.degrees()
        );

        Ok(EmbeddedPage {
            handle: EmbeddedForm {
                id,
                name: format!("Pg{}", page_num).into_bytes(),
                dimensions,
            },
            dimensions,
        })
    }

    fn add_page(&mut self, size: PageDimensions) -> Result<ObjectId, SplitError> {
        if !size.is_valid() {
            return Err(SplitError::InvalidPage(format!(
                "Cannot create a {}x{} page",
                size.width, size.height
            )));
        }

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_root)),
            (
                "MediaBox",
                real_array(&[0.0, 0.0, size.width, size.height]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
        ]);
        let page_id = self.doc.add_object(page);
        self.output.push(page_id);

        Ok(page_id)
    }

    fn draw_embedded(
        &mut self,
        page: &ObjectId,
        embedded: &EmbeddedForm,
        placement: &PlacementTransform,
    ) -> Result<(), SplitError> {
        let x_scale = placement.width / embedded.dimensions.width;
        let y_scale = placement.height / embedded.dimensions.height;

        let mut operations = vec![Operation::new("q", vec![])];
        if let ContentWindow::Clip(clip) = placement.window {
            operations.push(Operation::new(
                "re",
                vec![
                    real(clip.x),
                    real(clip.y),
                    real(clip.width),
                    real(clip.height),
                ],
            ));
            operations.push(Operation::new("W", vec![]));
            operations.push(Operation::new("n", vec![]));
        }
        operations.push(Operation::new(
            "cm",
            vec![
                real(x_scale),
                real(0.0),
                real(0.0),
                real(y_scale),
                real(placement.x),
                real(placement.y),
            ],
        ));
        operations.push(Operation::new(
            "Do",
            vec![Object::Name(embedded.name.clone())],
        ));
        operations.push(Operation::new("Q", vec![]));

        let encoded = Content { operations }
            .encode()
            .map_err(|e| SplitError::OperationError(format!("Failed to encode content: {}", e)))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_dict = self
            .doc
            .get_dictionary_mut(*page)
            .map_err(|_| SplitError::OperationError("Output page not found".into()))?;
        register_xobject(page_dict, &embedded.name, embedded.id)?;
        append_contents(page_dict, content_id);

        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, SplitError> {
        self.rebuild_page_tree()?;

        self.doc.prune_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| SplitError::SerializationFailure(e.to_string()))?;

        Ok(buffer)
    }
}

/// Find the root /Pages node through the catalog
fn find_pages_root(doc: &Document) -> Result<ObjectId, SplitError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| SplitError::LoadFailure("No Root in trailer".into()))?;

    doc.get_dictionary(catalog_id)
        .map_err(|_| SplitError::LoadFailure("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| SplitError::LoadFailure("No Pages in catalog".into()))
}

/// Look up a page attribute, walking up the page tree if the page lacks it
fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Visible page box `[llx, lly, urx, ury]`: CropBox if present, else MediaBox
fn page_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4], SplitError> {
    for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            let value = match value {
                Object::Reference(id) => doc
                    .get_object(*id)
                    .map_err(|e| SplitError::InvalidPage(e.to_string()))?,
                other => other,
            };
            if let Ok(array) = value.as_array() {
                return parse_box_array(array);
            }
        }
    }

    Err(SplitError::InvalidPage("Page has no MediaBox".into()))
}

/// Page `/Rotate` (clockwise degrees), normalized to 0, 90, 180 or 270
fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|value| value.as_i64().ok())
        .map(|angle| angle.rem_euclid(360))
        .unwrap_or(0)
}

/// Parse a box array, normalizing corners so that llx <= urx and lly <= ury
fn parse_box_array(array: &[Object]) -> Result<[f64; 4], SplitError> {
    if array.len() != 4 {
        return Err(SplitError::InvalidPage(
            "Page box must have 4 elements".into(),
        ));
    }

    let mut values = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        values[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => {
                return Err(SplitError::InvalidPage(format!(
                    "Page box element {} is not a number",
                    i
                )))
            }
        };
    }

    Ok([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

fn box_dimensions(page_box: [f64; 4]) -> PageDimensions {
    PageDimensions::new(page_box[2] - page_box[0], page_box[3] - page_box[1])
}

/// Product of two PDF matrices: apply `first`, then `then`
fn concat(first: [f64; 6], then: [f64; 6]) -> [f64; 6] {
    let [a1, b1, c1, d1, e1, f1] = first;
    let [a2, b2, c2, d2, e2, f2] = then;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn real_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|&v| real(v)).collect())
}

/// Add `/Resources /XObject /<name>` to an output page
fn register_xobject(
    page_dict: &mut Dictionary,
    name: &[u8],
    form_id: ObjectId,
) -> Result<(), SplitError> {
    if !page_dict.has(b"Resources") {
        page_dict.set("Resources", Object::Dictionary(Dictionary::new()));
    }
    let resources = match page_dict.get_mut(b"Resources") {
        Ok(Object::Dictionary(dict)) => dict,
        _ => {
            return Err(SplitError::OperationError(
                "Output page resources must be a direct dictionary".into(),
            ))
        }
    };

    if !resources.has(b"XObject") {
        resources.set("XObject", Object::Dictionary(Dictionary::new()));
    }
    match resources.get_mut(b"XObject") {
        Ok(Object::Dictionary(xobjects)) => {
            xobjects.set(name.to_vec(), Object::Reference(form_id));
            Ok(())
        }
        _ => Err(SplitError::OperationError(
            "Output page XObject resources must be a direct dictionary".into(),
        )),
    }
}

/// Append a content stream reference to a page's /Contents
fn append_contents(page_dict: &mut Dictionary, content_id: ObjectId) {
    let contents = match page_dict.remove(b"Contents") {
        None => Object::Reference(content_id),
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(content_id));
            Object::Array(streams)
        }
        Some(existing) => Object::Array(vec![existing, Object::Reference(content_id)]),
    };
    page_dict.set("Contents", contents);
}
