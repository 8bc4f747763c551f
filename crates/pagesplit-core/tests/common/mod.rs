//! In-memory PDF fixtures shared by the integration tests

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// One page of a generated test document
pub struct TestPage {
    pub width: i64,
    pub height: i64,
    pub rotate: Option<i64>,
    pub crop_box: Option<[i64; 4]>,
    /// Replaces the default "Page N" content stream
    pub contents: Option<Vec<Stream>>,
}

impl TestPage {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            rotate: None,
            crop_box: None,
            contents: None,
        }
    }

    pub fn rotated(mut self, rotate: i64) -> Self {
        self.rotate = Some(rotate);
        self
    }

    pub fn cropped(mut self, crop_box: [i64; 4]) -> Self {
        self.crop_box = Some(crop_box);
        self
    }

    pub fn with_contents(mut self, contents: Vec<Stream>) -> Self {
        self.contents = Some(contents);
        self
    }
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

pub fn label_content(label: &str) -> Vec<u8> {
    Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ),
            Operation::new("Td", vec![Object::Integer(20), Object::Integer(20)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    label.as_bytes().to_vec(),
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    }
    .encode()
    .unwrap()
}

/// Build a PDF whose pages carry the text "Page N".
///
/// With `nested`, pages sit under an intermediate /Pages node and inherit
/// MediaBox (taken from the first page) and Resources from the root.
pub fn build_pdf_with(pages: &[TestPage], nested: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_id = doc.new_object_id();
    let parent_id = if nested { doc.new_object_id() } else { root_id };

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]);

    let mut page_ids = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let contents = match &page.contents {
            Some(streams) => Object::Array(
                streams
                    .iter()
                    .map(|stream| Object::Reference(doc.add_object(stream.clone())))
                    .collect(),
            ),
            None => Object::Reference(doc.add_object(Stream::new(
                Dictionary::new(),
                label_content(&format!("Page {}", i + 1)),
            ))),
        };

        let mut dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(parent_id)),
            ("Contents", contents),
        ]);
        if !nested {
            dict.set("MediaBox", media_box(page.width, page.height));
            dict.set("Resources", Object::Dictionary(resources.clone()));
        }
        if let Some([llx, lly, urx, ury]) = page.crop_box {
            dict.set(
                "CropBox",
                Object::Array(vec![
                    Object::Integer(llx),
                    Object::Integer(lly),
                    Object::Integer(urx),
                    Object::Integer(ury),
                ]),
            );
        }
        if let Some(rotate) = page.rotate {
            dict.set("Rotate", Object::Integer(rotate));
        }
        page_ids.push(doc.add_object(dict));
    }

    let kids = Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect());
    let count = Object::Integer(pages.len() as i64);

    let root = if nested {
        let intermediate = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Parent", Object::Reference(root_id)),
            ("Kids", kids),
            ("Count", count.clone()),
        ]);
        doc.objects
            .insert(parent_id, Object::Dictionary(intermediate));

        let first = pages.first().map(|p| (p.width, p.height)).unwrap_or((612, 792));
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(parent_id)])),
            ("Count", count),
            ("MediaBox", media_box(first.0, first.1)),
            ("Resources", Object::Dictionary(resources)),
        ])
    } else {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", kids),
            ("Count", count),
        ])
    };
    doc.objects.insert(root_id, Object::Dictionary(root));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(root_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Flat PDF with one page per `(width, height)`
pub fn build_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let pages: Vec<TestPage> = sizes.iter().map(|&(w, h)| TestPage::new(w, h)).collect();
    build_pdf_with(&pages, false)
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(n) => *n as f64,
        Object::Real(n) => *n as f64,
        other => panic!("expected a number, got {:?}", other),
    }
}

/// Page ids of a loaded output document, in order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// `(width, height)` of a page's own MediaBox
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let media_box = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .unwrap();
    (
        number(&media_box[2]) - number(&media_box[0]),
        number(&media_box[3]) - number(&media_box[1]),
    )
}

/// Decoded operations of a page's content
pub fn page_operations(doc: &Document, page_id: ObjectId) -> Vec<Operation> {
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

/// Operands of the first operation with the given operator
pub fn operands(ops: &[Operation], operator: &str) -> Option<Vec<f64>> {
    ops.iter()
        .find(|op| op.operator == operator)
        .map(|op| op.operands.iter().map(number).collect())
}

/// Content stream stored with /ASCIIHexDecode, which lopdf cannot decode
pub fn ascii_hex_stream(content: &[u8]) -> Stream {
    let mut hex: Vec<u8> = content
        .iter()
        .flat_map(|b| format!("{:02X}", b).into_bytes())
        .collect();
    hex.push(b'>');
    Stream::new(
        Dictionary::from_iter(vec![("Filter", Object::Name(b"ASCIIHexDecode".to_vec()))]),
        hex,
    )
}

pub fn decode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = data
        .iter()
        .copied()
        .take_while(|&b| b != b'>')
        .filter(u8::is_ascii_hexdigit)
        .collect();
    digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
        .collect()
}

/// The Form XObject a split output page paints under `name`
pub fn form_stream<'a>(doc: &'a Document, page_id: ObjectId, name: &[u8]) -> &'a Stream {
    let form_id = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Resources"))
        .and_then(Object::as_dict)
        .and_then(|res| res.get(b"XObject"))
        .and_then(Object::as_dict)
        .and_then(|xobjects| xobjects.get(name))
        .and_then(Object::as_reference)
        .unwrap();
    doc.get_object(form_id).and_then(Object::as_stream).unwrap()
}

/// Numeric entries of an array-valued dictionary key
pub fn numbers(dict: &Dictionary, key: &[u8]) -> Vec<f64> {
    dict.get(key)
        .and_then(Object::as_array)
        .unwrap()
        .iter()
        .map(number)
        .collect()
}
