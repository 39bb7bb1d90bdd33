// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `PdfLibrary` backed by the `lopdf` crate.
//
// Source pages are turned into Form XObjects (their content stream plus
// deep-copied resources) and placed on output pages with a `cm` transform.
// Output pages are collected in memory and the page tree is only built when
// the document is saved.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use printdesk_core::error::{PrintdeskError, Result};
use tracing::{debug, instrument, warn};

use super::library::{PageHandle, PdfLibrary, Placement};

/// Page size assumed when a page (and its ancestors) carry no /MediaBox:
/// A4 portrait, in points.
pub const FALLBACK_PAGE_SIZE: (f32, f32) = (595.28, 841.89);

/// Guard against cyclic /Parent chains in damaged files.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Production PDF backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfLibrary;

/// A parsed source document with its pages in reading order.
pub struct SourcePdf {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl SourcePdf {
    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.page_ids.get(index as usize).copied().ok_or_else(|| {
            PrintdeskError::PdfError(format!(
                "page index {} out of range (document has {} pages)",
                index,
                self.page_ids.len()
            ))
        })
    }
}

/// An output document under construction.
///
/// Only ever fed from one source document: the object and form caches are
/// keyed by source object IDs.
pub struct ImposedPdf {
    document: Document,
    pages: Vec<SheetPage>,
    /// Source page index -> Form XObject already copied into `document`.
    forms: HashMap<u32, ObjectId>,
    /// Source object -> copied object.
    copied: HashMap<ObjectId, ObjectId>,
}

struct SheetPage {
    width: f32,
    height: f32,
    content: String,
    xobjects: Dictionary,
}

impl PdfLibrary for LopdfLibrary {
    type Source = SourcePdf;
    type Output = ImposedPdf;

    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn load(&self, bytes: &[u8]) -> Result<SourcePdf> {
        let document = Document::load_mem(bytes)
            .map_err(|err| PrintdeskError::DocumentLoad(err.to_string()))?;

        // lopdf keys pages by 1-based page number in a BTreeMap, so values()
        // are already in reading order.
        let page_ids: Vec<ObjectId> = document.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "source PDF loaded");

        Ok(SourcePdf { document, page_ids })
    }

    fn page_count(&self, source: &SourcePdf) -> u32 {
        source.page_ids.len() as u32
    }

    fn page_size(&self, source: &SourcePdf, index: u32) -> Result<(f32, f32)> {
        let page_id = source.page_id(index)?;
        let (x0, y0, x1, y1) = media_box(&source.document, page_id);
        Ok(((x1 - x0).abs(), (y1 - y0).abs()))
    }

    fn create(&self) -> ImposedPdf {
        ImposedPdf {
            document: Document::with_version("1.7"),
            pages: Vec::new(),
            forms: HashMap::new(),
            copied: HashMap::new(),
        }
    }

    fn add_page(&self, output: &mut ImposedPdf, width: f32, height: f32) -> PageHandle {
        output.pages.push(SheetPage {
            width,
            height,
            content: String::new(),
            xobjects: Dictionary::new(),
        });
        PageHandle(output.pages.len() - 1)
    }

    fn draw_page(
        &self,
        output: &mut ImposedPdf,
        page: PageHandle,
        source: &SourcePdf,
        index: u32,
        placement: Placement,
    ) -> Result<()> {
        if page.0 >= output.pages.len() {
            return Err(PrintdeskError::PdfError(format!(
                "output page {} does not exist",
                page.0
            )));
        }

        let page_id = source.page_id(index)?;
        let (x0, y0, x1, y1) = media_box(&source.document, page_id);
        let (src_w, src_h) = ((x1 - x0).abs(), (y1 - y0).abs());
        if src_w <= 0.0 || src_h <= 0.0 {
            return Err(PrintdeskError::PdfError(format!(
                "source page {} has an empty MediaBox",
                index + 1
            )));
        }

        let form_id = match output.forms.get(&index) {
            Some(id) => *id,
            None => {
                let id = create_page_form(
                    &mut output.document,
                    &source.document,
                    page_id,
                    (x0, y0, x1, y1),
                    &mut output.copied,
                )?;
                output.forms.insert(index, id);
                id
            }
        };

        let sheet = &mut output.pages[page.0];
        let name = format!("P{}", sheet.xobjects.len());
        sheet.xobjects.set(name.as_bytes(), Object::Reference(form_id));
        sheet.content.push_str(&placement_command(
            &name,
            placement,
            placement.width / src_w,
            placement.height / src_h,
        ));

        Ok(())
    }

    #[instrument(skip_all, fields(pages = output.pages.len()))]
    fn save(&self, output: ImposedPdf) -> Result<Vec<u8>> {
        let ImposedPdf {
            mut document,
            pages,
            ..
        } = output;

        let pages_id = document.new_object_id();
        let mut kids = Vec::with_capacity(pages.len());

        for sheet in pages {
            let content_id = document.add_object(Stream::new(
                Dictionary::new(),
                sheet.content.into_bytes(),
            ));

            let mut resources = Dictionary::new();
            if !sheet.xobjects.is_empty() {
                resources.set("XObject", Object::Dictionary(sheet.xobjects));
            }

            let page_dict = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(sheet.width),
                        Object::Real(sheet.height),
                    ]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]);
            kids.push(Object::Reference(document.add_object(page_dict)));
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let catalog_id = document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).map_err(|err| {
            PrintdeskError::PdfError(format!("failed to serialise document: {}", err))
        })?;

        debug!(output_bytes = bytes.len(), "booklet serialised");
        Ok(bytes)
    }
}

/// `q sx 0 0 sy x y cm /Name Do Q` for one placed page.
fn placement_command(name: &str, placement: Placement, scale_x: f32, scale_y: f32) -> String {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        scale_x, scale_y, placement.x, placement.y, name
    )
}

// -- Form XObjects -------------------------------------------------------------

/// Copy a source page into `target` as a Form XObject whose origin is the
/// lower-left corner of the page's MediaBox.
fn create_page_form(
    target: &mut Document,
    source: &Document,
    page_id: ObjectId,
    (x0, y0, x1, y1): (f32, f32, f32, f32),
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page_id).map_err(|err| {
        PrintdeskError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })?;

    let mut form = Dictionary::new();
    form.set("Type", Object::Name(b"XObject".to_vec()));
    form.set("Subtype", Object::Name(b"Form".to_vec()));
    form.set("FormType", Object::Integer(1));
    form.set(
        "BBox",
        Object::Array(vec![
            Object::Real(x0),
            Object::Real(y0),
            Object::Real(x1),
            Object::Real(y1),
        ]),
    );
    form.set(
        "Matrix",
        Object::Array(vec![
            Object::Integer(1),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
            Object::Real(-x0),
            Object::Real(-y0),
        ]),
    );

    if let Some(resources) = inherited_attribute(source, page_id, b"Resources") {
        form.set(
            "Resources",
            deep_copy_object(source, target, &resources, copied)?,
        );
    }

    let content = match page_dict.get(b"Contents") {
        Ok(contents) => page_content(source, contents),
        Err(_) => FormContent::Plain(Vec::new()),
    };

    let data = match content {
        FormContent::Plain(data) => data,
        FormContent::Encoded {
            data,
            filter,
            parms,
        } => {
            form.set("Filter", deep_copy_object(source, target, &filter, copied)?);
            if let Some(parms) = parms {
                form.set("DecodeParms", deep_copy_object(source, target, &parms, copied)?);
            }
            data
        }
    };

    Ok(target.add_object(Stream::new(form, data)))
}

/// Content stream bytes for a Form XObject.
enum FormContent {
    /// Unfiltered operators.
    Plain(Vec<u8>),
    /// A single stream lopdf could not decode; kept encoded with its filter.
    Encoded {
        data: Vec<u8>,
        filter: Object,
        parms: Option<Object>,
    },
}

/// Gather a page's /Contents, which is either one stream or an array of
/// streams to be concatenated.
fn page_content(doc: &Document, contents: &Object) -> FormContent {
    match contents {
        Object::Reference(id) => match doc.get_object(*id).and_then(Object::as_stream) {
            Ok(stream) => single_stream_content(stream),
            Err(err) => {
                warn!(?id, %err, "unreadable content stream, page will be blank");
                FormContent::Plain(Vec::new())
            }
        },
        Object::Array(parts) => {
            let mut data = Vec::new();
            for part in parts {
                let stream = match part {
                    Object::Reference(id) => doc.get_object(*id).and_then(Object::as_stream),
                    other => other.as_stream(),
                };
                match stream {
                    Ok(stream) => match decoded_bytes(stream) {
                        Some(bytes) => {
                            data.extend_from_slice(&bytes);
                            data.push(b'\n');
                        }
                        None => warn!("skipping content stream with unsupported filter"),
                    },
                    Err(err) => warn!(%err, "skipping unreadable content stream"),
                }
            }
            FormContent::Plain(data)
        }
        Object::Stream(stream) => single_stream_content(stream),
        _ => FormContent::Plain(Vec::new()),
    }
}

fn single_stream_content(stream: &Stream) -> FormContent {
    if let Some(bytes) = decoded_bytes(stream) {
        return FormContent::Plain(bytes);
    }
    match stream.dict.get(b"Filter") {
        Ok(filter) => FormContent::Encoded {
            data: stream.content.clone(),
            filter: filter.clone(),
            parms: stream.dict.get(b"DecodeParms").ok().cloned(),
        },
        Err(_) => FormContent::Plain(stream.content.clone()),
    }
}

/// Stream bytes with filters removed. `None` when the stream is filtered
/// with something lopdf cannot decode.
fn decoded_bytes(stream: &Stream) -> Option<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Some(stream.content.clone());
    }
    stream.decompressed_content().ok()
}

// -- Page attributes -----------------------------------------------------------

/// Look up an inheritable page attribute (/MediaBox, /Resources, ...) on the
/// page or the nearest ancestor in the page tree, resolving references.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(match value {
                Object::Reference(id) => doc.get_object(*id).ok()?.clone(),
                other => other.clone(),
            });
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// MediaBox corners `(x0, y0, x1, y1)` of a page, falling back to A4.
fn media_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let fallback = (0.0, 0.0, FALLBACK_PAGE_SIZE.0, FALLBACK_PAGE_SIZE.1);
    let Some(Object::Array(values)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return fallback;
    };
    if values.len() != 4 {
        return fallback;
    }
    let numbers: Vec<f32> = values.iter().filter_map(|v| number(doc, v)).collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] => (x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)),
        _ => fallback,
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| number(doc, o)),
        _ => None,
    }
}

// -- Deep copy -----------------------------------------------------------------

/// Deep-copy an object from `source` into `target`, following references.
///
/// Each source object is copied at most once; later references reuse the
/// cached copy, which also makes reference cycles terminate. /Parent keys are
/// dropped so copying resources never drags in the source page tree.
fn deep_copy_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Reference(ref_id) => {
            if let Some(&new_id) = copied.get(ref_id) {
                return Ok(Object::Reference(new_id));
            }
            let referenced = match source.get_object(*ref_id) {
                Ok(obj) => obj,
                Err(err) => {
                    warn!(?ref_id, %err, "cannot resolve reference, using Null");
                    return Ok(Object::Null);
                }
            };
            // Reserve the ID before recursing so cycles resolve to it.
            let new_id = target.new_object_id();
            copied.insert(*ref_id, new_id);
            let cloned = deep_copy_object(source, target, referenced, copied)?;
            target.objects.insert(new_id, cloned);
            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            source, target, dict, copied,
        )?)),
        Object::Array(items) => {
            let mut new_items = Vec::with_capacity(items.len());
            for item in items {
                new_items.push(deep_copy_object(source, target, item, copied)?);
            }
            Ok(Object::Array(new_items))
        }
        Object::Stream(stream) => {
            let dict = copy_dictionary(source, target, &stream.dict, copied)?;
            Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
        }
        // Boolean, Integer, Real, String, Name, Null.
        other => Ok(other.clone()),
    }
}

fn copy_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_copy_object(source, target, value, copied)?);
    }
    Ok(new_dict)
}
