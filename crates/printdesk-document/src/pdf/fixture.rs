// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic PDFs for tests and benchmarks.

use lopdf::{Dictionary, Document, Object, Stream};
use printdesk_core::error::{PrintdeskError, Result};

/// Build a PDF with one page per entry in `sizes` (width, height in points).
///
/// Each page carries a small content stream that strokes a box inset from
/// its edges, so imposed output has something to draw.
pub fn sample_pdf(sizes: &[(f32, f32)]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(sizes.len());
    for &(width, height) in sizes {
        let ops = format!("1 w 10 10 {} {} re S", width - 20.0, height - 20.0);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), ops.into_bytes()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| PrintdeskError::PdfError(err.to_string()))?;
    Ok(bytes)
}

/// `pages` A4 portrait pages.
pub fn sample_a4_pdf(pages: usize) -> Result<Vec<u8>> {
    sample_pdf(&vec![(595.28, 841.89); pages])
}
