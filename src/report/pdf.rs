//! PDF reports: the record as Courier text on US-letter pages, an optional plot page, and the
//! record itself in the document information dictionary so it can be read back.

use crate::error::{Result, StatsError};
use crate::report::plot::{plot_operations, Curve, FILL_ALPHA, FILL_STATE};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::Path;

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;
pub const MARGIN: f64 = 36.0;
pub const FONT_SIZE: f64 = 9.0;
pub const LINE_HEIGHT: f64 = 10.8;

/// Information dictionary key holding the JSON record.
pub const RECORD_KEY: &str = "CsvStatsRecord";

const FONT: &str = "F1";
// Courier glyphs are 0.6 em wide: (612 - 2 * 36) / (0.6 * 9)
const MAX_LINE_CHARS: usize = 100;

/// Split lines that would run past the right margin.
pub fn wrap_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(MAX_LINE_CHARS) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

/// Lines that fit between the top and bottom margins.
pub fn lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2.0 * MARGIN) / LINE_HEIGHT).floor() as usize + 1
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn text_page(lines: &[String]) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(FONT.as_bytes().to_vec()), real(FONT_SIZE)]),
        Operation::new("TL", vec![real(LINE_HEIGHT)]),
        Operation::new("Td", vec![real(MARGIN), real(PAGE_HEIGHT - MARGIN)]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn add_page(doc: &mut Document, pages_id: ObjectId, operations: Vec<Operation>) -> Result<ObjectId> {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Lay out `json` over as many pages as needed, followed by a plot page when `curves` is set.
pub fn build_document(json: &str, curves: Option<&[Curve]>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let fill_state_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => real(FILL_ALPHA),
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT => font_id,
        },
        "ExtGState" => dictionary! {
            FILL_STATE => fill_state_id,
        },
    });

    let lines = wrap_lines(json);
    let mut kids: Vec<Object> = Vec::new();
    for page in lines.chunks(lines_per_page()) {
        kids.push(add_page(&mut doc, pages_id, text_page(page))?.into());
    }
    if let Some(curves) = curves {
        let ops = plot_operations(curves, PAGE_WIDTH, PAGE_HEIGHT, FONT);
        kids.push(add_page(&mut doc, pages_id, ops)?.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(PAGE_WIDTH),
                real(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("csv-stats report"),
        "Producer" => Object::string_literal("csv-stats"),
        RECORD_KEY => Object::String(json.as_bytes().to_vec(), StringFormat::Hexadecimal),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    Ok(doc)
}

pub fn write_pdf<W: Write>(writer: &mut W, json: &str, curves: Option<&[Curve]>) -> Result<()> {
    let mut doc = build_document(json, curves)?;
    doc.save_to(writer)?;
    writer.flush()?;
    Ok(())
}

/// The JSON text stored by [`write_pdf`].
pub fn read_record_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let doc = Document::load(path)?;
    let missing = || StatsError::Render(format!("{} has no embedded record", path.display()));

    let info = match doc.trailer.get(b"Info").map_err(|_| missing())? {
        Object::Reference(id) => doc.get_object(*id)?,
        other => other,
    };
    let bytes = info
        .as_dict()?
        .get(RECORD_KEY.as_bytes())
        .map_err(|_| missing())?
        .as_str()?;
    String::from_utf8(bytes.to_vec()).map_err(|e| StatsError::Render(e.to_string()))
}

/// Read back the record saved in a PDF report.
pub fn read_pdf_record<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    Ok(serde_json::from_str(&read_record_text(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_long_lines() {
        let long = "x".repeat(250);
        let lines = wrap_lines(&format!("{{\n{}\n\n}}", long));
        assert_eq!(lines.len(), 1 + 3 + 1 + 1);
        assert_eq!(lines[1].len(), 100);
        assert_eq!(lines[3].len(), 50);
        assert_eq!(lines[4], "");
    }

    #[test]
    fn test_pagination() {
        assert_eq!(lines_per_page(), 67);

        let json = (0..150).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let doc = build_document(&json, None).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        let no_curves: Vec<Curve> = Vec::new();
        let with_plot = build_document(&json, Some(no_curves.as_slice())).unwrap();
        assert_eq!(with_plot.get_pages().len(), 4);
    }

    #[test]
    fn test_record_survives_save_and_load() {
        let json = r#"{"statistic": 1.25, "label": "a (b) \\ c"}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        write_pdf(&mut file, json, None).unwrap();
        drop(file);

        assert_eq!(read_record_text(&path).unwrap(), json);
        let value: serde_json::Value = read_pdf_record(&path).unwrap();
        assert_eq!(value["statistic"], 1.25);
    }
}
