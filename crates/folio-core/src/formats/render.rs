//! # Tag Rendering
//!
//! Serializes an [`ItemTags`] aggregate as JSON, XML, CSV or plain text.
//!
//! Every renderer walks the tags in output order (value descending, name
//! ascending). CSV and plain text share one row writer; they differ only
//! in the `Content-Type` the HTTP layer declares.
//!
//! A value that is not finite (a sum or weighting that overflowed) fails
//! every renderer with [`FolioError::SerializationError`] instead of
//! producing `null` or `inf`.

use super::Format;
use crate::rows::is_xml_char;
use crate::{FolioError, ItemTags, Tag};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Number, Value};
use std::io::Cursor;

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Render `item` in `format`.
pub fn render(item: &ItemTags, format: Format) -> Result<Vec<u8>, FolioError> {
    match format {
        Format::Json => render_json(item),
        Format::Xml => render_xml(item),
        Format::Csv => render_csv(item),
        Format::Text => render_text(item),
    }
}

/// Text form of a tag value: shortest round-trip decimal, integral values
/// without a fractional part.
#[must_use]
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// JSON form of a finite tag value. Integral values become JSON integers.
fn json_value(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Some(Value::from(value as i64))
    } else {
        Number::from_f64(value).map(Value::Number)
    }
}

fn non_finite(tag: &Tag) -> FolioError {
    FolioError::SerializationError(format!(
        "tag \"{}\" has non-finite value {}",
        tag.name, tag.value
    ))
}

/// Tags in output order, failing on the first non-finite value.
fn output_tags(item: &ItemTags) -> Result<Vec<Tag>, FolioError> {
    let tags = item.sorted_tags();
    match tags.iter().find(|tag| !tag.value.is_finite()) {
        Some(tag) => Err(non_finite(tag)),
        None => Ok(tags),
    }
}

// =============================================================================
// JSON
// =============================================================================

/// `{"tags": {name: value, ...}, "count": N, "id": ID}`
pub fn render_json(item: &ItemTags) -> Result<Vec<u8>, FolioError> {
    let tags = output_tags(item)?;

    let mut tag_map = Map::new();
    for tag in &tags {
        let value = json_value(tag.value).ok_or_else(|| non_finite(tag))?;
        tag_map.insert(tag.name.clone(), value);
    }

    let mut body = Map::new();
    body.insert("tags".to_string(), Value::Object(tag_map));
    body.insert("count".to_string(), Value::from(tags.len()));
    body.insert("id".to_string(), Value::from(item.id.as_str()));

    serde_json::to_vec(&Value::Object(body))
        .map_err(|e| FolioError::SerializationError(e.to_string()))
}

// =============================================================================
// XML
// =============================================================================

/// Fails if `text` holds a character XML 1.0 cannot carry.
fn check_xml_text(what: &str, text: &str) -> Result<(), FolioError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(FolioError::SerializationError(format!(
            "{} {:?} contains character U+{:04X}, not allowed in XML",
            what, text, c as u32
        ))),
        None => Ok(()),
    }
}

/// `<tags count="N" id="ID"><tag value="V">name</tag>...</tags>`
pub fn render_xml(item: &ItemTags) -> Result<Vec<u8>, FolioError> {
    let tags = output_tags(item)?;
    check_xml_text("id", &item.id)?;
    for tag in &tags {
        check_xml_text("tag name", &tag.name)?;
    }
    let count = tags.len().to_string();
    let xml_err = |e: quick_xml::Error| FolioError::SerializationError(e.to_string());

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("tags");
    root.push_attribute(("count", count.as_str()));
    root.push_attribute(("id", item.id.as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for tag in &tags {
        let value = format_value(tag.value);
        let mut element = BytesStart::new("tag");
        element.push_attribute(("value", value.as_str()));
        writer.write_event(Event::Start(element)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(&tag.name)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("tag")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("tags")))
        .map_err(xml_err)?;

    Ok(writer.into_inner().into_inner())
}

// =============================================================================
// CSV / TEXT
// =============================================================================

/// Header row shared by CSV and plain text.
const ROW_HEADER: [&str; 2] = ["tag", "value"];

fn write_rows(tags: &[Tag]) -> Result<Vec<u8>, FolioError> {
    let csv_err = |e: csv::Error| FolioError::SerializationError(e.to_string());

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(ROW_HEADER).map_err(csv_err)?;
    for tag in tags {
        writer
            .write_record([tag.name.as_str(), format_value(tag.value).as_str()])
            .map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| FolioError::SerializationError(e.to_string()))
}

/// `tag,value` rows.
pub fn render_csv(item: &ItemTags) -> Result<Vec<u8>, FolioError> {
    write_rows(&output_tags(item)?)
}

/// Same rows as [`render_csv`], served as `text/plain`.
pub fn render_text(item: &ItemTags) -> Result<Vec<u8>, FolioError> {
    write_rows(&output_tags(item)?)
}

// =============================================================================
// TESTS
// =============================================================================
