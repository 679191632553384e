//! PDF analysis report for a single dataset.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::domain::{Dataset, DatasetStatistics};
use crate::error::EquipmentError;

pub const REPORT_TITLE: &str = "Chemical Equipment Analysis Report";
pub const REPORT_FILENAME: &str = "report.pdf";

// A4 in points, with text starting 50pt from the left and top.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 11;
const LINE_HEIGHT: i64 = 16;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize;

pub fn report_lines(dataset: &Dataset, statistics: &DatasetStatistics) -> Vec<String> {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        format!("Filename: {}", dataset.filename),
        format!("Uploaded: {}", dataset.created_at.to_rfc3339()),
        format!("Total Count: {}", statistics.total_count),
        format!("Avg Flowrate: {:.2} m3/h", statistics.avg_flowrate),
        format!("Avg Pressure: {:.2} kPa", statistics.avg_pressure),
        format!("Avg Temperature: {:.2} C", statistics.avg_temperature),
        "Type Distribution:".to_string(),
    ];

    if statistics.type_distribution.is_empty() {
        lines.push("  (none)".to_string());
    }
    lines.extend(
        statistics
            .type_distribution
            .iter()
            .map(|(equipment_type, count)| format!("  {}: {}", equipment_type, count)),
    );

    lines
}

// The standard Courier font only covers printable ASCII.
fn printable(line: &str) -> String {
    line.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

fn page_content(lines: &[String]) -> Result<Vec<u8>, EquipmentError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
        Operation::new("TL", vec![Object::Integer(LINE_HEIGHT)]),
        Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(PAGE_HEIGHT - MARGIN)],
        ),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(printable(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Ok(Content { operations }.encode()?)
}

/// Lays the report lines out as a PDF document and returns its bytes.
pub fn render_report(
    dataset: &Dataset,
    statistics: &DatasetStatistics,
) -> Result<Vec<u8>, EquipmentError> {
    let lines = report_lines(dataset, statistics);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for chunk in lines.chunks(LINES_PER_PAGE) {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(chunk)?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    let page_count = page_ids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| EquipmentError::Report {
            message: format!("Failed to write PDF: {}", e),
        })?;

    Ok(buffer)
}
