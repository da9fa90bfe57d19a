//! Integration tests for rendering and document loading.

use std::fs;

use pageflow::model::{PageAreaProperties, Placement};
use pageflow::render::{collect_content, to_json, to_text};
use pageflow::{
    Block, BlockSequence, Document, JsonFormat, LayoutMaster, PageSelection, Pageflow,
    RenderEvent, RenderOptions, StreamingRenderer,
};

const DOCUMENT: &str = r#"{
    "sections": [
        {
            "master": {"page_width": 14, "page_height": 3, "inner_margin": 2, "outer_margin": 1, "duplex": true},
            "blocks": [
                {"segments": [{"type": "text", "text": "alpha beta gamma delta"}]},
                {"segments": [{"type": "text", "text": "last"}], "properties": {"id": "last"}}
            ]
        }
    ]
}"#;

fn note(text: &str) -> Block {
    let mut block = Block::paragraph(text);
    block.properties.placement = Placement::PageArea;
    block
}

#[test]
fn test_text_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    fs::write(&path, DOCUMENT).unwrap();

    let text = pageflow::to_text(&path, &RenderOptions::new().with_page_separator("=\n")).unwrap();
    assert_eq!(text, "alpha beta\ngamma delta\nlast\n");
}

#[test]
fn test_margins_alternate_between_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    fs::write(&path, DOCUMENT.replace("\"page_height\": 3", "\"page_height\": 1")).unwrap();

    let text = Pageflow::new()
        .with_margins()
        .with_page_separator("")
        .paginate_file(&path)
        .unwrap()
        .to_text()
        .unwrap();
    assert_eq!(text, "  alpha beta\n gamma delta\n  last\n");
}

#[test]
fn test_json_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    fs::write(&path, DOCUMENT).unwrap();

    let json = pageflow::to_json(&path, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let sheet = &value["sheets"][0];
    assert_eq!(sheet["duplex"], true);
    assert_eq!(sheet["breakable"], true);
    assert_eq!(sheet["pages"][0]["margin"], 2);
    assert_eq!(sheet["pages"][0]["rows"][1], "gamma delta");
    assert_eq!(sheet["pages"][0]["identifiers"][0], "last");
}

#[test]
fn test_invalid_document_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"sections\": [{}]}").unwrap();
    assert!(matches!(
        pageflow::paginate_file(&path),
        Err(pageflow::Error::Json(_))
    ));
}

#[test]
fn test_page_area_rendered_at_bottom() {
    let master = LayoutMaster::new(10, 4).with_page_area(PageAreaProperties {
        max_height: 1,
        ..Default::default()
    });
    let section = BlockSequence::new(master)
        .with_block(Block::paragraph("a"))
        .with_block(note("n1"))
        .with_block(Block::paragraph("b"))
        .with_block(note("n2"))
        .with_block(Block::paragraph("c"));
    let mut doc = Document::new();
    doc.add_section(section);

    let result = pageflow::paginate(&doc).unwrap();
    let text = to_text(&result.sheets, &RenderOptions::new().with_page_separator("")).unwrap();
    assert_eq!(text, "a\nb\n\nn1\nc\n\n\nn2\n");
}

#[test]
fn test_page_selection_in_text() {
    let section = BlockSequence::new(LayoutMaster::new(10, 1))
        .with_block(Block::paragraph("one"))
        .with_block(Block::paragraph("two"))
        .with_block(Block::paragraph("three"));
    let mut doc = Document::new();
    doc.add_section(section);
    let result = pageflow::paginate(&doc).unwrap();

    let options = RenderOptions::new()
        .with_page_separator("|")
        .with_pages(PageSelection::parse("2-3").unwrap());
    assert_eq!(to_text(&result.sheets, &options).unwrap(), "two\n|three\n");
}

#[test]
fn test_page_selection_uses_printed_numbers() {
    let mut doc = Document::new();
    doc.add_section(
        BlockSequence::new(LayoutMaster::new(10, 1))
            .with_block(Block::paragraph("one"))
            .with_block(Block::paragraph("two")),
    );
    doc.add_section(
        BlockSequence::new(LayoutMaster::new(10, 1))
            .with_initial_page_number(10)
            .with_block(Block::paragraph("ten"))
            .with_block(Block::paragraph("eleven")),
    );
    let result = pageflow::paginate(&doc).unwrap();

    // The third page is printed as 10, so "3" selects nothing there.
    let selected = |pages: &str| {
        let options = RenderOptions::new()
            .with_page_separator("|")
            .with_pages(PageSelection::parse(pages).unwrap());
        to_text(&result.sheets, &options).unwrap()
    };
    assert_eq!(selected("10"), "ten\n");
    assert_eq!(selected("2-10"), "two\n|ten\n");
    assert_eq!(selected("3,4"), "");
}

#[test]
fn test_backwards_page_range_is_an_error() {
    assert!(matches!(
        PageSelection::parse("11-10"),
        Err(pageflow::Error::PageSelection(_))
    ));
}

#[test]
fn test_streaming_matches_text() {
    let doc = Document::from_json(DOCUMENT).unwrap();
    let result = pageflow::paginate(&doc).unwrap();

    let events: Vec<_> = StreamingRenderer::new(&result.sheets, RenderOptions::default()).collect();
    let page_starts = events
        .iter()
        .filter(|e| matches!(e, RenderEvent::PageStart { .. }))
        .count();
    let page_ends = events
        .iter()
        .filter(|e| matches!(e, RenderEvent::PageEnd { .. }))
        .count();
    assert_eq!(page_starts, result.page_count());
    assert_eq!(page_starts, page_ends);

    let streamed = collect_content(StreamingRenderer::new(&result.sheets, RenderOptions::default()));
    let text = to_text(&result.sheets, &RenderOptions::new().with_page_separator("")).unwrap();
    assert_eq!(streamed, text);
}

#[test]
fn test_json_pretty_round_trips_through_serde() {
    let doc = Document::from_json(DOCUMENT).unwrap();
    let result = pageflow::paginate(&doc).unwrap();
    let json = to_json(&result.sheets, JsonFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["sheets"].as_array().map(Vec::len), Some(result.sheet_count()));
}
