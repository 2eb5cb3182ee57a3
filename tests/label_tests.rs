//! # Label Tests
//!
//! End-to-end flows across the crate: content edited in the inline editor is
//! stored in a label document, then projected at print time.

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

use rotulo::config::{EditorConfig, ProjectorConfig, RotuloConfig};
use rotulo::content::{
    self, ContentMode, EditorEvent, FieldMap, FieldOption, InlineEditor, Key, StyleCommand, StyleKind,
};
use rotulo::label::{Barcode, Canvas, Element, Label, ManualField, Output, Paragraph};
use rotulo::project::Values;
use rotulo::project::symbol::{Symbol, Symbology};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn dynamic_options() -> Vec<FieldOption> {
    vec![
        FieldOption::new("lot", "Lote"),
        FieldOption::new("product.name", "Producto"),
        FieldOption::new("netWeightFormatted", "Peso neto"),
    ]
}

fn values(pairs: &[(&str, &str)]) -> Values {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn type_str(editor: &mut InlineEditor, text: &str, now: Instant) -> Option<String> {
    let mut last = None;
    for c in text.chars() {
        if let Some(content) = editor.handle(EditorEvent::Key(Key::Char(c)), now) {
            last = Some(content);
        }
    }
    last
}

fn paragraph(id: &str, html: &str) -> Element {
    let mut p = Paragraph {
        html: html.to_string(),
        ..Default::default()
    };
    p.frame.id = id.to_string();
    Element::Paragraph(p)
}

// ============================================================================
// EDIT, STORE, PRINT
// ============================================================================

#[test]
fn test_edited_paragraph_prints_with_values() {
    let now = Instant::now();
    let mut editor = InlineEditor::new("", dynamic_options(), ContentMode::Html, &EditorConfig::default());

    let typed = type_str(&mut editor, "Lote: {{Lote}}", now);
    assert_eq!(typed.as_deref(), Some("Lote: {{lot}}"));

    let badge = editor.badges()[0];
    editor.handle(EditorEvent::ClickBadge(badge), now);
    let stored = editor
        .handle(EditorEvent::ApplyStyle(StyleCommand::Toggle(StyleKind::Bold)), now)
        .unwrap();
    assert_eq!(stored, "Lote: <b>{{lot}}</b>");

    let mut label = Label::new("Queso", Canvas { width: 60.0, height: 40.0, rotation: 0.0 });
    label.push(paragraph("p1", &stored));

    let rendered = label.render(&values(&[("lot", "A<1")]), &ProjectorConfig::default());
    assert_eq!(
        rendered[0].output,
        Output::Markup {
            html: "Lote: <b>A&lt;1</b>".to_string()
        }
    );
}

#[test]
fn test_stored_content_survives_reload() {
    let fields = FieldMap::from_options(&dynamic_options());
    let stored = "<b>{{product.name}}</b><br>{{netWeightFormatted}} kg";

    let shown = content::to_display(stored, &fields);
    assert_eq!(shown, "<b>{{Producto}}</b><br>{{Peso neto}} kg");
    assert_eq!(content::to_storage(&shown, &fields.invert()), stored);

    let tree = content::load(stored, ContentMode::Html, &fields);
    assert_eq!(content::extract(&tree), stored);
}

#[test]
fn test_manual_keys_feed_the_picker() {
    let now = Instant::now();
    let mut label = Label::new("Caja", Canvas { width: 100.0, height: 50.0, rotation: 0.0 });
    let mut operario = ManualField {
        key: "Operario".into(),
        ..Default::default()
    };
    operario.frame.id = "m1".into();
    label.push(Element::Manual(operario));

    let options = label.field_options(&dynamic_options());
    assert_eq!(options.len(), 4);
    assert_eq!(options[3], FieldOption::manual("Operario"));

    let mut editor = InlineEditor::new("Operario: ", options, ContentMode::Html, &EditorConfig::default());
    let stored = editor.handle(EditorEvent::InsertField("Operario".into()), now).unwrap();
    assert_eq!(stored, "Operario: {{Operario}}");
    label.push(paragraph("p1", &stored));

    let rendered = label.render(&values(&[("Operario", "Ana")]), &ProjectorConfig::default());
    assert_eq!(rendered[0].output.text(), Some("Ana"));
    assert_eq!(rendered[1].output.text(), Some("Operario: Ana"));

    let blank = label.render(&Values::new(), &ProjectorConfig::default());
    assert_eq!(blank[1].output.text(), Some("Operario: {{Operario}}"));
}

#[test]
fn test_plain_barcode_content_and_encoding() {
    let now = Instant::now();
    let mut editor = InlineEditor::new("", dynamic_options(), ContentMode::Plain, &EditorConfig::default());
    type_str(&mut editor, "LOT-", now);
    assert_eq!(editor.handle(EditorEvent::Key(Key::Enter), now), None);
    let stored = type_str(&mut editor, "{{Lote}}", now).unwrap();
    assert_eq!(stored, "LOT-{{lot}}");

    let mut barcode = Barcode {
        barcode_content: stored,
        symbology: Symbology::Code128,
        ..Default::default()
    };
    barcode.frame.id = "b1".into();
    let mut label = Label::new("Palet", Canvas { width: 100.0, height: 150.0, rotation: 90.0 });
    label.push(Element::Barcode(barcode));

    let config = ProjectorConfig::default();
    let rendered = label.render(&values(&[("lot", "2026-17")]), &config);
    match &rendered[0].output {
        Output::Symbol {
            symbol: Symbol::Linear { text, modules },
        } => {
            assert_eq!(text, "LOT-2026-17");
            assert!(!modules.is_empty());
        }
        other => panic!("unexpected output {:?}", other),
    }
    assert!(label.check(&values(&[("lot", "2026-17")]), &config).is_empty());
}

#[test]
fn test_derived_weight_fields() {
    let mut label = Label::new("Peso", Canvas { width: 60.0, height: 40.0, rotation: 0.0 });
    label.push(paragraph("w", "{{netWeightFormatted}} kg / {{netWeight6digits}}"));

    let config = ProjectorConfig::default();
    let rendered = label.render(&values(&[("netWeight", "20,000 kg")]), &config);
    assert_eq!(rendered[0].output.text(), Some("20,00 kg / 002000"));

    let unresolved = label.render(&Values::new(), &config);
    assert_eq!(
        unresolved[0].output.text(),
        Some("{{netWeightFormatted}} kg / {{netWeight6digits}}")
    );

    let with_default = ProjectorConfig {
        net_weight_default: Some("1,5".to_string()),
        ..ProjectorConfig::default()
    };
    let rendered = label.render(&Values::new(), &with_default);
    assert_eq!(rendered[0].output.text(), Some("1,50 kg / 000150"));
}

#[test]
fn test_clock_variables_in_labels() {
    let mut label = Label::new("Fecha", Canvas { width: 60.0, height: 40.0, rotation: 0.0 });
    label.push(paragraph("d", "Envasado {{date}}"));
    let now = Local.with_ymd_and_hms(2026, 1, 27, 9, 30, 0).single().unwrap();

    let rendered = label.render_at(&Values::new(), &ProjectorConfig::default(), now);
    assert_eq!(rendered[0].output.text(), Some("Envasado 27/01/2026"));

    let off = ProjectorConfig {
        builtins: false,
        ..ProjectorConfig::default()
    };
    let rendered = label.render_at(&Values::new(), &off, now);
    assert_eq!(rendered[0].output.text(), Some("Envasado {{date}}"));
}

#[test]
fn test_external_value_waits_for_quiet_editor() {
    let config: RotuloConfig = serde_json::from_str(r#"{"editor": {"quiescence_ms": 50}}"#).unwrap();
    let start = Instant::now();
    let mut editor = InlineEditor::new("a", dynamic_options(), ContentMode::Html, &config.editor);

    type_str(&mut editor, "b", start);
    editor.set_value("{{lot}}", start + Duration::from_millis(10));
    assert_eq!(editor.content(), "ab");

    assert!(editor.tick(start + Duration::from_millis(100)));
    assert_eq!(editor.content(), "{{lot}}");
    assert_eq!(editor.badges().len(), 1);
}

#[test]
fn test_label_json_from_designer() {
    let json = r#"{
        "id": "x",
        "name": "Designer",
        "canvas": {"width": 50, "height": 30},
        "elements": [
            {"type": "manual", "id": "a", "key": "Turno"},
            {"type": "select", "id": "b", "key": "Turno", "options": ["M", "T"]},
            {"type": "qr", "id": "c", "qrContent": "{{lot}}"}
        ]
    }"#;
    let label = Label::from_json(json).unwrap();
    assert_eq!(label.duplicate_keys(), vec!["Turno".to_string()]);

    let issues = label.check(&Values::new(), &ProjectorConfig::default());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].element, None);
}
