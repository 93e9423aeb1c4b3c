//! Integration tests for the template crate
//!
//! Renders templates through the registry and inspects the PDFs with lopdf.

use pretty_assertions::assert_eq;
use serde_json::json;
use template::{parse_document, ApiResponse, Contract, LayoutRenderer, TemplateId, TemplateRegistry};

fn hex(text: &str) -> String {
    let mut out = String::from("<");
    for b in pdf_core::encode_win_ansi(text) {
        out.push_str(&format!("{b:02X}"));
    }
    out.push('>');
    out
}

fn all_content(doc: &lopdf::Document) -> String {
    let mut out = String::new();
    for page_id in doc.get_pages().values() {
        let bytes = doc.get_page_content(*page_id).unwrap();
        out.push_str(&String::from_utf8_lossy(&bytes));
    }
    out
}

fn contract_props() -> serde_json::Value {
    json!({
        "contract": {
            "id": 7,
            "title": "Service Agreement",
            "clauses": [],
            "ownerName": "Acme",
            "recipientName": "Beta Co"
        }
    })
}

#[test]
fn test_contract_renders_two_pages() {
    let bytes = TemplateRegistry::new()
        .render(TemplateId::ContractPdf, &contract_props())
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let content = all_content(&doc);
    assert!(content.contains(&hex("Service Agreement")));
    assert!(content.contains(&hex("Not signed")));
    assert!(content.contains(&hex("Contract #7 - Page 2 of 2")));
}

#[test]
fn test_contract_info_dictionary() {
    let bytes = TemplateRegistry::new()
        .render_by_name("ContractPDF", &contract_props())
        .unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();

    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Service Agreement");
    assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Acme");
}

#[test]
fn test_contract_rendering_is_deterministic() {
    let registry = TemplateRegistry::new();
    let first = registry.render(TemplateId::ContractPdf, &contract_props()).unwrap();
    let second = registry.render(TemplateId::ContractPdf, &contract_props()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_many_clauses_continue_on_next_page() {
    let clauses: Vec<serde_json::Value> = (1..=60)
        .map(|i| json!({ "title": format!("Clause {i}"), "content": "The parties agree to act in good faith in all matters arising under this agreement." }))
        .collect();
    let props = json!({
        "contract": {
            "id": 8,
            "title": "Master Services Agreement",
            "clauses": clauses,
            "ownerName": "Acme",
            "recipientName": "Beta Co"
        }
    });

    let bytes = TemplateRegistry::new()
        .render(TemplateId::ContractPdf, &props)
        .unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert!(doc.get_pages().len() > 2);

    let content = all_content(&doc);
    assert!(content.contains(&hex("60. Clause 60")));
}

#[test]
fn test_document_template_binds_data() {
    let props = json!({
        "document": {
            "info": { "title": "Ticket summary" },
            "pages": [ {
                "nodes": [
                    { "type": "text", "bind": "$.ticket.subject", "font": { "size": 14, "style": "bold" } },
                    { "type": "rule" },
                    {
                        "type": "table",
                        "bind": "$.ticket.replies",
                        "columns": [
                            { "header": "Author", "field": "author" },
                            { "header": "Reply", "field": "body", "width": 3 }
                        ]
                    }
                ]
            } ]
        },
        "data": {
            "ticket": {
                "subject": "Printer offline",
                "replies": [ { "author": "Dana", "body": "Restarted the spooler." } ]
            }
        }
    });

    let bytes = TemplateRegistry::new()
        .render(TemplateId::DocumentPdf, &props)
        .unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    let content = all_content(&doc);
    assert!(content.contains(&hex("Printer offline")));
    assert!(content.contains(&hex("Restarted the spooler.")));
}

#[test]
fn test_parse_and_render_document() {
    let spec = parse_document(
        r#"{
            "pageSize": "letter",
            "footer": { "text": "{page}/{pages}" },
            "pages": [ { "nodes": [ { "type": "text", "text": "Letter page" } ] } ]
        }"#,
    )
    .unwrap();

    let bytes = LayoutRenderer::new(&spec)
        .render_to_bytes(&serde_json::Value::Null)
        .unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    let page_id = doc.get_pages()[&1];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_float().unwrap(), 612.0);

    assert!(all_content(&doc).contains(&hex("1/1")));
}

#[test]
fn test_api_envelope_feeds_contract_template() {
    let envelope: ApiResponse<Contract> = serde_json::from_value(json!({
        "success": true,
        "data": [ { "id": 3, "title": "Retainer", "ownerName": "Acme", "recipientName": "Gamma LLC" } ]
    }))
    .unwrap();

    let props = json!({ "contract": envelope.into_single().unwrap() });
    let bytes = TemplateRegistry::new()
        .render(TemplateId::ContractPdf, &props)
        .unwrap();
    let content = all_content(&lopdf::Document::load_mem(&bytes).unwrap());
    assert!(content.contains(&hex("Gamma LLC")));
}
