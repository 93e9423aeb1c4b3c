//! Contract template
//!
//! Maps a [`Contract`] record to a two-page [`DocumentSpec`]: header band,
//! owner/recipient contact columns, body, numbered clauses, and a signature
//! page. Missing optional fields render as placeholders.

use crate::schema::*;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Shown in place of a missing signature date
pub const NOT_SIGNED: &str = "Not signed";

/// Shown in place of any other missing field
pub const NOT_AVAILABLE: &str = "N/A";

const BRAND: Color = Color {
    r: 0.122,
    g: 0.227,
    b: 0.373,
};

const MUTED: Color = Color {
    r: 0.4,
    g: 0.4,
    b: 0.4,
};

/// Props accepted by the contract template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractProps {
    pub contract: Contract,
}

/// Contract record as served by the dashboard API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    pub owner_name: String,
    pub recipient_name: String,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub owner_signed_at: Option<String>,
    #[serde(default)]
    pub recipient_signed_at: Option<String>,
}

/// A clause is either a bare paragraph or a titled section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Clause {
    Text(String),
    Section { title: String, content: String },
}

/// Format a date field for display
///
/// Accepts `YYYY-MM-DD` or RFC 3339 timestamps; anything else is shown as given.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));

    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// Format a monetary amount with thousands separators and two decimals
pub fn format_amount(value: f64, currency: Option<&str>) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    let amount = format!("{sign}{grouped}.{:02}", cents % 100);
    match currency {
        Some(code) if !code.trim().is_empty() => format!("{} {amount}", code.trim()),
        _ => amount,
    }
}

fn or_placeholder(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn date_or(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => format_date(v),
        _ => placeholder.to_string(),
    }
}

fn heading(text: &str) -> Node {
    Node::Text(
        TextNode {
            text: Some(text.to_string()),
            font: Font::new(13.0).bold().color(BRAND),
            ..TextNode::default()
        }
        .space_after(6.0),
    )
}

fn label(text: &str) -> Node {
    Node::Text(
        TextNode {
            text: Some(text.to_string()),
            font: Font::new(8.0).bold().color(MUTED),
            ..TextNode::default()
        }
        .space_after(2.0),
    )
}

/// Regular 10pt paragraph
fn line(text: String, space_after: f64) -> Node {
    Node::Text(
        TextNode {
            text: Some(text),
            ..TextNode::default()
        }
        .space_after(space_after),
    )
}

fn party(
    role: &str,
    name: &str,
    email: &Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
) -> Vec<Node> {
    vec![
        label(role),
        Node::Text(
            TextNode {
                text: Some(name.to_string()),
                font: Font::new(11.0).bold(),
                ..TextNode::default()
            }
            .space_after(2.0),
        ),
        line(format!("Email: {}", or_placeholder(email)), 0.0),
        line(format!("Phone: {}", or_placeholder(phone)), 0.0),
        line(format!("Address: {}", or_placeholder(address)), 4.0),
    ]
}

fn header_band(contract: &Contract) -> Node {
    let white = Color::white();
    let status = contract
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE);

    let mut band = BoxNode::new(vec![
        Node::Text(
            TextNode {
                text: Some("SERVICE CONTRACT".to_string()),
                font: Font::new(8.0).bold().color(white),
                ..TextNode::default()
            }
            .space_after(2.0),
        ),
        Node::Text(
            TextNode {
                text: Some(contract.title.clone()),
                font: Font::new(18.0).bold().color(white),
                ..TextNode::default()
            }
            .space_after(2.0),
        ),
        Node::Text(
            TextNode {
                text: Some(format!("Contract #{}  |  Status: {status}", contract.id)),
                font: Font::new(9.0).color(white),
                ..TextNode::default()
            }
            .space_after(0.0),
        ),
    ]);
    band.fill = Some(BRAND);
    band.padding = 14.0;
    band.space_after = 16.0;
    Node::Box(band)
}

fn terms(contract: &Contract) -> Node {
    let value = contract
        .value
        .map(|v| format_amount(v, contract.currency.as_deref()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let cell = |title: &str, value: String| vec![label(title), line(value, 0.0)];

    let mut boxed = BoxNode::new(vec![Node::Columns(ColumnsNode {
        space_after: 0.0,
        ..ColumnsNode::new(vec![
            cell("START DATE", date_or(&contract.start_date, NOT_AVAILABLE)),
            cell("END DATE", date_or(&contract.end_date, NOT_AVAILABLE)),
            cell("CONTRACT VALUE", value),
        ])
    })]);
    boxed.fill = Some(Color::from_rgb(243, 246, 250));
    boxed.border = Some(Border::new(Color::from_rgb(214, 221, 230), 0.5));
    boxed.space_after = 14.0;
    Node::Box(boxed)
}

fn clauses(contract: &Contract) -> Vec<Node> {
    let mut nodes = vec![heading("Terms and Conditions")];

    if contract.clauses.is_empty() {
        nodes.push(Node::text(
            "No additional clauses have been specified for this contract.",
            Font::new(10.0).italic().color(MUTED),
        ));
        return nodes;
    }

    for (i, clause) in contract.clauses.iter().enumerate() {
        let n = i + 1;
        match clause {
            Clause::Text(text) => {
                nodes.push(line(format!("{n}. {text}"), 6.0));
            }
            Clause::Section { title, content } => {
                nodes.push(Node::Text(
                    TextNode {
                        text: Some(format!("{n}. {title}")),
                        font: Font::new(10.0).bold(),
                        ..TextNode::default()
                    }
                    .space_after(2.0),
                ));
                nodes.push(line(content.clone(), 6.0));
            }
        }
    }

    nodes
}

fn signature_page(contract: &Contract) -> PageSpec {
    let mut table = TableNode::new(
        vec![
            TableColumn::new("Party", 1.0),
            TableColumn::new("Name", 1.6),
            TableColumn::new("Signature", 1.6),
            TableColumn::new("Date", 1.2),
        ],
        vec![
            vec![
                "Owner".to_string(),
                contract.owner_name.clone(),
                String::new(),
                date_or(&contract.owner_signed_at, NOT_SIGNED),
            ],
            vec![
                "Recipient".to_string(),
                contract.recipient_name.clone(),
                String::new(),
                date_or(&contract.recipient_signed_at, NOT_SIGNED),
            ],
        ],
    );
    table.header_fill = Some(Color::from_rgb(230, 236, 245));
    table.border = Some(Border::new(Color::from_rgb(160, 170, 185), 0.5));
    table.min_row_height = 48.0;
    table.cell_padding = 6.0;

    PageSpec::new(vec![
        heading("Signatures"),
        Node::text(
            format!(
                "By signing below, {} and {} agree to the terms of contract #{}.",
                contract.owner_name, contract.recipient_name, contract.id
            ),
            Font::new(10.0),
        ),
        Node::spacer(8.0),
        Node::Table(table),
    ])
}

/// Build the contract document description
pub fn contract_document(contract: &Contract) -> DocumentSpec {
    let body = contract
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "This agreement is entered into by {} (the \"Owner\") and {} (the \"Recipient\"). \
                 The parties agree to the terms and conditions set out below.",
                contract.owner_name, contract.recipient_name
            )
        });

    let mut first = vec![
        header_band(contract),
        Node::Columns(ColumnsNode {
            space_after: 12.0,
            ..ColumnsNode::new(vec![
                party(
                    "OWNER",
                    &contract.owner_name,
                    &contract.owner_email,
                    &contract.owner_phone,
                    &contract.owner_address,
                ),
                party(
                    "RECIPIENT",
                    &contract.recipient_name,
                    &contract.recipient_email,
                    &contract.recipient_phone,
                    &contract.recipient_address,
                ),
            ])
        }),
        terms(contract),
        heading("Agreement"),
        line(body, 10.0),
        Node::rule(),
    ];
    first.extend(clauses(contract));

    DocumentSpec {
        info: DocumentMeta {
            title: Some(contract.title.clone()),
            author: Some(contract.owner_name.clone()),
            subject: Some(format!("Contract #{}", contract.id)),
        },
        page_size: PageFormat::A4,
        margins: Margins::uniform(50.0),
        footer: Some(Footer {
            text: format!("Contract #{} - Page {{page}} of {{pages}}", contract.id),
            font: Font::new(8.0).color(Color::gray()),
            align: Align::Center,
        }),
        pages: vec![PageSpec::new(first), signature_page(contract)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::DrawOp;
    use crate::LayoutRenderer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn minimal() -> Contract {
        serde_json::from_value(json!({
            "id": 7,
            "title": "Service Agreement",
            "clauses": [],
            "ownerName": "Acme",
            "recipientName": "Beta Co"
        }))
        .unwrap()
    }

    fn page_texts(contract: &Contract) -> Vec<Vec<String>> {
        let spec = contract_document(contract);
        LayoutRenderer::new(&spec)
            .layout(&json!({}))
            .unwrap()
            .iter()
            .map(|page| {
                page.iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05"), "March 5, 2024");
        assert_eq!(format_date("2024-12-31T10:00:00Z"), "December 31, 2024");
        assert_eq!(format_date("next week"), "next week");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(12500.0, Some("USD")), "USD 12,500.00");
        assert_eq!(format_amount(999.999, None), "1,000.00");
        assert_eq!(format_amount(-42.5, Some("EUR")), "EUR -42.50");
        assert_eq!(format_amount(0.0, Some(" ")), "0.00");
    }

    #[test]
    fn test_clause_shapes() {
        let clauses: Vec<Clause> = serde_json::from_value(json!([
            "Payment is due within 30 days.",
            { "title": "Confidentiality", "content": "Both parties keep terms private." }
        ]))
        .unwrap();
        assert_eq!(clauses[0], Clause::Text("Payment is due within 30 days.".to_string()));
        assert!(matches!(&clauses[1], Clause::Section { title, .. } if title == "Confidentiality"));
    }

    #[test]
    fn test_minimal_contract_has_two_pages_with_placeholders() {
        let pages = page_texts(&minimal());
        assert_eq!(pages.len(), 2);

        assert!(pages[0].contains(&"Service Agreement".to_string()));
        assert!(pages[0].contains(&"Email: N/A".to_string()));
        assert!(pages[0]
            .iter()
            .any(|t| t.starts_with("No additional clauses")));

        let signed: Vec<&String> = pages[1].iter().filter(|t| *t == NOT_SIGNED).collect();
        assert_eq!(signed.len(), 2);
        assert_eq!(pages[1].last().unwrap(), "Contract #7 - Page 2 of 2");
    }

    #[test]
    fn test_clauses_are_numbered() {
        let mut contract = minimal();
        contract.clauses = vec![
            Clause::Text("Scope of work.".to_string()),
            Clause::Section {
                title: "Termination".to_string(),
                content: "Either party may terminate with notice.".to_string(),
            },
        ];
        let pages = page_texts(&contract);
        assert!(pages[0].contains(&"1. Scope of work.".to_string()));
        assert!(pages[0].contains(&"2. Termination".to_string()));
    }

    #[test]
    fn test_signature_dates_are_formatted() {
        let mut contract = minimal();
        contract.owner_signed_at = Some("2024-01-15".to_string());
        let pages = page_texts(&contract);
        assert!(pages[1].contains(&"January 15, 2024".to_string()));
        assert!(pages[1].contains(&NOT_SIGNED.to_string()));
    }

    #[test]
    fn test_document_is_deterministic() {
        let contract = minimal();
        assert_eq!(contract_document(&contract), contract_document(&contract));
    }
}
