//! Pulls search ids, result counts and document metadata out of service
//! responses.
//!
//! Responses come back with vendor namespace prefixes that vary between
//! services (`ns1:documentId`, `ns2:documentsFound`, ...), so lookups match on
//! a fragment of the lower-cased tag name rather than an exact path.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use scraper::{ElementRef, Html, Selector};

use crate::data_models::DocumentRecord;
use crate::error::DecodeError;

/// Everything the engine needs from one search or range response.
#[derive(Debug, Clone, Default)]
pub struct DecodedPage {
    pub search_id: Option<String>,
    /// Zero when the count is absent or unparsable.
    pub total_matches: u64,
    pub documents: Vec<DocumentRecord>,
    /// Containers that could not be turned into a record.
    pub skipped: usize,
}

pub fn decode_page(body: &str) -> DecodedPage {
    let soup = Html::parse_document(body);

    let search_id = find_tag_containing(&soup, "searchid")
        .map(text_of)
        .filter(|s| !s.is_empty());
    let total_matches = result_count(&soup).unwrap_or(0);

    let mut documents = Vec::new();
    let mut skipped = 0;
    for (idx, container) in document_containers(&soup).into_iter().enumerate() {
        match decode_container(container) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                skipped += 1;
                log::warn!("could not process document {idx}: {e}");
            }
        }
    }

    DecodedPage {
        search_id,
        total_matches,
        documents,
        skipped,
    }
}

/// Full text from a `GetDocumentsByDocumentId` response.
pub fn decode_full_text(body: &str) -> Result<String, DecodeError> {
    let soup = Html::parse_document(body);
    let payload = elements(&soup)
        .find(|el| local_name(el) == "document")
        .map(text_of)
        .ok_or(DecodeError::MissingField("document"))?;
    decode_base64_utf8(&payload)
}

fn result_count(soup: &Html) -> Option<u64> {
    find_tag_containing(soup, "documentsfound").and_then(|el| text_of(el).parse().ok())
}

fn elements(soup: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    soup.root_element().descendants().filter_map(ElementRef::wrap)
}

fn find_tag_containing<'a>(soup: &'a Html, fragment: &str) -> Option<ElementRef<'a>> {
    elements(soup).find(|el| el.value().name().contains(fragment))
}

/// Tag name with any namespace prefix removed.
fn local_name<'a>(el: &ElementRef<'a>) -> &'a str {
    let name = el.value().name();
    name.rsplit(':').next().unwrap_or(name)
}

fn document_containers(soup: &Html) -> Vec<ElementRef<'_>> {
    elements(soup)
        .filter(|el| {
            let name = el.value().name();
            name.contains("documentcontainer") && !name.contains("documentcontainerlist")
        })
        .collect()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn decode_base64_utf8(payload: &str) -> Result<String, DecodeError> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned)?;
    Ok(String::from_utf8(bytes)?)
}

fn decode_container(container: ElementRef<'_>) -> Result<DocumentRecord, DecodeError> {
    let doc_id = container
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name().contains("documentid"))
        .map(text_of)
        .filter(|id| !id.is_empty())
        .ok_or(DecodeError::MissingField("documentId"))?;

    let payload = container
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| local_name(el) == "document")
        .map(text_of)
        .ok_or(DecodeError::MissingField("document"))?;

    let html = decode_base64_utf8(&payload)?;
    let doc = Html::parse_document(&html);

    Ok(DocumentRecord {
        doc_id,
        headline: select_text(&doc, "div.HEADLINE")?,
        publication: select_text(&doc, "div.PUB")?,
        pub_date: select_text(&doc, "div.PUB-DATE span")?,
        length: select_text(&doc, "div.LENGTH")?,
        attachment_id: select_attr(&doc, "span.attachmentId", "id")?,
        full_text: None,
    })
}

fn selector(css: &str) -> Result<Selector, DecodeError> {
    Selector::parse(css).map_err(|e| DecodeError::Selector(format!("{css}: {e}")))
}

/// Text of the first match, empty when nothing matches.
fn select_text(doc: &Html, css: &str) -> Result<String, DecodeError> {
    let sel = selector(css)?;
    Ok(doc.select(&sel).next().map(text_of).unwrap_or_default())
}

fn select_attr(doc: &Html, css: &str, attr: &str) -> Result<String, DecodeError> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or_default()
        .to_string())
}
