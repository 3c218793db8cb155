//! SOAP request bodies for the search and retrieval services.

use crate::data_models::{DATE_FORMAT, DateWindow, PageRange};
use crate::session::SessionContext;

const ENVELOPE_OPEN: &str = r#"<SOAP-ENV:Envelope
    xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#;

const ENVELOPE_CLOSE: &str = r#"
  </soap:Body>
</SOAP-ENV:Envelope>"#;

const RESULT_NS: &str = "http://result.common.services.v1.wsapi.lexisnexis.com";
const SEARCH_COMMON_NS: &str = "http://common.search.services.v1.wsapi.lexisnexis.com";

/// Escape text for use inside an element or attribute value.
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn wrap(body: String) -> String {
    format!("{ENVELOPE_OPEN}\n{body}{ENVELOPE_CLOSE}")
}

fn document_range(range: PageRange) -> String {
    format!(
        r#"<documentRange xmlns="{RESULT_NS}">
          <begin>{}</begin>
          <end>{}</end>
        </documentRange>"#,
        range.begin, range.end
    )
}

/// First page of a date window; also opens the server-side search handle.
pub fn search(
    session: &SessionContext,
    query: &str,
    source_id: i64,
    window: DateWindow,
    range: PageRange,
) -> String {
    wrap(format!(
        r#"    <Search xmlns="http://search.search.services.v1.wsapi.lexisnexis.com">
      <binarySecurityToken>{token}</binarySecurityToken>
      <sourceInformation>
        <sourceIdList xmlns="{SEARCH_COMMON_NS}">
          <sourceId xmlns="http://common.services.v1.wsapi.lexisnexis.com">{source_id}</sourceId>
        </sourceIdList>
      </sourceInformation>
      <query>{query}</query>
      <projectId>{project}</projectId>
      <searchOptions>
        <sortOrder xmlns="{SEARCH_COMMON_NS}">Date</sortOrder>
        <dateRestriction xmlns="{SEARCH_COMMON_NS}">
          <startDate>{start}</startDate>
          <endDate>{end}</endDate>
        </dateRestriction>
      </searchOptions>
      <retrievalOptions>
        <documentView xmlns="{RESULT_NS}">Cite</documentView>
        <documentMarkup xmlns="{RESULT_NS}">Display</documentMarkup>
        {range}
      </retrievalOptions>
    </Search>"#,
        token = escape_xml(&session.auth_token),
        query = escape_xml(query),
        project = escape_xml(&session.project_id),
        start = window.start.format(DATE_FORMAT),
        end = window.end.format(DATE_FORMAT),
        range = document_range(range),
    ))
}

/// Later pages of a window, addressed by the search id the first page returned.
pub fn documents_by_range(session: &SessionContext, search_id: &str, range: PageRange) -> String {
    wrap(format!(
        r#"    <GetDocumentsByRange xmlns="http://getdocumentsbyrange.retrieve.services.v1.wsapi.lexisnexis.com">
      <binarySecurityToken>{token}</binarySecurityToken>
      <searchId>{search_id}</searchId>
      <retrievalOptions>
        <documentView xmlns="{RESULT_NS}">FullTextWithTerms</documentView>
        <documentMarkup xmlns="{RESULT_NS}">Display</documentMarkup>
        {range}
      </retrievalOptions>
    </GetDocumentsByRange>"#,
        token = escape_xml(&session.auth_token),
        search_id = escape_xml(search_id),
        range = document_range(range),
    ))
}

pub fn documents_by_id(session: &SessionContext, doc_id: &str) -> String {
    wrap(format!(
        r#"    <GetDocumentsByDocumentId xmlns="http://getdocumentsbydocumentid.retrieve.services.v1.wsapi.lexisnexis.com">
      <binarySecurityToken>{token}</binarySecurityToken>
      <documentIdList>
        <documentId>{doc_id}</documentId>
      </documentIdList>
      <retrievalOptions>
        <documentView>FullTextWithTerms</documentView>
        <documentMarkup>Display</documentMarkup>
      </retrievalOptions>
    </GetDocumentsByDocumentId>"#,
        token = escape_xml(&session.auth_token),
        doc_id = escape_xml(doc_id),
    ))
}
