#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub struct FakeDoc<'a> {
    pub id: &'a str,
    pub headline: &'a str,
    pub publication: &'a str,
    pub pub_date: &'a str,
    pub length: &'a str,
    pub attachment_id: Option<&'a str>,
}

impl<'a> FakeDoc<'a> {
    pub fn new(id: &'a str, headline: &'a str) -> Self {
        Self {
            id,
            headline,
            publication: "The Times",
            pub_date: "August 1, 2017",
            length: "512 words",
            attachment_id: None,
        }
    }

    pub fn html(&self) -> String {
        let attachment = self
            .attachment_id
            .map(|id| format!(r#"<span class="attachmentId" id="{id}"></span>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body>
<div class="HEADLINE">{}</div>
<div class="PUB">{}</div>
<div class="PUB-DATE"><span>{}</span></div>
<div class="LENGTH">{}</div>
{attachment}
</body></html>"#,
            self.headline, self.publication, self.pub_date, self.length
        )
    }

    pub fn container(&self) -> String {
        container(self.id, &STANDARD.encode(self.html()))
    }
}

pub fn container(id: &str, payload: &str) -> String {
    format!(
        "<ns1:documentContainer><ns1:documentId>{id}</ns1:documentId><ns1:document>{payload}</ns1:document></ns1:documentContainer>"
    )
}

/// A search/range response with the given count and raw containers.
pub fn search_response(search_id: Option<&str>, found: Option<&str>, containers: &[String]) -> String {
    let search_id = search_id
        .map(|id| format!("<ns1:searchId>{id}</ns1:searchId>"))
        .unwrap_or_default();
    let found = found
        .map(|n| format!("<ns1:documentsFound>{n}</ns1:documentsFound>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body>
<ns1:SearchResponse xmlns:ns1="http://search.search.services.v1.wsapi.lexisnexis.com">
{search_id}{found}
<ns1:documentContainerList>{}</ns1:documentContainerList>
</ns1:SearchResponse>
</soapenv:Body>
</soapenv:Envelope>"#,
        containers.concat()
    )
}

pub fn full_text_response(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body>
<ns2:GetDocumentsByDocumentIdResponse xmlns:ns2="http://getdocumentsbydocumentid.retrieve.services.v1.wsapi.lexisnexis.com">
<ns2:documentContainerList><ns2:documentContainer>
<ns2:documentId>X</ns2:documentId>
<ns2:document>{}</ns2:document>
</ns2:documentContainer></ns2:documentContainerList>
</ns2:GetDocumentsByDocumentIdResponse>
</soapenv:Body>
</soapenv:Envelope>"#,
        STANDARD.encode(text)
    )
}
