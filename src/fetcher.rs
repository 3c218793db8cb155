use async_trait::async_trait;

use crate::data_models::{DateWindow, DocumentRecord, PageRange};
use crate::decoder;
use crate::envelope;
use crate::error::Result;
use crate::session::SessionContext;
use crate::transport::{Service, Transport};

/// Status reported for a request that got no HTTP response at all.
pub const NO_RESPONSE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Runs the query text; opens a search id for the window.
    Search,
    /// Pages through an existing search id.
    Range,
}

/// Parameters of one page request.
#[derive(Debug, Clone)]
pub struct PageQuery<'a> {
    pub query: &'a str,
    pub source_id: i64,
    pub window: DateWindow,
    pub pages: PageRange,
    pub search_id: Option<&'a str>,
}

/// Outcome of one page request.
#[derive(Debug, Clone, Default)]
pub struct PageResult {
    pub status_code: u16,
    pub total_matches: u64,
    pub search_id: Option<String>,
    pub documents: Vec<DocumentRecord>,
}

impl PageResult {
    pub fn failed(status_code: u16) -> PageResult {
        PageResult {
            status_code,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Fetches a single page. Request failures, including ones that never got a
/// response, are reported through `status_code` rather than as errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        session: &SessionContext,
        mode: FetchMode,
        query: &PageQuery<'_>,
    ) -> Result<PageResult>;

    /// Full text of one document; `None` when it cannot be retrieved.
    async fn full_text(&self, _session: &SessionContext, _doc_id: &str) -> Option<String> {
        None
    }
}

/// Page fetcher speaking the SOAP protocol over a [`Transport`].
pub struct WskPageFetcher<T: Transport> {
    transport: T,
}

impl<T: Transport> WskPageFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> PageFetcher for WskPageFetcher<T> {
    async fn fetch(
        &self,
        session: &SessionContext,
        mode: FetchMode,
        query: &PageQuery<'_>,
    ) -> Result<PageResult> {
        let (service, payload) = match (mode, query.search_id) {
            (FetchMode::Range, Some(search_id)) => (
                Service::Retrieval,
                envelope::documents_by_range(session, search_id, query.pages),
            ),
            (FetchMode::Range, None) => {
                log::warn!("range fetch without a search id, re-running the search instead");
                (Service::Search, search_payload(session, query))
            }
            (FetchMode::Search, _) => (Service::Search, search_payload(session, query)),
        };

        let res = match self.transport.post(service, payload).await {
            Ok(res) => res,
            Err(e) => {
                log::warn!("{service} request for {} got no response: {e}", query.window);
                return Ok(PageResult::failed(NO_RESPONSE));
            }
        };
        if !res.is_success() {
            return Ok(PageResult::failed(res.status));
        }

        let page = decoder::decode_page(&res.body);
        Ok(PageResult {
            status_code: res.status,
            total_matches: page.total_matches,
            search_id: page.search_id,
            documents: page.documents,
        })
    }

    async fn full_text(&self, session: &SessionContext, doc_id: &str) -> Option<String> {
        let payload = envelope::documents_by_id(session, doc_id);
        match self.transport.post(Service::Retrieval, payload).await {
            Ok(res) if res.is_success() => match decoder::decode_full_text(&res.body) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("could not decode full text of {doc_id}: {e}");
                    None
                }
            },
            Ok(res) => {
                log::warn!("full text request for {doc_id} failed with status {}", res.status);
                None
            }
            Err(e) => {
                log::warn!("full text request for {doc_id} failed: {e}");
                None
            }
        }
    }
}

fn search_payload(session: &SessionContext, query: &PageQuery<'_>) -> String {
    envelope::search(
        session,
        query.query,
        query.source_id,
        query.window,
        query.pages,
    )
}
