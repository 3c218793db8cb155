use std::ops::ControlFlow;

use anyhow::Result;
use async_trait::async_trait;

use crate::data_models::{DocumentRecord, SearchRequest, StoredDocument};
use crate::db::ResultRepo;
use crate::session::SessionContext;

/// Receives finished result batches from a traversal.
#[async_trait]
pub trait ResultSink: Send {
    /// Called once per page, possibly with an empty slice.
    async fn emit_batch(&mut self, documents: &[DocumentRecord]) -> Result<()>;

    /// Called when a one-day window was rejected and had to be abandoned.
    /// `Continue` moves on to the next window, `Break` ends the traversal.
    fn on_fatal(&mut self, reason: &str) -> ControlFlow<()> {
        log::error!("traversal aborted: {reason}");
        ControlFlow::Break(())
    }
}

/// Keeps every batch in memory, in delivery order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub batches: Vec<Vec<DocumentRecord>>,
    pub fatal: Vec<String>,
    continue_on_fatal: bool,
}

impl CollectingSink {
    /// Stops the traversal at the first abandoned window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records abandoned windows and keeps going.
    pub fn continuing() -> Self {
        Self {
            continue_on_fatal: true,
            ..Self::default()
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.batches.iter().flatten()
    }
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn emit_batch(&mut self, documents: &[DocumentRecord]) -> Result<()> {
        self.batches.push(documents.to_vec());
        Ok(())
    }

    fn on_fatal(&mut self, reason: &str) -> ControlFlow<()> {
        self.fatal.push(reason.to_string());
        if self.continue_on_fatal {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

/// Writes batches to the results collection, stamped with session details.
pub struct MongoResultSink {
    repo: ResultRepo,
    session_id: i64,
    project_id: String,
    query: String,
    source_id: i64,
}

impl MongoResultSink {
    pub fn new(repo: ResultRepo, session: &SessionContext, request: &SearchRequest) -> Self {
        Self {
            repo,
            session_id: session.session_id,
            project_id: session.project_id.clone(),
            query: request.query.clone(),
            source_id: request.source_id,
        }
    }
}

#[async_trait]
impl ResultSink for MongoResultSink {
    async fn emit_batch(&mut self, documents: &[DocumentRecord]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let prepared: Vec<StoredDocument> = documents
            .iter()
            .cloned()
            .map(|doc| {
                StoredDocument::new(
                    doc,
                    self.session_id,
                    self.project_id.clone(),
                    self.query.clone(),
                    self.source_id,
                )
            })
            .collect();
        match self.repo.insert_many(&prepared).await {
            Ok(ids) => {
                log::info!("inserted {} results to mongo db", ids.len());
                Ok(())
            }
            Err(e) => {
                log::error!("error inserting to mongo, error: {:#}", e);
                Err(e)
            }
        }
    }

    fn on_fatal(&mut self, reason: &str) -> ControlFlow<()> {
        log::error!("skipping window: {reason}");
        ControlFlow::Continue(())
    }
}
