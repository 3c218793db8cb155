use crate::config::Config;
use crate::data_models::SearchRequest;
use crate::error::Result;
use crate::fetcher::WskPageFetcher;
use crate::session::SessionContext;
use crate::transport::{HttpTransport, Transport};
use crate::traversal::{Traversal, TraversalLimits};

/// Entry point for running searches against one service environment.
pub struct WskClient<T: Transport = HttpTransport> {
    session: SessionContext,
    fetcher: WskPageFetcher<T>,
    limits: TraversalLimits,
}

impl WskClient<HttpTransport> {
    pub fn from_config(config: &Config) -> Self {
        let limits = TraversalLimits {
            max_requests: config.max_requests,
            max_elapsed: config.max_elapsed,
        };
        Self::new(
            HttpTransport::from_config(config),
            SessionContext::from_config(config),
        )
        .with_limits(limits)
    }
}

impl<T: Transport> WskClient<T> {
    pub fn new(transport: T, session: SessionContext) -> Self {
        Self {
            session,
            fetcher: WskPageFetcher::new(transport),
            limits: TraversalLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// A fresh traversal for `request`; nothing is sent until it is driven.
    pub fn search(&self, request: SearchRequest) -> Result<Traversal<'_, WskPageFetcher<T>>> {
        Ok(Traversal::new(&self.fetcher, &self.session, request)?.with_limits(self.limits))
    }
}
