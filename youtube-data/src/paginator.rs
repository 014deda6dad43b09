use crate::error::Result;
use crate::resolver::{ResourcePage, Resolver};
use crate::resource::Resource;
use crate::transport::{FetchRequest, PageInfo};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::Stream;

type PendingPage = Pin<Box<dyn Future<Output = Result<ResourcePage>> + Send>>;

/// Lazily walks every page of a list operation, yielding one [`Resource`] at a time.
///
/// Nothing is requested until the stream is first polled. After that, the next page is only
/// requested once every item of the current page has been yielded, so taking the first `n`
/// items costs `ceil(n / page size)` round trips. A failed page is yielded as a single `Err`
/// and ends the stream. A single item the API returned but that cannot be interpreted is
/// yielded as an `Err` in its own position, and paging carries on past it.
///
/// Paginators are forward-only; to start over, make a new one.
pub struct Paginator {
    resolver: Resolver,
    request: FetchRequest,
    /// Current batch of items from the most recent API response
    current_items: VecDeque<Result<Resource>>,
    /// Future for the page being fetched, or about to be fetched
    pending_request: Option<PendingPage>,
    /// Whether we've reached the end of all available data
    is_done: bool,
    yielded: usize,
    pages_fetched: usize,
    page_info: Option<PageInfo>,
}

impl Paginator {
    pub(crate) fn new(resolver: Resolver, request: FetchRequest) -> Self {
        let mut paginator = Self {
            resolver,
            request,
            current_items: VecDeque::new(),
            pending_request: None,
            is_done: false,
            yielded: 0,
            pages_fetched: 0,
            page_info: None,
        };
        // futures do nothing until polled, so this does not hit the network yet
        paginator.pending_request = Some(paginator.page(None));
        paginator
    }

    fn page(&self, page_token: Option<String>) -> PendingPage {
        let resolver = self.resolver.clone();
        let request = self.request.at_page(page_token);
        Box::pin(async move { resolver.fetch_page(&request).await })
    }

    /// Items yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Pages successfully received so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// The API's estimate of the total result count, once the first page has arrived.
    ///
    /// For searches this is an approximation and is often far larger than the number of
    /// results the API will actually return.
    pub fn total_results(&self) -> Option<u32> {
        self.page_info.map(|p| p.total_results)
    }

    /// The page size reported by the most recent page.
    pub fn results_per_page(&self) -> Option<u32> {
        self.page_info.map(|p| p.results_per_page)
    }
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("request", &self.request)
            .field("buffered", &self.current_items.len())
            .field("is_done", &self.is_done)
            .field("yielded", &self.yielded)
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

impl Stream for Paginator {
    type Item = Result<Resource>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.current_items.pop_front() {
                self.yielded += 1;
                return Poll::Ready(Some(item));
            }

            if self.is_done {
                return Poll::Ready(None);
            }

            let Some(pending) = self.pending_request.as_mut() else {
                self.is_done = true;
                return Poll::Ready(None);
            };

            match pending.as_mut().poll(cx) {
                Poll::Ready(Ok(page)) => {
                    self.pages_fetched += 1;
                    if page.page_info.is_some() {
                        self.page_info = page.page_info;
                    }
                    tracing::trace!(
                        endpoint = %self.request.endpoint,
                        page = self.pages_fetched,
                        items = page.items.len(),
                        "received page"
                    );
                    self.current_items.extend(page.items);

                    if let Some(next_token) = page.next_page_token {
                        // set up the next page, but don't poll it until this one is drained
                        let next = self.page(Some(next_token));
                        self.pending_request = Some(next);
                    } else {
                        self.is_done = true;
                        self.pending_request = None;
                    }
                }
                Poll::Ready(Err(e)) => {
                    tracing::debug!(endpoint = %self.request.endpoint, error = %e, "page failed");
                    self.pending_request = None;
                    self.is_done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::{MockTransport, search_page};
    use crate::resource::{Endpoint, ResourceKind};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    fn search(transport: &MockTransport) -> Paginator {
        let resolver = Resolver::new(Arc::new(transport.clone()), 50);
        let request = FetchRequest::new(Endpoint::Search, "snippet")
            .param("q", "rust")
            .param("maxResults", "50");
        Paginator::new(resolver, request)
    }

    #[tokio::test]
    async fn pages_are_fetched_only_when_needed() {
        let transport = MockTransport::new();
        transport.push_page(search_page("a", 50, Some("p2"))).await;
        transport.push_page(search_page("b", 50, Some("p3"))).await;
        transport.push_page(search_page("c", 17, None)).await;

        let mut results = search(&transport);
        assert_eq!(transport.calls().await, 0);

        for _ in 0..100 {
            results.next().await.unwrap().unwrap();
        }
        assert_eq!(transport.calls().await, 2);

        // item 101 is the first of the third page
        let item = results.next().await.unwrap().unwrap();
        assert_eq!(item.id().id(), "c-0");
        assert_eq!(transport.calls().await, 3);

        let mut rest = 0;
        while let Some(item) = results.next().await {
            item.unwrap();
            rest += 1;
        }
        assert_eq!(rest, 16);
        assert_eq!(results.yielded(), 117);
        assert_eq!(results.pages_fetched(), 3);
        assert_eq!(transport.calls().await, 3);

        let tokens: Vec<Option<String>> = transport
            .requests()
            .await
            .into_iter()
            .map(|r| r.page_token)
            .collect();
        assert_eq!(tokens, [None, Some("p2".into()), Some("p3".into())]);
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let transport = MockTransport::new();
        transport.push_page(search_page("a", 0, None)).await;

        let items: Vec<_> = search(&transport).collect().await;
        assert!(items.is_empty());
        assert_eq!(transport.calls().await, 1);
    }

    #[tokio::test]
    async fn failures_surface_at_the_first_item_of_the_failed_page() {
        let transport = MockTransport::new();
        transport.push_page(search_page("a", 3, Some("p2"))).await;
        transport
            .push_error(Error::Transport {
                status: Some(403),
                message: "quota exceeded".into(),
            })
            .await;

        let items: Vec<_> = search(&transport).collect().await;
        assert_eq!(items.len(), 4);
        assert!(items[..3].iter().all(Result::is_ok));
        assert!(matches!(
            items[3],
            Err(Error::Transport {
                status: Some(403),
                ..
            })
        ));
        assert_eq!(transport.calls().await, 2);
    }

    #[tokio::test]
    async fn undecodable_items_fail_alone_and_paging_continues() {
        let transport = MockTransport::new();
        let mut first = search_page("a", 2, Some("p2"));
        first.items.insert(
            1,
            json!({
                "kind": "youtube#searchResult",
                "id": { "kind": "youtube#video" },
                "snippet": { "title": "no video id" }
            }),
        );
        transport.push_page(first).await;
        transport.push_page(search_page("b", 1, None)).await;

        let items: Vec<_> = search(&transport).collect().await;
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_ref().unwrap().id().id(), "a-0");
        assert!(matches!(items[1], Err(Error::Decode { .. })), "{:?}", items[1]);
        assert_eq!(items[2].as_ref().unwrap().id().id(), "a-1");
        assert_eq!(items[3].as_ref().unwrap().id().id(), "b-0");
        assert_eq!(transport.calls().await, 2);
    }

    #[tokio::test]
    async fn items_carry_the_fields_of_the_list_response() {
        let transport = MockTransport::new();
        transport.push_page(search_page("a", 2, None)).await;

        let mut results = search(&transport);
        let first = results.next().await.unwrap().unwrap();
        assert_eq!(first.kind(), ResourceKind::Video);
        assert_eq!(first.get_str("title").await.unwrap(), "result 0");
        assert_eq!(transport.calls().await, 1);
        assert!(!first.is_complete().await);

        assert_eq!(results.total_results(), Some(1_000_000));
        assert_eq!(results.results_per_page(), Some(2));
    }

    #[tokio::test]
    async fn a_fresh_paginator_starts_over() {
        let transport = MockTransport::new();
        transport.push_page(search_page("a", 1, None)).await;
        transport.push_page(search_page("a", 1, None)).await;

        let first: Vec<_> = search(&transport).collect().await;
        let second: Vec<_> = search(&transport).collect().await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(transport.calls().await, 2);
    }
}
