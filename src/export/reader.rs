//! Paginated collection reader
//!
//! Drains a [`PageStream`](super::source::PageStream) into memory. The column
//! set cannot be known before every document has been seen, so a collection
//! is buffered in full before it is written.

use mongodb::bson::Document;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ExportError, Result};

use super::progress::{ExportEvent, ProgressObserver};
use super::source::DocumentSource;

/// Reads every document of a collection, page by page
pub struct PaginatedReader<'a> {
    source: &'a dyn DocumentSource,
    observer: &'a dyn ProgressObserver,
    database: &'a str,
    cancel_token: Option<&'a CancellationToken>,
}

impl<'a> PaginatedReader<'a> {
    pub fn new(
        source: &'a dyn DocumentSource,
        observer: &'a dyn ProgressObserver,
        database: &'a str,
    ) -> Self {
        Self {
            source,
            observer,
            database,
            cancel_token: None,
        }
    }

    /// Stop between pages once `token` is cancelled
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Read all documents of `collection` in source order
    ///
    /// # Returns
    /// * `Result<Vec<Document>>` - Every document, or the first source error
    pub async fn read(&self, collection: &str) -> Result<Vec<Document>> {
        let mut pages = self.source.open_pages(self.database, collection).await?;
        let mut docs = Vec::new();
        let mut page_number = 0u32;

        loop {
            if self.cancel_token.is_some_and(|token| token.is_cancelled()) {
                debug!("Reading '{}' cancelled after {} documents", collection, docs.len());
                let _ = pages.close().await;
                return Err(ExportError::Cancelled);
            }

            match pages.next_page().await? {
                Some(page) => {
                    page_number += 1;
                    let count = page.len();
                    docs.extend(page);

                    self.observer.on_progress(&ExportEvent::PageFetched {
                        collection: collection.to_string(),
                        page: page_number,
                        documents: count,
                        total: docs.len() as u64,
                    });
                }
                None => break,
            }
        }

        pages.close().await?;
        debug!(
            "Read {} documents from '{}' in {} page(s)",
            docs.len(),
            collection,
            page_number
        );
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::testing::{MockSource, RecordingObserver};
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_reads_all_pages_in_order() {
        let source = MockSource::new().with_collection(
            "orders",
            vec![
                vec![doc! { "id": 1 }, doc! { "id": 2 }],
                vec![doc! { "id": 3 }],
            ],
        );
        let observer = RecordingObserver::new();

        let docs = PaginatedReader::new(&source, &observer, "shop")
            .read("orders")
            .await
            .unwrap();

        let ids: Vec<i32> = docs.iter().map(|d| d.get_i32("id").unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(
            observer.events(),
            vec![
                ExportEvent::PageFetched {
                    collection: "orders".to_string(),
                    page: 1,
                    documents: 2,
                    total: 2,
                },
                ExportEvent::PageFetched {
                    collection: "orders".to_string(),
                    page: 2,
                    documents: 1,
                    total: 3,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_collection_reads_nothing() {
        let source = MockSource::new().with_collection("empty", vec![]);
        let observer = RecordingObserver::new();

        let docs = PaginatedReader::new(&source, &observer, "shop")
            .read("empty")
            .await
            .unwrap();

        assert!(docs.is_empty());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let source = MockSource::new().with_collection(
            "dupes",
            vec![vec![doc! { "id": 1 }], vec![doc! { "id": 1 }]],
        );
        let observer = RecordingObserver::new();

        let docs = PaginatedReader::new(&source, &observer, "shop")
            .read("dupes")
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let source = MockSource::new().failing_open("broken");
        let observer = RecordingObserver::new();

        let result = PaginatedReader::new(&source, &observer, "shop")
            .read("broken")
            .await;
        assert!(matches!(result, Err(ExportError::Source(_))));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_propagates() {
        let source = MockSource::new()
            .with_collection("flaky", vec![vec![doc! { "id": 1 }], vec![doc! { "id": 2 }]])
            .failing_after_first_page("flaky");
        let observer = RecordingObserver::new();

        let result = PaginatedReader::new(&source, &observer, "shop")
            .read("flaky")
            .await;
        assert!(result.is_err());
        assert_eq!(observer.events().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let source = MockSource::new().with_collection("orders", vec![vec![doc! { "id": 1 }]]);
        let observer = RecordingObserver::new();
        let token = CancellationToken::new();
        token.cancel();

        let result = PaginatedReader::new(&source, &observer, "shop")
            .with_cancellation(&token)
            .read("orders")
            .await;
        assert!(matches!(result, Err(ExportError::Cancelled)));
    }
}
