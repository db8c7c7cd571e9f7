//! Document source abstractions
//!
//! The exporter talks to the document store through [`DocumentSource`], which
//! lists collections and opens a [`PageStream`] over every document of one
//! collection. [`MongoSource`] implements it with the MongoDB driver, which
//! also serves Azure Cosmos DB accounts using the MongoDB API.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Cursor};
use tracing::{debug, info};

use crate::error::driver::describe;
use crate::error::{Result, SourceError};

/// Lazy, finite, non-restartable sequence of document pages
#[async_trait]
pub trait PageStream: Send {
    /// Fetch the next page of documents
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - Next page, or None once exhausted
    async fn next_page(&mut self) -> Result<Option<Vec<Document>>>;

    /// Close the stream and release server resources
    async fn close(&mut self) -> Result<()>;
}

/// Remote store holding the collections to export
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Names of every collection in a database
    async fn list_collections(&self, database: &str) -> Result<Vec<String>>;

    /// Open a page stream over all documents of a collection
    async fn open_pages(&self, database: &str, collection: &str) -> Result<Box<dyn PageStream>>;
}

/// Source backed by a MongoDB driver client
pub struct MongoSource {
    client: Client,
    batch_size: u32,
}

impl MongoSource {
    /// Create a new source
    ///
    /// # Arguments
    /// * `client` - Connected client
    /// * `batch_size` - Documents requested per page
    pub fn new(client: Client, batch_size: u32) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl DocumentSource for MongoSource {
    async fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        let mut names = self
            .client
            .database(database)
            .list_collection_names()
            .await
            .map_err(|e| SourceError::ListFailed {
                database: database.to_string(),
                message: describe(&e),
            })?;

        // Listing order is server-defined; sort for reproducible runs
        names.sort();
        debug!("Found {} collections in '{}'", names.len(), database);
        Ok(names)
    }

    async fn open_pages(&self, database: &str, collection: &str) -> Result<Box<dyn PageStream>> {
        let cursor = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .batch_size(self.batch_size)
            .await
            .map_err(|e| SourceError::QueryFailed {
                collection: collection.to_string(),
                message: describe(&e),
            })?;

        Ok(Box::new(CursorPages::new(
            cursor,
            self.batch_size,
            collection,
        )))
    }
}

/// Cursor-backed page stream
///
/// Pulls up to `batch_size` documents per page; the driver fetches further
/// server batches through the cursor id as the page is filled.
pub struct CursorPages {
    cursor: Option<Cursor<Document>>,
    batch_size: u32,
    total_fetched: u64,
    collection: String,
    closed: bool,
}

impl CursorPages {
    pub fn new(cursor: Cursor<Document>, batch_size: u32, collection: &str) -> Self {
        Self {
            cursor: Some(cursor),
            batch_size,
            total_fetched: 0,
            collection: collection.to_string(),
            closed: false,
        }
    }
}

#[async_trait]
impl PageStream for CursorPages {
    async fn next_page(&mut self) -> Result<Option<Vec<Document>>> {
        if self.closed {
            return Ok(None);
        }

        let cursor = match self.cursor.as_mut() {
            Some(c) => c,
            None => return Ok(None),
        };

        let mut page = Vec::with_capacity(self.batch_size as usize);

        for _ in 0..self.batch_size {
            match cursor.try_next().await {
                Ok(Some(doc)) => page.push(doc),
                Ok(None) => break,
                Err(e) => {
                    self.cursor = None;
                    self.closed = true;
                    return Err(SourceError::QueryFailed {
                        collection: self.collection.clone(),
                        message: describe(&e),
                    }
                    .into());
                }
            }
        }

        if page.is_empty() {
            debug!(
                "Cursor on '{}' exhausted after {} documents",
                self.collection, self.total_fetched
            );
            self.cursor = None;
            self.closed = true;
            Ok(None)
        } else {
            self.total_fetched += page.len() as u64;
            Ok(Some(page))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.cursor = None;
            self.closed = true;
            info!(
                "Closed cursor on '{}' after fetching {} documents",
                self.collection, self.total_fetched
            );
        }
        Ok(())
    }
}

impl Drop for CursorPages {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Cursor on '{}' dropped without explicit close", self.collection);
            self.cursor = None;
        }
    }
}
