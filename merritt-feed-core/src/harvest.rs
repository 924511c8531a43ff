//! Pulls a collection's documents and their components from a
//! [`DocumentSource`].

use tracing::{debug, info};

use crate::contract::{BoxError, DocumentSource};
use crate::error::{FeedError, Result};
use crate::record::DocumentRecord;

/// Unwraps core errors that travelled through a collaborator as a boxed
/// error, so configuration faults keep their kind.
pub(crate) fn source_error(e: BoxError) -> FeedError {
    match e.downcast::<FeedError>() {
        Ok(inner) => *inner,
        Err(e) => FeedError::Source(e),
    }
}

/// Top-level documents under `collection_path`, each carrying the components
/// that have file content. Order is the source's order.
pub async fn harvest<S>(source: &S, collection_path: &str) -> Result<Vec<DocumentRecord>>
where
    S: DocumentSource + ?Sized,
{
    let top_level = source
        .fetch_top_level_documents(collection_path)
        .await
        .map_err(source_error)?;
    info!(
        collection_path,
        documents = top_level.len(),
        "[HARVEST] Fetched top-level documents"
    );

    let mut documents = Vec::with_capacity(top_level.len());
    for document in top_level {
        let components: Vec<DocumentRecord> = source
            .fetch_components(&document)
            .await
            .map_err(source_error)?
            .into_iter()
            .filter(DocumentRecord::has_file)
            .map(|c| DocumentRecord {
                components: Vec::new(),
                ..c
            })
            .collect();
        debug!(
            id = %document.id,
            path = %document.path,
            components = components.len(),
            "[HARVEST] Fetched components"
        );
        documents.push(DocumentRecord {
            components,
            ..document
        });
    }
    Ok(documents)
}
