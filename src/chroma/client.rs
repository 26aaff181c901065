//! ChromaDB HTTP v2 API client.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ContextRetriever, RetrievalError};

const COLLECTION_NAME: &str = "evaluation_guidelines";
const TENANT_ID: &str = "default_tenant";
const DATABASE_ID: &str = "default_database";

/// Dimension expected by the seeded collection
const EMBEDDING_DIM: usize = 384;

#[derive(Deserialize)]
struct Collection {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Option<Vec<Vec<String>>>,
}

/// Client for a ChromaDB collection of evaluation guidelines
pub struct ChromaClient {
    base_url: String,
    client: Client,
    collection_id: Option<String>,
}

impl ChromaClient {
    /// Create a new ChromaDB client
    pub fn new(base_url: &str) -> Result<Self, String> {
        if base_url.is_empty() {
            return Err("ChromaDB URL is required".to_string());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            collection_id: None,
        })
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, TENANT_ID, DATABASE_ID
        )
    }

    fn collection_url(&self, collection_id: &str, action: &str) -> String {
        format!("{}/{}/{}", self.collections_url(), collection_id, action)
    }

    /// Look up or create the guidelines collection and remember its UUID.
    /// Must succeed before `add_document` or `query` can be used.
    pub async fn initialize_collection(&mut self) -> Result<(), RetrievalError> {
        if let Some(collection) = self.find_collection().await? {
            info!("Collection '{}' already exists with ID {}", COLLECTION_NAME, collection.id);
            self.collection_id = Some(collection.id);
            return Ok(());
        }

        let collection = self.create_collection().await?;
        info!("Collection '{}' created with ID {}", COLLECTION_NAME, collection.id);
        self.collection_id = Some(collection.id);
        Ok(())
    }

    async fn find_collection(&self) -> Result<Option<Collection>, RetrievalError> {
        let response = self
            .client
            .get(self.collections_url())
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "failed to list collections: HTTP {}",
                response.status()
            )));
        }

        let collections: Vec<Collection> = response
            .json()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        Ok(collections.into_iter().find(|c| c.name == COLLECTION_NAME))
    }

    async fn create_collection(&self) -> Result<Collection, RetrievalError> {
        let body = json!({
            "name": COLLECTION_NAME,
            "metadata": {
                "description": "Evaluation guidelines for CV and project evaluation",
            },
            "get_or_create": true,
        });

        let response = self
            .client
            .post(self.collections_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable(format!(
                "failed to create collection: HTTP {} - {}",
                status, detail
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))
    }

    /// Insert a guideline passage with a precomputed deterministic embedding
    pub async fn add_document(
        &self,
        id: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<(), RetrievalError> {
        let collection_id = self.collection_id.as_deref().ok_or_else(|| {
            RetrievalError::Unavailable("collection not initialized".to_string())
        })?;

        let body = json!({
            "ids": [id],
            "documents": [content],
            "metadatas": [metadata],
            "embeddings": [embedding(content)],
        });

        let response = self
            .client
            .post(self.collection_url(collection_id, "add"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable(format!(
                "failed to add document: HTTP {} - {}",
                status, detail
            )));
        }

        debug!("Added guideline document '{}'", id);
        Ok(())
    }
}

#[async_trait]
impl ContextRetriever for ChromaClient {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let collection_id = self.collection_id.as_deref().ok_or_else(|| {
            RetrievalError::Unavailable("collection not initialized".to_string())
        })?;

        let body = json!({
            "query_embeddings": [embedding(text)],
            "n_results": k,
            "include": ["documents", "distances"],
        });

        let response = self
            .client
            .post(self.collection_url(collection_id, "query"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "query failed: HTTP {}",
                response.status()
            )));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let passages = result
            .documents
            .and_then(|mut rows| if rows.is_empty() { None } else { Some(rows.remove(0)) })
            .unwrap_or_default();

        debug!("Retrieved {} context passages", passages.len());
        Ok(passages)
    }
}

/// Deterministic stand-in embedding: the collection is seeded with the same
/// scheme, so query and corpus vectors live in the same space. Equal text
/// always produces equal vectors.
fn embedding(text: &str) -> Vec<f64> {
    let normalized = text.to_lowercase();

    let mut values = Vec::with_capacity(EMBEDDING_DIM);
    for i in 0..EMBEDDING_DIM {
        let mut hasher = DefaultHasher::new();
        normalized.hash(&mut hasher);
        (i as u64).hash(&mut hasher);
        let byte = (hasher.finish() & 0xff) as f64;
        // Normalize to [-1, 1]
        values.push((byte - 127.5) / 127.5);
    }

    // Coarse text features in the leading dimensions
    values[0] = text.len() as f64 / 1000.0;
    values[1] = normalized.split_whitespace().count() as f64 / 100.0;

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let a = embedding("Go backend engineer");
        let b = embedding("Go backend engineer");
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn embedding_differs_for_different_text() {
        let a = embedding("Go backend engineer");
        let b = embedding("frontend designer");
        assert_ne!(a, b);
    }

    #[test]
    fn embedding_values_are_bounded() {
        let values = embedding("some document text");
        for v in &values[2..] {
            assert!(*v >= -1.0 && *v <= 1.0);
        }
    }

    #[tokio::test]
    async fn query_without_initialization_is_unavailable() {
        let client = ChromaClient::new("http://localhost:8000").unwrap();
        let err = client.query("anything", 5).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Unavailable(_)));
    }
}
