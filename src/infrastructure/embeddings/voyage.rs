use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Texts accepted by a single Voyage embeddings request.
const MAX_TEXTS_PER_REQUEST: usize = 128;

/// Voyage AI embeddings. Documents and queries are embedded with the
/// matching `input_type` so retrieval uses the asymmetric model heads.
pub struct VoyageProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'static str,
    truncation: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    index: usize,
    embedding: Vec<f32>,
}

impl VoyageProvider {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "voyage-3-lite".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.voyageai.com".to_string()),
        }
    }

    fn model_dimension(model: &str) -> usize {
        match model {
            "voyage-3" | "voyage-code-3" | "voyage-3.5" => 1024,
            "voyage-3-large" | "voyage-large-2" => 1536,
            _ => 512,
        }
    }

    fn input_type_name(input_type: InputType) -> &'static str {
        match input_type {
            InputType::Document => "document",
            InputType::Query => "query",
        }
    }

    async fn embed_chunk(&self, chunk: &[String], input_type: &'static str) -> Result<Vec<Vec<f32>>, DomainError> {
        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                input: chunk,
                model: &self.model,
                input_type,
                truncation: true,
            })
            .send()
            .await
            .map_err(|e| DomainError::Embedding(format!("Voyage API error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Embedding(format!("Voyage API {status}: {body}")));
        }

        let mut parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("Voyage response: {e}")))?;
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for VoyageProvider {
    async fn embed_many(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        let input_type = Self::input_type_name(input_type);
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_TEXTS_PER_REQUEST) {
            debug!(count = chunk.len(), model = %self.model, input_type, "embedding with Voyage");
            vectors.extend(self.embed_chunk(chunk, input_type).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        Self::model_dimension(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_dimensions() {
        assert_eq!(VoyageProvider::model_dimension("voyage-3"), 1024);
        assert_eq!(VoyageProvider::model_dimension("voyage-3-large"), 1536);
        assert_eq!(VoyageProvider::model_dimension("something-new"), 512);
    }

    #[test]
    fn test_request_shape() {
        let input = vec!["hello".to_string()];
        let body = serde_json::to_value(EmbedRequest {
            input: &input,
            model: "voyage-3-lite",
            input_type: VoyageProvider::input_type_name(InputType::Query),
            truncation: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "input": ["hello"],
                "model": "voyage-3-lite",
                "input_type": "query",
                "truncation": true,
            })
        );
    }

    #[tokio::test]
    async fn test_no_texts_makes_no_request() {
        // Unroutable base URL: any request would fail
        let provider = VoyageProvider::new(String::new(), None, Some("http://127.0.0.1:9".into()));
        let vectors = provider.embed_many(&[], InputType::Document).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(provider.dimension(), 512);
    }

    #[test]
    fn test_response_reordered_by_index() {
        let mut parsed: EmbedResponse = serde_json::from_value(serde_json::json!({
            "data": [
                {"index": 1, "embedding": [2.0]},
                {"index": 0, "embedding": [1.0]},
            ]
        }))
        .unwrap();
        parsed.data.sort_by_key(|item| item.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0]);
    }
}
