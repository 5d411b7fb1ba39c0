use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy)]
pub enum InputType {
    Document,
    Query,
}

/// Text to fixed-length vector. Every vector a provider returns has
/// `dimension()` components, and `embed_many` preserves input order.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_many(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>, DomainError> {
        let texts = [text.to_string()];
        self.embed_many(&texts, input_type)
            .await?
            .pop()
            .ok_or_else(|| DomainError::Embedding("provider returned no vector".into()))
    }

    fn dimension(&self) -> usize;
}
