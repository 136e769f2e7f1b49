//! Retrieval and question answering over the vector index.
//!
//! Two modes share the retrieval step: `semantic_search` returns the raw
//! retrieved chunks, `answer` feeds them to a chat model and returns the
//! generated answer.

use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use crate::index::{SearchHit, SqliteVectorIndex};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str = "You answer questions using only the provided document excerpts. \
If the excerpts do not contain the answer, say so. Cite the source file and page \
for every claim.";

/// Question answering engine over the persisted vector index.
pub struct QaEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    embedder: Arc<dyn Embedder>,
    index_path: PathBuf,
    model: String,
    top_k: usize,
    min_score: f32,
    temperature: f32,
}

impl QaEngine {
    /// Create a new QA engine.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index_path: PathBuf,
        model: &str,
        top_k: usize,
        min_score: f32,
        temperature: f32,
    ) -> Self {
        Self {
            client: create_client(),
            embedder,
            index_path,
            model: model.to_string(),
            top_k,
            min_score,
            temperature,
        }
    }

    /// Retrieve the chunks most similar to the query.
    ///
    /// The index is opened fresh on every call so a completed ingestion is
    /// visible without a restart. Opening happens before the embedding call,
    /// so a missing index fails fast without touching the provider.
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>> {
        let index = SqliteVectorIndex::open(&self.index_path)?;
        let query_embedding = self.embedder.embed(query).await?;
        index.search(&query_embedding, self.top_k, self.min_score)
    }

    /// Return the retrieved chunks verbatim, formatted for display.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn semantic_search(&self, query: &str) -> Result<String> {
        let hits = self.retrieve(query).await?;

        if hits.is_empty() {
            return Ok("No matching passages found.".to_string());
        }

        debug!("Retrieved {} chunks", hits.len());
        Ok(format_hits(&hits))
    }

    /// Generate an answer conditioned on the retrieved chunks.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn answer(&self, query: &str) -> Result<String> {
        info!("Answering question");
        let hits = self.retrieve(query).await?;

        if hits.is_empty() {
            return Ok(
                "I couldn't find any relevant passages in the ingested documents.".to_string(),
            );
        }

        let user_prompt = format!(
            "Document excerpts:\n{}\n\nQuestion: {}",
            format_hits(&hits),
            query
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| SvarError::Model(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| SvarError::Model(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| SvarError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::Model(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SvarError::Model("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated answer from {} chunks", hits.len());
        Ok(answer)
    }
}

/// Format search hits for prompts and for the semantic-search response.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "---\n[{}] {} (score: {:.2})\n{}\n---",
                i + 1,
                hit.chunk.format_source(),
                hit.score,
                hit.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
