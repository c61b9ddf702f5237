//! Retrieval-augmented answers over the review index.
//!
//! The last user message is embedded and the nearest reviews are fetched.
//! They are appended to that message as context before the conversation is
//! sent to a streaming chat completion.

use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::models::{ChatConfig, ChatMessage, QueryMatch, Role};
use crate::services::embedding::Embedder;
use crate::services::vector_index::VectorIndex;
use crate::utils::{RetryPolicy, with_retry};

pub const SYSTEM_PROMPT: &str = "\
You are an assistant for a RateMyProfessor-style platform. Students ask about \
professors and courses, and you answer using reviews retrieved from a vector \
database (RAG).

Structure every answer as:
1. A short introduction that addresses the question.
2. For each retrieved professor: name, subject, rating out of 5 stars, and a \
short summary of the student reviews.
3. A brief conclusion or recommendation.

Rules:
- Always cover every retrieved professor, even when the question is narrow, \
and say how closely each one matches what was asked.
- Use only the retrieved information. Never invent professors, ratings or reviews.
- If the retrieved reviews cannot answer the question, say so politely.
- If the question is vague, ask the student for more detail.

Keep the tone helpful, informative and impartial: approachable for a \
university student without being casual.";

const CONTEXT_HEADER: &str = "Returned results from vector db (done automatically):";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl ChatClient {
    pub fn new(config: &ChatConfig, api_key: String, retry: RetryPolicy) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn start_stream(&self, messages: &[ChatMessage]) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::ServerError { status, body });
        }
        Ok(response)
    }

    /// Stream a completion, writing each content delta to `out` as it arrives.
    ///
    /// Returns the full completion text.
    pub async fn stream_completion<W: Write>(
        &self,
        messages: &[ChatMessage],
        out: &mut W,
    ) -> Result<String, ChatError> {
        let response = with_retry(&self.retry, "chat completion", || {
            self.start_stream(messages)
        })
        .await?;

        let mut text = String::new();
        let mut events = std::pin::pin!(response.bytes_stream().eventsource());

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| ChatError::Stream(e.to_string()))?;
            if event.data == "[DONE]" {
                break;
            }
            if event.data.is_empty() {
                continue;
            }
            let chunk: CompletionChunk = serde_json::from_str(&event.data)
                .map_err(|e| ChatError::InvalidEvent(format!("{e}: {}", event.data)))?;
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content);
            if let Some(content) = content.filter(|c| !c.is_empty()) {
                out.write_all(content.as_bytes())?;
                out.flush()?;
                text.push_str(&content);
            }
        }

        Ok(text)
    }
}

/// A streamed answer and the reviews it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub matches: Vec<QueryMatch>,
}

pub struct Assistant<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn VectorIndex,
    chat: &'a ChatClient,
    top_k: u32,
}

impl<'a> Assistant<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        index: &'a dyn VectorIndex,
        chat: &'a ChatClient,
        top_k: u32,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            top_k,
        }
    }

    /// Nearest reviews for a free-text question.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<QueryMatch>, ChatError> {
        let vector = self.embedder.embed(question).await?;
        let matches = self.index.query(vector, self.top_k).await?;
        tracing::debug!(count = matches.len(), "retrieved reviews");
        Ok(matches)
    }

    /// Answer the last user message of `history`, streaming the reply to `out`.
    pub async fn answer<W: Write>(
        &self,
        history: &[ChatMessage],
        out: &mut W,
    ) -> Result<Answer, ChatError> {
        let question = match history.last() {
            Some(last) if last.role == Role::User => last.content.as_str(),
            _ => return Err(ChatError::NoUserMessage),
        };

        let matches = self.retrieve(question).await?;
        let messages = build_messages(history, &matches)?;
        let text = self.chat.stream_completion(&messages, out).await?;

        Ok(Answer { text, matches })
    }
}

/// Render retrieved reviews as the context block appended to the question.
pub fn format_context(matches: &[QueryMatch]) -> String {
    let mut context = String::from(CONTEXT_HEADER);
    for m in matches {
        let _ = write!(context, "\n\nProfessor: {}", m.id);
        if let Some(ref meta) = m.metadata {
            let _ = write!(
                context,
                "\nReview: {}\nSubject: {}\nStars: {}",
                meta.review, meta.subject, meta.stars
            );
        }
    }
    context.push('\n');
    context
}

/// System prompt, prior turns, then the last user turn with retrieved context.
pub fn build_messages(
    history: &[ChatMessage],
    matches: &[QueryMatch],
) -> Result<Vec<ChatMessage>, ChatError> {
    let Some((last, earlier)) = history.split_last() else {
        return Err(ChatError::NoUserMessage);
    };
    if last.role != Role::User {
        return Err(ChatError::NoUserMessage);
    }

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(earlier.iter().filter(|m| m.role != Role::System).cloned());
    messages.push(ChatMessage::user(format!(
        "{}\n\n{}",
        last.content,
        format_context(matches)
    )));
    Ok(messages)
}
