// ABOUTME: Prompt templates for the summarize/analyze/query operations
// ABOUTME: Serializes conversation history into context blocks and recovers JSON from model output
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use serde_json::{json, Value};

use super::ChatMessage;
use crate::models::{Conversation, Message};

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries \
    of conversations. Provide a brief, informative summary of the key points discussed.";

const ANALYSIS_SYSTEM_PROMPT: &str = "You are an AI that analyzes conversations. Provide a JSON \
    response with: main_topics (array), sentiment (positive/neutral/negative), key_points (array), \
    and suggested_tags (array).";

const QUERY_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about past \
    conversations. Use the provided conversation history to answer the user's question accurately \
    and concisely.";

/// Messages included per conversation in query context
const QUERY_PREVIEW_MESSAGES: usize = 5;

/// Character cap per previewed message
const QUERY_PREVIEW_CHARS: usize = 100;

/// Serialize a transcript as `role: content` blocks separated by blank lines
fn conversation_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the summarization prompt for a transcript
pub(super) fn summary_prompt(messages: &[Message]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Please summarize this conversation:\n\n{}",
            conversation_text(messages)
        )),
    ]
}

/// Build the analysis prompt for a transcript
pub(super) fn analysis_prompt(messages: &[Message]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Analyze this conversation and return JSON:\n\n{}",
            conversation_text(messages)
        )),
    ]
}

/// Build the history-query prompt: a bounded preview of each conversation
/// followed by the user's question
pub(super) fn query_prompt(query: &str, conversations: &[Conversation]) -> Vec<ChatMessage> {
    let context = conversations
        .iter()
        .enumerate()
        .map(|(idx, conv)| {
            let preview = conv
                .messages
                .iter()
                .take(QUERY_PREVIEW_MESSAGES)
                .map(|m| format!("{}: {}", m.role.as_str(), truncate(&m.content, QUERY_PREVIEW_CHARS)))
                .collect::<Vec<_>>()
                .join("\n");
            format!("Conversation {} ({}):\n{}\n---", idx + 1, conv.title, preview)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(QUERY_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Based on these past conversations:\n\n{context}\n\nQuestion: {query}"
        )),
    ]
}

/// Best-effort JSON recovery from free-form model output
///
/// Takes the span from the first `{` to the last `}` and tries to parse it;
/// anything unparseable is wrapped as `{"raw_analysis": <text>}` so the
/// caller always gets an object back.
pub(super) fn extract_json(content: &str) -> Value {
    let candidate = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return json!({ "raw_analysis": content }),
    };

    serde_json::from_str(candidate).unwrap_or_else(|_| json!({ "raw_analysis": content }))
}

/// Character-boundary-safe prefix truncation
fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
