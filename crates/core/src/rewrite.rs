use crate::llm::LanguageModel;
use serde_json::Value;
use tracing::{debug, warn};

/// Retrieval topic for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTopic {
    Rewritten(String),
    /// The model call or its parsing failed; the question itself is the topic.
    Original(String),
}

impl QueryTopic {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rewritten(topic) | Self::Original(topic) => topic,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

pub fn build_rewrite_prompt(question: &str) -> String {
    format!(
        r#"You are an expert document analyst. Analyze the following query and extract structured information.

Query: "{question}"

Extract and return a JSON object with the following structure:
{{
    "query_topic": "main topic for semantic search",
    "structured_data": {{
        "entities": "key entities mentioned (people, places, things)",
        "parameters": "specific parameters or values",
        "relationships": "relationships between entities",
        "document_type": "type of document this query relates to",
        "action_items": "what the user is looking for"
    }}
}}

Respond ONLY with the JSON object."#
    )
}

/// Removes markdown code fences the model tends to wrap JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "")
}

pub fn parse_query_topic(raw: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(strip_code_fences(raw).trim()).ok()?;
    let object = match &parsed {
        Value::Array(items) => items.first()?,
        other => other,
    };

    object
        .get("query_topic")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
}

pub async fn rewrite_query(llm: &dyn LanguageModel, question: &str) -> QueryTopic {
    let raw = match llm.complete(&build_rewrite_prompt(question)).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(%error, "query rewrite failed, using original question");
            return QueryTopic::Original(question.to_string());
        }
    };

    match parse_query_topic(&raw) {
        Some(topic) => {
            debug!(topic = %topic, "query rewritten");
            QueryTopic::Rewritten(topic)
        }
        None => {
            debug!("query rewrite response had no usable topic, using original question");
            QueryTopic::Original(question.to_string())
        }
    }
}
