//! GraphQL operation documents and wire envelope
//!
//! The forum's whole API surface is eight operations against the hosted
//! GraphQL service. The documents live here as constants; the envelope types
//! deserialize both HTTP responses and realtime data frames.
//!
//! Server errors arrive as an array of `{ message }` objects. All messages
//! are kept in delivery order; the mutation path joins them for display and
//! falls back to a generic message when the array is empty.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// List the first page of topics, newest first.
pub const LIST_TOPICS: &str = "query ListTopics { listTopics { items { id title createdAt updatedAt } nextToken } }";

/// Fetch one topic with the first page of its comments.
pub const GET_TOPIC: &str = "query GetTopic($id: ID!) { getTopic(id: $id) { id title createdAt updatedAt comments { items { id topicId owner content createdAt } nextToken } } }";

/// Create a topic.
pub const CREATE_TOPIC: &str = "mutation CreateTopic($input: CreateTopicInput!) { createTopic(input: $input) { id title createdAt updatedAt } }";

/// Create a comment.
pub const CREATE_COMMENT: &str = "mutation CreateComment($input: CreateCommentInput!) { createComment(input: $input) { id topicId owner content createdAt } }";

/// Delete a comment, returning the deleted record.
pub const DELETE_COMMENT: &str = "mutation DeleteComment($input: DeleteCommentInput!) { deleteComment(input: $input) { id topicId owner content createdAt } }";

/// Subscribe to topics created anywhere on the board.
pub const ON_CREATE_TOPIC: &str = "subscription OnCreateTopic { onCreateTopic { id title createdAt updatedAt } }";

/// Subscribe to comments created in one topic.
pub const ON_CREATE_COMMENT_BY_TOPIC_ID: &str = "subscription OnCreateCommentByTopicId($topicId: ID!) { onCreateCommentByTopicId(topicId: $topicId) { id topicId owner content createdAt } }";

/// Subscribe to comments deleted from one topic.
pub const ON_DELETE_COMMENT_BY_TOPIC_ID: &str = "subscription OnDeleteCommentByTopicId($topicId: ID!) { onDeleteCommentByTopicId(topicId: $topicId) { id topicId owner content createdAt } }";

/// An outgoing operation: document plus optional variables.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    /// The operation document.
    pub query: &'static str,
    /// Operation variables, when the document declares any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

impl GraphQlRequest {
    /// An operation without variables.
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            variables: None,
        }
    }

    /// An operation with variables.
    pub fn with_variables(query: &'static str, variables: serde_json::Value) -> Self {
        Self {
            query,
            variables: Some(variables),
        }
    }
}

/// One entry of the server's error array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message.
    pub message: String,
}

/// The server's response envelope: `data` and/or `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse {
    /// Operation result, keyed by field name.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Error entries, in delivery order. Empty on success.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Extract and deserialize `data.<field>`.
    ///
    /// On failure returns every server error message in order; a response
    /// with no errors but missing or malformed data yields a single
    /// describing message.
    pub fn decode<T: DeserializeOwned>(self, field: &str) -> Result<T, Vec<String>> {
        if !self.errors.is_empty() {
            return Err(self.errors.into_iter().map(|e| e.message).collect());
        }
        let value = self
            .data
            .and_then(|mut data| data.get_mut(field).map(serde_json::Value::take))
            .filter(|value| !value.is_null())
            .ok_or_else(|| vec![format!("response carried no {field}")])?;
        serde_json::from_value(value).map_err(|e| vec![format!("malformed {field}: {e}")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{Page, Topic};

    #[test]
    fn test_request_omits_empty_variables() {
        let json = serde_json::to_value(GraphQlRequest::new(LIST_TOPICS)).unwrap();
        assert!(json.get("variables").is_none());

        let json = serde_json::to_value(GraphQlRequest::with_variables(
            GET_TOPIC,
            serde_json::json!({ "id": "t1" }),
        ))
        .unwrap();
        assert_eq!(json["variables"]["id"], "t1");
    }

    #[test]
    fn test_decode_success() {
        let response: GraphQlResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "listTopics": {
                    "items": [{
                        "id": "t1",
                        "title": "Graph API",
                        "createdAt": "2024-03-01T12:00:00Z",
                        "updatedAt": "2024-03-01T12:00:00Z"
                    }],
                    "nextToken": "abc"
                }
            }
        }))
        .unwrap();
        let page: Page<Topic> = response.decode("listTopics").unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_decode_collects_all_error_messages_in_order() {
        let response: GraphQlResponse = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "too long" }, { "message": "profane" }]
        }))
        .unwrap();
        let err = response.decode::<Page<Topic>>("listTopics").unwrap_err();
        assert_eq!(err, vec!["too long".to_string(), "profane".to_string()]);
    }

    #[test]
    fn test_decode_missing_field_is_an_error() {
        let response: GraphQlResponse =
            serde_json::from_value(serde_json::json!({ "data": {} })).unwrap();
        let err = response.decode::<Page<Topic>>("listTopics").unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].contains("listTopics"));
    }
}
