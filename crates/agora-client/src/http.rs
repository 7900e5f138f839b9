//! HTTP executor for queries and mutations
//!
//! Plain GraphQL-over-HTTP: every operation is one POST carrying the
//! document and variables, authenticated per [`AuthMode`]. No retries; a
//! failed snapshot is surfaced to the view, which offers remount as the
//! retry path.

use crate::config::{AuthMode, ClientConfig};
use crate::effects::{AuthEffects, MutationEffects, QueryEffects};
use crate::graphql::{
    GraphQlRequest, GraphQlResponse, CREATE_COMMENT, CREATE_TOPIC, DELETE_COMMENT, GET_TOPIC,
    LIST_TOPICS,
};
use agora_core::{
    AuthError, Comment, CommentId, ConfigError, FetchError, MutationError, NewComment, NewTopic,
    Page, Topic, TopicId, TopicThread, User,
};
use async_trait::async_trait;

/// GraphQL-over-HTTP client for the forum's read and write operations.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GraphQlClient {
    /// Build a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::invalid("request_timeout_ms", e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Execute one operation; transport-level failures become a message.
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, String> {
        let mut builder = self.http.post(&self.config.api_url).json(&request);
        builder = match &self.config.auth {
            AuthMode::ApiKey { key } => builder.header("x-api-key", key),
            AuthMode::Bearer { token, .. } => builder.bearer_auth(token),
        };

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("server returned {status}"));
        }
        response
            .json::<GraphQlResponse>()
            .await
            .map_err(|e| format!("malformed response body: {e}"))
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        request: GraphQlRequest,
        field: &str,
    ) -> Result<T, FetchError> {
        self.execute(request)
            .await
            .map_err(FetchError::new)?
            .decode(field)
            .map_err(|messages| FetchError::new(messages.join("\n")))
    }

    async fn mutate<T: serde::de::DeserializeOwned>(
        &self,
        request: GraphQlRequest,
        field: &str,
    ) -> Result<T, MutationError> {
        self.execute(request)
            .await
            .map_err(MutationError::message)?
            .decode(field)
            .map_err(MutationError::new)
    }
}

#[async_trait]
impl QueryEffects for GraphQlClient {
    async fn list_topics(&self) -> Result<Page<Topic>, FetchError> {
        self.query(GraphQlRequest::new(LIST_TOPICS), "listTopics")
            .await
    }

    async fn get_topic(&self, id: &TopicId) -> Result<TopicThread, FetchError> {
        let request = GraphQlRequest::with_variables(
            GET_TOPIC,
            serde_json::json!({ "id": id.as_str() }),
        );
        self.query(request, "getTopic").await
    }
}

#[async_trait]
impl MutationEffects for GraphQlClient {
    async fn create_topic(&self, input: NewTopic) -> Result<Topic, MutationError> {
        let request = GraphQlRequest::with_variables(
            CREATE_TOPIC,
            serde_json::json!({ "input": { "title": input.title } }),
        );
        self.mutate(request, "createTopic").await
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment, MutationError> {
        let request = GraphQlRequest::with_variables(
            CREATE_COMMENT,
            serde_json::json!({ "input": {
                "topicId": input.topic_id.as_str(),
                "content": input.content,
            }}),
        );
        self.mutate(request, "createComment").await
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<Comment, MutationError> {
        let request = GraphQlRequest::with_variables(
            DELETE_COMMENT,
            serde_json::json!({ "input": { "id": id.as_str() } }),
        );
        self.mutate(request, "deleteComment").await
    }
}

#[async_trait]
impl AuthEffects for GraphQlClient {
    async fn current_user(&self) -> Result<User, AuthError> {
        // The hosted auth service issues the bearer token; the client only
        // carries the identity it was configured with. API-key access has
        // no user identity, and comment ownership requires one.
        match &self.config.auth {
            AuthMode::Bearer { username, .. } => Ok(User {
                username: username.clone(),
            }),
            AuthMode::ApiKey { .. } => Err(AuthError::NotAuthenticated),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Credentials are deployment configuration; there is no client-side
        // session state to invalidate beyond the caller dropping its Session.
        tracing::info!("signed out");
        Ok(())
    }
}
