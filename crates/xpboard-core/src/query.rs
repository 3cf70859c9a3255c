//! Query service boundary
//!
//! One POST endpoint taking `{query, variables}` and answering
//! `{data, errors}`. [`QueryTransport`] is the seam: [`HttpTransport`] talks
//! to the real service, tests plug in an in-memory fake. [`QueryService`]
//! adds the credential check, error mapping and the two query shapes the
//! dashboard issues.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Credential, CredentialProvider};
use crate::error::{CoreError, Result};
use crate::filter::FilterPredicate;
use crate::models::{ProgressRecord, SkillRecord, TransactionRecord, UserProfile};

/// All XP transactions with their parent chain, for folder discovery
pub const TAXONOMY_QUERY: &str = r#"query FolderTaxonomy {
  user {
    id
    login
    xpTransactions: transactions(where: {type: {_eq: "xp"}}) {
      id
      amount
      createdAt
      path
      object {
        name
        type
        parents {
          parent {
            name
            type
          }
        }
      }
    }
  }
}"#;

/// Filtered XP transactions, best level per skill, latest progress
pub const DATASET_QUERY: &str = r#"query Dataset($where: transaction_bool_exp!) {
  user {
    id
    login
    xpTransactions: transactions(where: $where, order_by: {createdAt: desc}) {
      id
      amount
      createdAt
      path
      object {
        name
        type
        parents {
          parent {
            name
            type
          }
        }
      }
    }
    skillTransactions: transactions(
      where: {type: {_like: "skill_%"}},
      distinct_on: [type],
      order_by: [{type: asc}, {amount: desc}]
    ) {
      type
      amount
    }
    progresses(order_by: {updatedAt: desc}, limit: 3) {
      id
      grade
      updatedAt
      object {
        name
        type
      }
    }
  }
}"#;

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Operation name, for logging
    pub fn operation(&self) -> &str {
        self.query
            .trim_start()
            .strip_prefix("query")
            .map(str::trim_start)
            .and_then(|rest| rest.split(|c: char| !c.is_alphanumeric() && c != '_').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("anonymous")
    }
}

/// One entry of the `errors` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryErrorItem {
    #[serde(default)]
    pub message: String,
}

/// Response body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<QueryErrorItem>>,
}

/// Sends one request to the query service
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn post(&self, request: &QueryRequest, credential: &Credential) -> Result<QueryResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .user_agent(concat!("xpboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CoreError::Http {
                message: "failed to build HTTP client".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn post(&self, request: &QueryRequest, credential: &Credential) -> Result<QueryResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, credential.bearer())
            .json(request)
            .send()
            .await
            .map_err(|source| CoreError::Http {
                message: format!("POST {}", self.endpoint),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Transport {
                status: status.as_u16(),
            });
        }

        response.json::<QueryResponse>().await.map_err(|source| CoreError::Http {
            message: "failed to decode response body".to_string(),
            source,
        })
    }
}

/// Raw records behind one dashboard view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(flatten)]
    pub user: UserProfile,
    #[serde(default)]
    pub xp_transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub skill_transactions: Vec<SkillRecord>,
    #[serde(default)]
    pub progresses: Vec<ProgressRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxonomyRow {
    #[serde(default)]
    xp_transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRows<T> {
    #[serde(default = "Vec::new")]
    user: Vec<T>,
}

/// Credential-checked access to the two dashboard queries
#[derive(Clone)]
pub struct QueryService {
    transport: Arc<dyn QueryTransport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl QueryService {
    pub fn new(transport: Arc<dyn QueryTransport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Run a request and return its `data`
    ///
    /// Fails before any network call when no token is available.
    pub async fn execute(&self, request: &QueryRequest) -> Result<Value> {
        let credential = self.credentials.token().ok_or(CoreError::MissingCredential)?;

        tracing::debug!(operation = request.operation(), "Dispatching query");
        let response = self.transport.post(request, &credential).await?;

        if let Some(first) = response.errors.as_ref().and_then(|errors| errors.first()) {
            let message = if first.message.is_empty() {
                "GraphQL error".to_string()
            } else {
                first.message.clone()
            };
            return Err(CoreError::Protocol { message });
        }

        response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| CoreError::malformed("response has no data"))
    }

    /// Every XP transaction with its parent chain
    pub async fn fetch_taxonomy_records(&self) -> Result<Vec<TransactionRecord>> {
        let data = self.execute(&QueryRequest::new(TAXONOMY_QUERY)).await?;
        let row: TaxonomyRow = first_user(data)?;
        Ok(row.xp_transactions)
    }

    /// Records for one folder
    pub async fn fetch_dataset(&self, predicate: &FilterPredicate) -> Result<Dataset> {
        let request = QueryRequest::new(DATASET_QUERY).with_variables(json!({ "where": predicate.to_where() }));
        let data = self.execute(&request).await?;
        first_user(data)
    }
}

fn first_user<T: DeserializeOwned>(data: Value) -> Result<T> {
    let rows: UserRows<T> =
        serde_json::from_value(data).map_err(|e| CoreError::malformed(e.to_string()))?;
    rows.user
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::malformed("No user data found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;
    use parking_lot::Mutex;

    /// Replays a canned response and records what was sent
    struct CannedTransport {
        response: Mutex<Option<Result<QueryResponse>>>,
        sent: Mutex<Vec<(QueryRequest, String)>>,
    }

    impl CannedTransport {
        fn new(response: Result<QueryResponse>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn data(data: Value) -> Arc<Self> {
            Self::new(Ok(QueryResponse {
                data: Some(data),
                errors: None,
            }))
        }
    }

    #[async_trait]
    impl QueryTransport for CannedTransport {
        async fn post(&self, request: &QueryRequest, credential: &Credential) -> Result<QueryResponse> {
            self.sent.lock().push((request.clone(), credential.bearer()));
            self.response
                .lock()
                .take()
                .unwrap_or_else(|| Err(CoreError::malformed("no canned response left")))
        }
    }

    fn service(transport: Arc<CannedTransport>, token: Option<&str>) -> QueryService {
        QueryService::new(
            transport,
            Arc::new(StaticCredentials::new(token.map(str::to_string))),
        )
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let transport = CannedTransport::data(json!({}));
        let svc = service(transport.clone(), None);

        let err = svc.fetch_taxonomy_records().await.unwrap_err();
        assert!(matches!(err, CoreError::MissingCredential));
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_first_protocol_error_is_surfaced() {
        let transport = CannedTransport::new(Ok(QueryResponse {
            data: None,
            errors: Some(vec![
                QueryErrorItem {
                    message: "JWTExpired".to_string(),
                },
                QueryErrorItem {
                    message: "second".to_string(),
                },
            ]),
        }));
        let err = service(transport, Some("t")).fetch_taxonomy_records().await.unwrap_err();
        assert!(matches!(err, CoreError::Protocol { ref message } if message == "JWTExpired"));
    }

    #[tokio::test]
    async fn test_transport_status_propagates() {
        let transport = CannedTransport::new(Err(CoreError::Transport { status: 500 }));
        let err = service(transport, Some("t")).fetch_taxonomy_records().await.unwrap_err();
        assert!(matches!(err, CoreError::Transport { status: 500 }));
    }

    #[tokio::test]
    async fn test_missing_user_row_is_malformed() {
        let transport = CannedTransport::data(json!({ "user": [] }));
        let err = service(transport, Some("t")).fetch_taxonomy_records().await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { ref message } if message == "No user data found"));
    }

    #[tokio::test]
    async fn test_dataset_request_carries_predicate_and_bearer() {
        let transport = CannedTransport::data(json!({
            "user": [{
                "id": 7,
                "login": "jdoe",
                "xpTransactions": [{
                    "id": 1, "amount": 5000, "createdAt": "2024-02-01T00:00:00Z",
                    "path": "/athens/div-01/ascii-art",
                    "object": {"name": "ascii-art", "type": "project", "parents": []}
                }],
                "skillTransactions": [{"type": "skill_go", "amount": 45}],
                "progresses": []
            }]
        }));
        let svc = service(transport.clone(), Some("tok"));
        let predicate = crate::filter::FilterBuilder::new("athens", "div-01", "checkpoint").build("div-01");

        let dataset = svc.fetch_dataset(&predicate).await.unwrap();
        assert_eq!(dataset.user.login, "jdoe");
        assert_eq!(dataset.xp_transactions.len(), 1);
        assert_eq!(dataset.skill_transactions[0].level, 45);

        let sent = transport.sent.lock();
        let (request, bearer) = &sent[0];
        assert_eq!(bearer, "Bearer tok");
        assert_eq!(request.operation(), "Dataset");
        assert_eq!(request.variables.as_ref().unwrap()["where"], predicate.to_where());
    }

    #[test]
    fn test_request_body_omits_absent_variables() {
        let body = serde_json::to_value(QueryRequest::new(TAXONOMY_QUERY)).unwrap();
        assert!(body.get("variables").is_none());
        assert_eq!(QueryRequest::new(TAXONOMY_QUERY).operation(), "FolderTaxonomy");
        assert_eq!(QueryRequest::new("{ user { id } }").operation(), "anonymous");
    }
}
