use super::{InstanceStream, ServiceError, TwinInstance, TwinService};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use twin_migrate_types::{
    DigitalTwin, JsonPatchOperation, QueryPage, QueryRequest, ServiceErrorEnvelope,
};
use url::Url;

/// ASCII set for encoding path segments (slashes included).
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'"');

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";
const MODEL_BINDING_PATH: &str = "/$metadata/$model";
const PAGE_SIZE_HEADER: &str = "max-items-per-page";

/// Where the service lives and how to address it.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub base_url: Url,
    pub api_version: String,
    pub page_size: Option<u32>,
}

/// Opaque bearer token attached to every request. Never logged.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential(token.into())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// HTTP client for the model registry and twin store.
#[derive(Clone)]
pub struct DigitalTwinsClient {
    http: reqwest::Client,
    endpoint: ServiceEndpoint,
    credential: Option<Credential>,
}

impl DigitalTwinsClient {
    pub fn new(endpoint: ServiceEndpoint, credential: Option<Credential>) -> Self {
        DigitalTwinsClient {
            http: reqwest::Client::new(),
            endpoint,
            credential,
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self
            .endpoint
            .base_url
            .as_str()
            .trim_end_matches('/')
            .to_string();
        for segment in segments {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(&encode_segment(segment));
            }
        }
        url
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("api-version", self.endpoint.api_version.as_str())]);
        match &self.credential {
            Some(Credential(token)) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn query_page(
        &self,
        query: &str,
        continuation_token: Option<String>,
    ) -> Result<QueryPage<DigitalTwin>, ServiceError> {
        let body = QueryRequest {
            query: query.to_string(),
            continuation_token,
        };
        let mut request = self.prepare(self.http.post(self.url(&["query"]))).json(&body);
        if let Some(page_size) = self.endpoint.page_size {
            request = request.header(PAGE_SIZE_HEADER, page_size.to_string());
        }
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let response = ensure_success(response).await?;
        response
            .json::<QueryPage<DigitalTwin>>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TwinService for DigitalTwinsClient {
    async fn create_models(&self, documents: &[Value]) -> Result<(), ServiceError> {
        let response = self
            .prepare(self.http.post(self.url(&["models"])))
            .json(documents)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    fn query_instances_of_model<'a>(&'a self, model_id: &'a str) -> InstanceStream<'a> {
        let query = instances_of_model_query(model_id);
        Box::pin(async_stream::stream! {
            let mut continuation = None;
            loop {
                let page = match self.query_page(&query, continuation.take()).await {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                };
                tracing::trace!(model_id, twins = page.value.len(), "query page received");
                for twin in page.value {
                    yield Ok(TwinInstance {
                        instance_id: twin.dt_id,
                        current_model_id: twin.metadata.model,
                    });
                }
                match page.continuation_token {
                    Some(token) if !token.is_empty() => continuation = Some(token),
                    _ => break,
                }
            }
        })
    }

    async fn patch_instance_model_binding(
        &self,
        instance_id: &str,
        model_id: &str,
    ) -> Result<(), ServiceError> {
        let patch = [JsonPatchOperation::replace(
            MODEL_BINDING_PATH,
            Value::String(model_id.to_string()),
        )];
        let body = serde_json::to_vec(&patch).map_err(|e| ServiceError::Decode(e.to_string()))?;
        let response = self
            .prepare(self.http.patch(self.url(&["digitaltwins", instance_id])))
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Query selecting twins bound exactly to `model_id` (not to models extending it).
pub fn instances_of_model_query(model_id: &str) -> String {
    format!(
        "SELECT * FROM DIGITALTWINS T WHERE IS_OF_MODEL(T, '{}', exact)",
        model_id.replace('\'', "\\'")
    )
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string()
}

async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        message: error_message(&text, status.canonical_reason()),
    })
}

fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(envelope) = serde_json::from_str::<ServiceErrorEnvelope>(body) {
        match (envelope.error.code, envelope.error.message) {
            (Some(code), Some(message)) => return format!("{}: {}", code, message),
            (None, Some(message)) => return message,
            (Some(code), None) => return code,
            (None, None) => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("no response body").to_string()
    } else {
        trimmed.to_string()
    }
}
