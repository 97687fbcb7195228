use futures::StreamExt;
use serde_json::json;
use twin_migrate::twins::{
    Credential, DigitalTwinsClient, ServiceEndpoint, ServiceError, TwinInstance, TwinService,
};
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_VERSION: &str = "2023-10-31";

fn client_for(server: &MockServer, page_size: Option<u32>) -> DigitalTwinsClient {
    DigitalTwinsClient::new(
        ServiceEndpoint {
            base_url: Url::parse(&server.uri()).unwrap(),
            api_version: API_VERSION.to_string(),
            page_size,
        },
        Some(Credential::bearer("test-token")),
    )
}

#[tokio::test]
async fn create_models_posts_all_documents_in_one_call() {
    let server = MockServer::start().await;
    let documents = vec![
        json!({ "@id": "ns:room;2", "@type": "Interface" }),
        json!({ "@id": "ns:desk;3", "@type": "Interface" }),
    ];
    Mock::given(method("POST"))
        .and(path("/models"))
        .and(query_param("api-version", API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!(documents)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, None)
        .create_models(&documents)
        .await
        .unwrap();
}

#[tokio::test]
async fn create_models_surfaces_service_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": "ModelAlreadyExists",
                "message": "Model with id ns:room;2 already exists."
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .create_models(&[json!({ "@id": "ns:room;2" })])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::Status {
            status: 409,
            message: "ModelAlreadyExists: Model with id ns:room;2 already exists.".to_string(),
        }
    );
}

#[tokio::test]
async fn query_follows_continuation_tokens_across_pages() {
    let server = MockServer::start().await;
    let query = "SELECT * FROM DIGITALTWINS T WHERE IS_OF_MODEL(T, 'ns:room;1', exact)";

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({ "continuationToken": "page-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "$dtId": "twin-3", "$metadata": { "$model": "ns:room;1" } }
            ],
            "continuationToken": null
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(query_param("api-version", API_VERSION))
        .and(header("max-items-per-page", "2"))
        .and(body_json(json!({ "query": query })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "$dtId": "twin-1", "$metadata": { "$model": "ns:room;1" }, "name": "Lobby" },
                { "$dtId": "twin-2", "$metadata": { "$model": "ns:room;1" } }
            ],
            "continuationToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(2));
    let twins: Vec<TwinInstance> = client
        .query_instances_of_model("ns:room;1")
        .map(|item| item.unwrap())
        .collect()
        .await;

    let ids: Vec<&str> = twins.iter().map(|t| t.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["twin-1", "twin-2", "twin-3"]);
    assert!(twins.iter().all(|t| t.current_model_id == "ns:room;1"));
}

#[tokio::test]
async fn query_error_ends_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let items: Vec<_> = client.query_instances_of_model("ns:room;1").collect().await;
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0],
        Err(ServiceError::Status {
            status: 503,
            message: "busy".to_string(),
        })
    );
}

#[tokio::test]
async fn patch_sends_json_patch_replacing_model_binding() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/digitaltwins/twin-1"))
        .and(query_param("api-version", API_VERSION))
        .and(header("content-type", "application/json-patch+json"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!([
            { "op": "replace", "path": "/$metadata/$model", "value": "ns:room;2" }
        ])))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client
        .patch_instance_model_binding("twin-1", "ns:room;2")
        .await
        .unwrap();
    // Reapplying the same binding is accepted the same way.
    client
        .patch_instance_model_binding("twin-1", "ns:room;2")
        .await
        .unwrap();
}

#[tokio::test]
async fn patch_failure_reports_status_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/digitaltwins/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .patch_instance_model_binding("missing", "ns:room;2")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "service returned 404: Not Found");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let client = DigitalTwinsClient::new(
        ServiceEndpoint {
            base_url: Url::parse("http://127.0.0.1:1").unwrap(),
            api_version: API_VERSION.to_string(),
            page_size: None,
        },
        None,
    );
    let err = client.create_models(&[json!({})]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));
}
