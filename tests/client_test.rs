//! Integration tests for OperationClient against the mock transport.

use aws_operations::mocks::{MockResponse, MockTransport, TestFixtures};
use aws_operations::{
    Inputs, InvocationOptions, OperationClient, OperationError, OperationRegistry, PagingOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn create_test_client(transport: Arc<MockTransport>) -> OperationClient {
    OperationClient::builder()
        .region("us-east-1")
        .endpoint("http://localhost:4566")
        .transport(transport)
        .build()
        .unwrap()
}

fn channels_page(names: &[&str], next_token: Option<&str>) -> MockResponse {
    let items: Vec<Value> = names.iter().map(|n| json!({"ChannelName": n})).collect();
    MockResponse::ok_with_body(TestFixtures::items_json(&items, next_token))
}

fn lb_page(names: &[&str], next_marker: Option<&str>) -> MockResponse {
    MockResponse::ok_with_body(TestFixtures::describe_load_balancers_xml(names, next_marker))
}

#[tokio::test]
async fn test_missing_required_field_sends_nothing() {
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok()));
    let client = create_test_client(transport.clone());

    let inputs = Inputs::new().with("Subnets", json!(["subnet-1"]));
    let result = client
        .invoke_collect(
            "DetachLoadBalancerFromSubnets",
            &inputs,
            &InvocationOptions::new(),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(OperationError::MissingRequiredField { field }) if field == "LoadBalancerName"
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_invalid_selector_sends_nothing() {
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok()));
    let client = create_test_client(transport.clone());

    let result = client
        .invoke_collect(
            "ListChannels",
            &Inputs::new(),
            &InvocationOptions::new().select("Bogus"),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(OperationError::InvalidSelector { .. })));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_unset_optional_fields_are_omitted() {
    let transport = Arc::new(MockTransport::with_default(lb_page(&[], None)));
    let client = create_test_client(transport.clone());

    client
        .invoke_collect("DescribeLoadBalancers", &Inputs::new(), &InvocationOptions::new(), CancellationToken::new())
        .await
        .unwrap();
    let inputs = Inputs::new().with("LoadBalancerNames", json!(["web"]));
    client
        .invoke_collect("DescribeLoadBalancers", &inputs, &InvocationOptions::new(), CancellationToken::new())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].body_text(), "Action=DescribeLoadBalancers&Version=2012-06-01");
    assert_eq!(
        requests[1].body_text(),
        "Action=DescribeLoadBalancers&Version=2012-06-01&LoadBalancerNames.member.1=web"
    );
}

#[tokio::test]
async fn test_two_pages_in_order_with_tokens() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        channels_page(&["A", "B"], Some("t1")),
        channels_page(&["C"], None),
    ]));
    let client = create_test_client(transport.clone());

    let values = client
        .invoke_collect(
            "ListChannels",
            &Inputs::new(),
            &InvocationOptions::new().select("Items.ChannelName"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(values, vec![json!("A"), json!("B"), json!("C")]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].request.query_param("nextToken"), None);
    assert_eq!(requests[1].request.query_param("nextToken"), Some("t1"));
    assert_eq!(requests[1].url(), "http://localhost:4566/channels?nextToken=t1");
}

#[tokio::test]
async fn test_n_pages_n_calls() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        lb_page(&["a"], Some("m1")),
        lb_page(&["b"], Some("m2")),
        lb_page(&["c"], Some("m3")),
        lb_page(&["d"], None),
    ]));
    let client = create_test_client(transport.clone());

    let outcome = client
        .invoke(
            "DescribeLoadBalancers",
            &Inputs::new(),
            &InvocationOptions::new().select("LoadBalancerDescriptions.LoadBalancerName"),
            CancellationToken::new(),
            |_| Ok(()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.pages, 4);
    assert_eq!(outcome.emitted, 4);
    assert_eq!(outcome.next_token, None);
    assert_eq!(transport.request_count(), 4);

    let markers: Vec<Option<String>> = transport.requests().iter().map(|r| r.form_field("Marker")).collect();
    assert_eq!(
        markers,
        vec![None, Some("m1".to_string()), Some("m2".to_string()), Some("m3".to_string())]
    );
}

#[tokio::test]
async fn test_manual_paging_makes_one_call() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        channels_page(&["A", "B"], Some("t1")),
        channels_page(&["C"], None),
    ]));
    let client = create_test_client(transport.clone());

    let options = InvocationOptions::new().paging(PagingOptions::new().with_page_size(2).manual());
    let outcome = client
        .invoke("ListChannels", &Inputs::new(), &options, CancellationToken::new(), |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(transport.request_count(), 1);
    assert_eq!(outcome.emitted, 2);
    assert_eq!(outcome.next_token.as_deref(), Some("t1"));
    assert_eq!(transport.last_request().unwrap().request.query_param("maxResults"), Some("2"));
}

#[tokio::test]
async fn test_resume_from_next_token() {
    let transport = Arc::new(MockTransport::with_responses(vec![channels_page(&["C"], None)]));
    let client = create_test_client(transport.clone());

    let options = InvocationOptions::new().paging(PagingOptions::new().with_next_token("t1"));
    let values = client
        .invoke_collect("ListChannels", &Inputs::new(), &options, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(values, vec![json!({"ChannelName": "C"})]);
    assert_eq!(transport.last_request().unwrap().request.query_param("nextToken"), Some("t1"));
}

#[tokio::test]
async fn test_token_in_body_for_prefetch_schedules() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        MockResponse::ok_with_body(TestFixtures::items_json(&[json!({"Name": "s1"})], Some("p2"))),
        MockResponse::ok_with_body(TestFixtures::items_json(&[json!({"Name": "s2"})], None)),
    ]));
    let client = create_test_client(transport.clone());

    let inputs = Inputs::new().with("PlaybackConfigurationName", "main");
    let values = client
        .invoke_collect(
            "ListPrefetchSchedules",
            &inputs,
            &InvocationOptions::new().select("Items.Name"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(values, vec![json!("s1"), json!("s2")]);
    let requests = transport.requests();
    assert_eq!(requests[0].url(), "http://localhost:4566/prefetchSchedule/main");
    assert_eq!(requests[0].body_json(), Some(json!({})));
    assert_eq!(requests[1].body_json(), Some(json!({"NextToken": "p2"})));
}

#[tokio::test]
async fn test_cancel_after_first_page() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        channels_page(&["A", "B"], Some("t1")),
        channels_page(&["C"], Some("t2")),
        channels_page(&["D"], None),
    ]));
    let client = create_test_client(transport.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut seen = Vec::new();
    let result = client
        .invoke(
            "ListChannels",
            &Inputs::new(),
            &InvocationOptions::new().select("Items.ChannelName"),
            cancel,
            |value| {
                seen.push(value);
                trigger.cancel();
                Ok(())
            },
        )
        .await;

    assert!(matches!(result, Err(OperationError::Cancelled { pages_completed: 1 })));
    assert_eq!(seen, vec![json!("A"), json!("B")]);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_cancel_during_in_flight_call() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        channels_page(&["A"], Some("t1")),
        channels_page(&["B"], None).with_delay(Duration::from_secs(30)),
    ]));
    let client = create_test_client(transport.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let mut seen = Vec::new();
    let result = client
        .invoke("ListChannels", &Inputs::new(), &InvocationOptions::new(), cancel, |value| {
            seen.push(value);
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(OperationError::Cancelled { pages_completed: 1 })));
    assert_eq!(seen, vec![json!({"ChannelName": "A"})]);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_service_failure_on_second_page_keeps_first() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        lb_page(&["a"], Some("m1")),
        MockResponse::error(400, TestFixtures::query_error_xml("Throttling", "Rate exceeded")),
    ]));
    let client = create_test_client(transport.clone());

    let mut seen = Vec::new();
    let result = client
        .invoke(
            "DescribeLoadBalancers",
            &Inputs::new(),
            &InvocationOptions::new().select("LoadBalancerDescriptions.LoadBalancerName"),
            CancellationToken::new(),
            |value| {
                seen.push(value);
                Ok(())
            },
        )
        .await;

    match result {
        Err(OperationError::ServiceFailure { code, status, request_id, .. }) => {
            assert_eq!(code, "Throttling");
            assert_eq!(status, 400);
            assert_eq!(request_id.as_deref(), Some("test-request-id"));
        }
        other => panic!("Expected ServiceFailure, got {:?}", other),
    }
    assert_eq!(seen, vec![json!("a")]);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::transport_failure(
        "connection refused",
    )]));
    let client = create_test_client(transport);

    let inputs = Inputs::new().with("ChannelName", "live");
    let result = client
        .invoke_collect("DeleteChannel", &inputs, &InvocationOptions::new().force(), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(OperationError::TransportFailure { .. })));
}

#[tokio::test]
async fn test_list_operation_defaults_to_items() {
    let transport = Arc::new(MockTransport::with_responses(vec![lb_page(&["web", "api"], None)]));
    let client = create_test_client(transport);

    let values = client
        .invoke_collect("DescribeLoadBalancers", &Inputs::new(), &InvocationOptions::new(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        values,
        vec![
            json!({"LoadBalancerName": "web", "Scheme": "internet-facing"}),
            json!({"LoadBalancerName": "api", "Scheme": "internet-facing"}),
        ]
    );
}

#[tokio::test]
async fn test_whole_response_and_parameter_echo() {
    let body = TestFixtures::subnets_xml("DetachLoadBalancerFromSubnets", &["subnet-2"]);
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok_with_body(body)));
    let client = create_test_client(transport);

    let inputs = Inputs::new()
        .with("LoadBalancerName", "web")
        .with("Subnets", json!(["subnet-1"]));

    let whole = client
        .invoke_collect(
            "DetachLoadBalancerFromSubnets",
            &inputs,
            &InvocationOptions::new().select("*"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(whole, vec![json!({"Subnets": ["subnet-2"]})]);

    let echoed = client
        .invoke_collect(
            "DetachLoadBalancerFromSubnets",
            &inputs,
            &InvocationOptions::new().select("^LoadBalancerName"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(echoed, vec![json!("web")]);
}

#[tokio::test]
async fn test_rest_json_create_channel() {
    let response = json!({
        "Arn": "arn:aws:mediatailor:us-east-1:123456789012:channel/live",
        "ChannelName": "live",
        "ChannelState": "STOPPED",
        "PlaybackMode": "LOOP",
        "Tier": "BASIC"
    });
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::ok_with_body(
        response.to_string(),
    )]));
    let client = create_test_client(transport.clone());

    let inputs = Inputs::new()
        .with("ChannelName", "live")
        .with("PlaybackMode", "LOOP")
        .with("Tier", "BASIC")
        .with("Outputs", json!([{"ManifestName": "index", "SourceGroup": "hls"}]))
        .with("TimeShiftConfiguration.MaxTimeDelaySeconds", "600");

    let values = client
        .invoke_collect(
            "MediaTailor:CreateChannel",
            &inputs,
            &InvocationOptions::new().select("ChannelState"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(values, vec![json!("STOPPED")]);

    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.url(), "http://localhost:4566/channel/live");
    assert_eq!(
        recorded.body_json(),
        Some(json!({
            "Outputs": [{"ManifestName": "index", "SourceGroup": "hls"}],
            "PlaybackMode": "LOOP",
            "Tier": "BASIC",
            "TimeShiftConfiguration": {"MaxTimeDelaySeconds": 600}
        }))
    );
}

#[tokio::test]
async fn test_select_renamed_response_field() {
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::ok_with_body(
        json!({"ChannelName": "live", "tags": {"team": "video"}}).to_string(),
    )]));
    let client = create_test_client(transport.clone());

    let inputs = Inputs::new()
        .with("ChannelName", "live")
        .with("PlaybackMode", "LOOP")
        .with("Outputs", json!([{"ManifestName": "index", "SourceGroup": "hls"}]))
        .with("Tags.team", "video");

    let values = client
        .invoke_collect(
            "CreateChannel",
            &inputs,
            &InvocationOptions::new().select("Tags"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(values, vec![json!({"team": "video"})]);

    let body = transport.last_request().unwrap().body_json().unwrap();
    assert_eq!(body["tags"], json!({"team": "video"}));
    assert!(body.get("Tags").is_none());
}

#[tokio::test]
async fn test_unknown_operation() {
    let client = create_test_client(Arc::new(MockTransport::new()));
    let result = client
        .invoke_collect("Frobnicate", &Inputs::new(), &InvocationOptions::new(), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(OperationError::UnknownOperation { .. })));
}

#[tokio::test]
async fn test_custom_registry_from_json() {
    let registry = OperationRegistry::from_json_str(
        r#"[{
            "service": {"name": "Widgets", "endpoint_prefix": "widgets", "protocol": "json", "target_prefix": "Widgets_20240101"},
            "name": "ListWidgets",
            "params": [
                {"name": "NextToken", "shape": {"type": "scalar", "of": "string"}}
            ],
            "response_fields": ["Widgets", "NextToken"],
            "default_selector": "Widgets",
            "pagination": {"input_token": "NextToken", "output_token": "NextToken", "items": "Widgets"}
        }]"#,
    )
    .unwrap();

    let transport = Arc::new(MockTransport::with_responses(vec![
        MockResponse::ok_with_body(r#"{"Widgets": [1, 2], "NextToken": "n"}"#),
        MockResponse::ok_with_body(r#"{"Widgets": [3], "NextToken": ""}"#),
    ]));
    let client = OperationClient::builder()
        .region("eu-west-1")
        .transport(transport.clone())
        .registry(registry)
        .build()
        .unwrap();

    let values = client
        .invoke_collect("ListWidgets", &Inputs::new(), &InvocationOptions::new(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);

    let requests = transport.requests();
    assert_eq!(requests[0].endpoint, "https://widgets.eu-west-1.amazonaws.com");
    assert_eq!(
        requests[0].request.headers().get("x-amz-target").unwrap(),
        "Widgets_20240101.ListWidgets"
    );
    assert_eq!(requests[1].body_json(), Some(json!({"NextToken": "n"})));
}

#[test]
fn test_invoke_blocking() {
    let transport = Arc::new(MockTransport::with_responses(vec![channels_page(&["A"], None)]));
    let client = create_test_client(transport);

    let values = client
        .invoke_blocking(
            "ListChannels",
            &Inputs::new(),
            &InvocationOptions::new().select("Items.ChannelName"),
            CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(values, vec![json!("A")]);
}
