//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background tokio
//! runtime, then drives the blocking client over real HTTP. Most tests run
//! once per transport, so the two implementations are held to the same
//! observable behaviour.

use std::net::SocketAddr;
use std::sync::Arc;

use mock_server::{MockConfig, TEST_API_KEY, TEST_API_SECRET};
use netistrar_core::types::{
    DomainNameAvailabilityDescriptor, DomainNameContact, DomainNameCreateDescriptor, DomainNameGlueRecord,
    DomainNameRenewDescriptor, DomainNameSuggestionOptions, DomainNameTransferDescriptor, DomainNameUpdateDescriptor,
    TestDomainNameUpdateDescriptor, TransactionStatus,
};
use netistrar_core::{
    ApiError, ApiProvider, ClientException, ExceptionMap, Expected, HttpMethod, MethodCall, Parameters, RemoteErrorCode,
    RemoteRequest, TransportKind, WebServiceProxy,
};
use serde_json::Value;

const TRANSPORTS: [TransportKind; 2] = [TransportKind::Agent, TransportKind::Socket];

/// Start a mock server on a random port and return its address.
fn start_server(config: MockConfig) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, config).await
        })
        .unwrap();
    });

    addr
}

fn provider(addr: SocketAddr, transport: TransportKind) -> ApiProvider {
    ApiProvider::new(format!("http://{addr}"), TEST_API_KEY, TEST_API_SECRET, transport.build())
}

/// An address nothing is listening on.
fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn owner() -> DomainNameContact {
    DomainNameContact::new("Jane Smith", "jane@example.com").with_telephone("44.1865123456")
}

#[test]
fn ping_and_balance() {
    for transport in TRANSPORTS {
        let api = provider(start_server(MockConfig::default()), transport);
        assert_eq!(api.utility().ping().unwrap(), "OK", "{transport:?}");
        assert_eq!(api.account().balance().unwrap(), 1000.0, "{transport:?}");
    }
}

#[test]
fn domain_lifecycle() {
    for transport in TRANSPORTS {
        let api = provider(start_server(MockConfig::default()), transport);
        let domains = api.domains();

        // search
        let search = DomainNameAvailabilityDescriptor::new("example", [".rodeo", "com"])
            .with_suggestions(DomainNameSuggestionOptions {
                fill_count: 2,
                ..DomainNameSuggestionOptions::default()
            });
        let results = domains.hinted_availability(&search).unwrap();
        assert_eq!(results.tld_results.keys().collect::<Vec<_>>(), vec!["rodeo", "com"]);
        assert!(results.tld_results.get("rodeo").unwrap().is_available());
        assert_eq!(results.suggestions.len(), 2);

        let live = domains.live_availability("example.rodeo").unwrap();
        assert!(live.is_available());
        let registration = &live.prices.get("registration").unwrap()[0];
        assert_eq!(registration.standard_buy_price, Some(10.0));
        assert_eq!(live.prices.get("renewal").unwrap()[0].number_of_years, Some(1));

        // validate and create
        let mut descriptor = DomainNameCreateDescriptor::new(vec!["example.rodeo".to_string()], 1, owner());
        descriptor.nameservers = vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()];
        assert!(domains.validate(&descriptor).unwrap().is_empty());

        let tx = domains.create(&descriptor).unwrap();
        assert!(tx.succeeded(), "{transport:?}: {tx:?}");
        assert_eq!(tx.order_currency.as_deref(), Some("GBP"));
        assert_eq!(tx.order_total, Some(12.0));
        assert!(!tx.transaction_elements.get("example.rodeo").unwrap().has_errors());

        let problems = domains.validate(&descriptor).unwrap();
        assert!(problems.get("example.rodeo").unwrap().get("DOMAIN_UNAVAILABLE").is_some());

        // read back
        let domain = domains.get("example.rodeo").unwrap();
        assert!(domain.is_active());
        assert!(domain.locked);
        assert!(domain.uses_privacy_proxy());
        assert_eq!(domain.locked_until, None);
        assert_eq!(domain.nameservers, descriptor.nameservers);
        assert_eq!(domain.owner_contact.as_ref().unwrap().phone_number().as_deref(), Some("44.1865123456"));

        let several = domains.get_multiple(&["example.rodeo", "unknown.rodeo"]).unwrap();
        assert_eq!(several.keys().collect::<Vec<_>>(), vec!["example.rodeo"]);
        assert_eq!(domains.list(10, 1).unwrap(), vec!["example.rodeo"]);

        // update and renew
        let mut update = DomainNameUpdateDescriptor::for_domains(vec!["example.rodeo".to_string()]);
        update.locked = Some(false);
        update.auto_renew = Some(true);
        let tx = domains.update(&update).unwrap();
        assert!(tx.succeeded());
        assert_eq!(tx.order_id, None);
        let domain = domains.get("example.rodeo").unwrap();
        assert!(!domain.locked);
        assert!(domain.auto_renew);

        let tx = domains.renew("example.rodeo", 2).unwrap();
        assert!(tx.succeeded());
        assert_eq!(domains.get("example.rodeo").unwrap().expiry_date.as_deref(), Some("01/01/2029 00:00:00"));

        let tx = domains
            .renew_multiple(&DomainNameRenewDescriptor::new(
                vec!["example.rodeo".to_string(), "missing.rodeo".to_string()],
                1,
            ))
            .unwrap();
        assert_eq!(tx.transaction_status, TransactionStatus::PartiallySucceeded);
        assert!(tx.failure_message().unwrap().contains("missing.rodeo"));

        // glue records
        let tx = domains
            .glue_records_set(
                "example.rodeo",
                &[
                    DomainNameGlueRecord::new("ns1", Some("192.0.2.10".to_string())),
                    DomainNameGlueRecord::new("ns2", Some("not-an-ip".to_string())),
                ],
            )
            .unwrap();
        assert_eq!(tx.transaction_status, TransactionStatus::PartiallySucceeded);
        let ns2 = tx.transaction_elements.get("ns2").unwrap();
        assert_eq!(ns2.element_errors.keys().collect::<Vec<_>>(), vec!["GLUE_RECORD_INVALID"]);
        assert_eq!(domains.get("example.rodeo").unwrap().glue_records.len(), 1);

        let tx = domains.glue_records_remove("example.rodeo", &["ns1"]).unwrap();
        assert!(tx.succeeded());
        assert!(domains.get("example.rodeo").unwrap().glue_records.is_empty());
    }
}

#[test]
fn transfers_through_the_test_api() {
    for transport in TRANSPORTS {
        let api = provider(start_server(MockConfig::default()), transport);

        let pairs = api.test().create_pull_transfer_rodeo_domains(2).unwrap();
        assert_eq!(pairs.len(), 2);
        let identifiers: Vec<String> = pairs
            .iter()
            .map(|pair| DomainNameTransferDescriptor::transfer_identifier(&pair[0], &pair[1]))
            .collect();
        let tx = api
            .domains()
            .transfer_create(&DomainNameTransferDescriptor::new(identifiers, owner()))
            .unwrap();
        assert!(tx.succeeded(), "{transport:?}: {tx:?}");

        let pulled = &pairs[0][0];
        assert_eq!(api.domains().get(pulled).unwrap().status.as_deref(), Some("TRANSFER_PENDING"));

        let pushed = api.test().create_push_transfer_uk_domains(1).unwrap();
        api.test().approve_incoming_transfer_other_registrar(&pushed[..]).unwrap();
        assert!(api.domains().get(&pushed[0]).unwrap().is_active());

        api.test().start_transfer_out_rodeo(&[pulled.as_str()]).unwrap();
        assert_eq!(api.domains().get(pulled).unwrap().status.as_deref(), Some("TRANSFER_OUT_PENDING"));

        api.test().reject_incoming_transfer_other_registrar(&[pairs[1][0].as_str()]).unwrap();
        assert_eq!(
            api.domains().get(&pairs[1][0]).unwrap().status.as_deref(),
            Some("TRANSFER_REJECTED")
        );
    }
}

#[test]
fn ownership_changes_through_the_test_api() {
    let api = provider(start_server(MockConfig::default()), TransportKind::Agent);
    let descriptor = DomainNameCreateDescriptor::new(vec!["owned.rodeo".to_string()], 1, owner());
    assert!(api.domains().create(&descriptor).unwrap().succeeded());

    let mut update = DomainNameUpdateDescriptor::for_domains(vec!["owned.rodeo".to_string()]);
    update.owner_contact = Some(DomainNameContact::new("New Owner", "new@example.com"));
    api.domains().update(&update).unwrap();
    let owner_contact = api.domains().get("owned.rodeo").unwrap().owner_contact.unwrap();
    assert!(owner_contact.has_pending_change());

    api.test().decline_ownership_confirmation(&["owned.rodeo"]).unwrap();
    let owner_contact = api.domains().get("owned.rodeo").unwrap().owner_contact.unwrap();
    assert!(!owner_contact.has_pending_change());
    assert_eq!(owner_contact.name.as_deref(), Some("Jane Smith"));

    api.domains().update(&update).unwrap();
    api.test().accept_ownership_confirmation(&["owned.rodeo"]).unwrap();
    let owner_contact = api.domains().get("owned.rodeo").unwrap().owner_contact.unwrap();
    assert_eq!(owner_contact.name.as_deref(), Some("New Owner"));

    let changed = api
        .test()
        .update_domains(&TestDomainNameUpdateDescriptor {
            domain_names: vec!["owned.rodeo".to_string()],
            status: Some("EXPIRED".to_string()),
            ..TestDomainNameUpdateDescriptor::default()
        })
        .unwrap();
    assert!(changed);
    assert!(api.domains().get("owned.rodeo").unwrap().is_expired());

    api.test().update_account_balance(55.5).unwrap();
    assert_eq!(api.account().balance().unwrap(), 55.5);

    api.test().remove_domain_from_account("owned.rodeo").unwrap();
    assert!(api.domains().list(10, 1).unwrap().is_empty());
}

#[test]
fn rate_limit_is_mapped_to_client_exception() {
    for transport in TRANSPORTS {
        let api = provider(
            start_server(MockConfig {
                rate_limit: Some(1),
                ..MockConfig::default()
            }),
            transport,
        );
        api.utility().ping().unwrap();

        match api.utility().ping().unwrap_err() {
            ApiError::Remote(ClientException::RateLimitExceeded(remote)) => {
                assert_eq!(remote.status, 429);
                assert_eq!(remote.code(), Some(RemoteErrorCode::RateLimitExceeded));
            }
            other => panic!("{transport:?}: unexpected error {other:?}"),
        }
    }
}

#[test]
fn transaction_exception_is_mapped_for_lifecycle_calls() {
    for transport in TRANSPORTS {
        let api = provider(start_server(MockConfig::default()), transport);
        let update = DomainNameUpdateDescriptor::for_domains(vec!["missing.rodeo".to_string()]);

        match api.domains().update(&update).unwrap_err() {
            ApiError::Remote(ClientException::Transaction(exception)) => {
                assert_eq!(exception.reason(), Some("DOMAIN_NOT_IN_ACCOUNT"));
                assert_eq!(exception.message(), "The domain missing.rodeo is not in your account");
                assert_eq!(exception.remote.status, 400);
            }
            other => panic!("{transport:?}: unexpected error {other:?}"),
        }

        let err = api.domains().renew("missing.rodeo", 1).unwrap_err();
        assert!(matches!(err, ApiError::Remote(ClientException::Transaction(_))));
    }
}

#[test]
fn undeclared_remote_exceptions_fall_through() {
    for transport in TRANSPORTS {
        let addr = start_server(MockConfig::default());

        match provider(addr, transport).domains().get("missing.rodeo").unwrap_err() {
            ApiError::RemoteOperationFailed(remote) => {
                assert_eq!(remote.status, 404);
                assert!(remote.identifier.ends_with("ObjectNotFoundException"));
                assert_eq!(remote.code(), None);
            }
            other => panic!("{transport:?}: unexpected error {other:?}"),
        }

        let intruder = ApiProvider::new(format!("http://{addr}"), TEST_API_KEY, "wrong", transport.build());
        let err = intruder.utility().ping().unwrap_err();
        assert!(matches!(err, ApiError::RemoteOperationFailed(ref remote) if remote.status == 403));
    }
}

#[test]
fn structured_not_found_with_exception_type_is_mapped() {
    for transport in TRANSPORTS {
        let addr = start_server(MockConfig::default());
        let proxy = WebServiceProxy::new(
            format!("http://{addr}/diagnostics"),
            Arc::new(Parameters::new()),
            transport.build(),
        );
        let call = MethodCall::get("rateLimited").exceptions(ExceptionMap::rate_limited());

        match proxy.call_method(&call).unwrap_err() {
            ApiError::Remote(ClientException::RateLimitExceeded(remote)) => {
                assert_eq!(remote.status, 404);
                assert_eq!(remote.message, "Too many requests");
            }
            other => panic!("{transport:?}: unexpected error {other:?}"),
        }
    }
}

#[test]
fn unstructured_server_error_is_http_error() {
    for transport in TRANSPORTS {
        let addr = start_server(MockConfig::default());
        let proxy = WebServiceProxy::new(
            format!("http://{addr}/diagnostics"),
            Arc::new(Parameters::new()),
            transport.build(),
        );

        match proxy.call_method(&MethodCall::get("status/500")).unwrap_err() {
            ApiError::HttpRequestError { url, status, body } => {
                assert_eq!(url, format!("http://{addr}/diagnostics/status/500"));
                assert_eq!(status, 500);
                assert_eq!(body, "status 500");
            }
            other => panic!("{transport:?}: unexpected error {other:?}"),
        }
    }
}

/// What the echo route saw for `request`, per transport.
fn echoed(request: &RemoteRequest) -> Vec<Value> {
    TRANSPORTS
        .iter()
        .map(|transport| {
            let body = transport.build().dispatch(request, false, None).unwrap();
            serde_json::from_str(&body).unwrap()
        })
        .collect()
}

#[test]
fn transports_put_identical_requests_on_the_wire() {
    let addr = start_server(MockConfig::default());
    let url = format!("http://{addr}/diagnostics/echo");
    let params = Parameters::new()
        .with("apiKey", "KEY")
        .with("nameservers", vec!["ns1.example.net".to_string(), "ns 2".to_string()]);

    // GET: parameters only in the query string.
    let get = RemoteRequest::new(&url, HttpMethod::Get).with_parameters(params.clone());
    let seen = echoed(&get);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0]["query"], "apiKey=KEY&nameservers%5B0%5D=ns1.example.net&nameservers%5B1%5D=ns+2");
    assert_eq!(seen[0]["body"], "");
    assert_eq!(seen[0]["contentType"], "application/json");

    // POST without payload: parameters form-encoded in the body.
    let form = RemoteRequest::new(&url, HttpMethod::Post)
        .with_parameters(params.clone())
        .with_basic_auth("user", "pass");
    let seen = echoed(&form);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0]["query"], Value::Null);
    assert_eq!(seen[0]["body"], "apiKey=KEY&nameservers%5B0%5D=ns1.example.net&nameservers%5B1%5D=ns+2");
    assert_eq!(seen[0]["basicAuth"], "user:pass");

    // PUT with payload: payload is the body, parameters move to the query.
    let payload = RemoteRequest::new(&url, HttpMethod::Put)
        .with_parameters(Parameters::new().with("apiKey", "KEY"))
        .with_payload(r#"{"domainNames":["a.rodeo"]}"#)
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_basic_auth("user", "");
    let seen = echoed(&payload);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0]["query"], "apiKey=KEY");
    assert_eq!(seen[0]["body"], r#"{"domainNames":["a.rodeo"]}"#);
    assert_eq!(seen[0]["contentType"], "application/json; charset=utf-8");
    assert_eq!(seen[0]["authorization"], Value::Null);
}

#[test]
fn redirects_are_not_followed() {
    let addr = start_server(MockConfig::default());

    for method in [HttpMethod::Get, HttpMethod::Post] {
        let request = RemoteRequest::new(format!("http://{addr}/diagnostics/redirect"), method);
        let bodies: Vec<String> = TRANSPORTS
            .iter()
            .map(|transport| transport.build().dispatch(&request, false, None).unwrap())
            .collect();
        assert_eq!(bodies, vec!["moved", "moved"], "{method}");
    }
}

#[test]
fn ignore_errors_suppresses_only_network_failures() {
    let down = closed_port();
    let server = start_server(MockConfig::default());

    for transport in TRANSPORTS {
        let http = transport.build();

        let unreachable = RemoteRequest::new(format!("http://{down}/utility/ping"), HttpMethod::Get);
        assert_eq!(http.dispatch(&unreachable, true, Some(2)).unwrap(), "", "{transport:?}");
        assert!(http.dispatch(&unreachable, false, Some(2)).unwrap_err().is_network_failure());

        let failing = RemoteRequest::new(format!("http://{server}/diagnostics/status/503"), HttpMethod::Get);
        let err = http.dispatch(&failing, true, None).unwrap_err();
        assert_eq!(err.status(), Some(503), "{transport:?}");
    }
}

#[test]
fn slow_responses_time_out_as_network_failures() {
    let addr = start_server(MockConfig::default());
    let slow = RemoteRequest::new(format!("http://{addr}/diagnostics/slow/3000"), HttpMethod::Get).with_timeout(1);

    for transport in TRANSPORTS {
        let err = transport.build().dispatch(&slow, false, None).unwrap_err();
        assert!(err.is_network_failure(), "{transport:?}: {err:?}");
    }
}

#[test]
fn shaped_results_are_stable_across_calls() {
    let addr = start_server(MockConfig::default());
    let proxy = WebServiceProxy::new(
        format!("http://{addr}/domains"),
        Arc::new(Parameters::new().with("apiKey", TEST_API_KEY).with("apiSecret", TEST_API_SECRET)),
        TransportKind::Socket.build(),
    );
    let call = MethodCall::get("liveAvailability/stable.rodeo")
        .returns("DomainAvailability".parse::<Expected>().unwrap())
        .exceptions(ExceptionMap::rate_limited());

    let first = proxy.call_method(&call).unwrap();
    let second = proxy.call_method(&call).unwrap();
    assert_eq!(first, second);
}
