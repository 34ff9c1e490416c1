//! In-process stand-in for the Netistrar REST API.
//!
//! Serves the `domains`, `utility`, `account` and `test` resource groups
//! over an in-memory account. Every API route requires the `apiKey` and
//! `apiSecret` query parameters; failures are sent as serialised remote
//! exceptions (`exceptionClass`, `message`, optional `transactionErrors`).
//! Routes under `/diagnostics` skip authentication and exist to observe what
//! a client put on the wire.

mod registry;

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use registry::{
    is_valid_domain, DomainRecord, GlueRecord, Registry, RemoteException, TransactionBuilder, ACCESS_DENIED_EXCEPTION,
    NOT_FOUND_EXCEPTION, PRICE_PER_YEAR, RATE_LIMIT_EXCEPTION, TRANSACTION_EXCEPTION,
};

pub const TEST_API_KEY: &str = "TESTKEY";
pub const TEST_API_SECRET: &str = "TESTSECRET";

/// Behaviour knobs for one mock instance.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Authenticated calls allowed before every further call is rejected
    /// with a rate-limit exception.
    pub rate_limit: Option<usize>,
    pub opening_balance: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: TEST_API_KEY.to_string(),
            api_secret: TEST_API_SECRET.to_string(),
            rate_limit: None,
            opening_balance: 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    registry: Arc<RwLock<Registry>>,
    calls: Arc<AtomicUsize>,
}

type ApiResult = Result<Json<Value>, RemoteException>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        registry: Arc::new(RwLock::new(Registry::new(config.opening_balance))),
        config: Arc::new(config),
        calls: Arc::new(AtomicUsize::new(0)),
    };

    let api = Router::new()
        .route("/utility/ping", get(ping))
        .route("/account/balance", get(balance))
        .route("/domains", get(list_domains).post(create_domains).put(update_domains))
        .route("/domains/hintedAvailability", post(hinted_availability))
        .route("/domains/liveAvailability/{domain}", get(live_availability))
        .route("/domains/validate", post(validate_domains))
        .route("/domains/multiple", post(get_multiple_domains))
        .route("/domains/renew", post(renew_multiple))
        .route("/domains/renew/{domain}/{years}", get(renew_domain))
        .route("/domains/transfer", post(transfer_domains))
        .route("/domains/glue/{domain}", put(set_glue_records))
        .route("/domains/glue/{domain}/remove", post(remove_glue_records))
        .route("/domains/{domain}", get(get_domain))
        .route("/test/updateBalance/{balance}", get(test_update_balance))
        .route("/test/updateDomains", put(test_update_domains))
        .route("/test/removeDomainFromAccount/{domain}", get(test_remove_domain))
        .route("/test/createPullTransfer/{count}", get(test_create_pull_transfer))
        .route("/test/createPushTransfer/{count}", get(test_create_push_transfer))
        .route("/test/startTransferOut", post(test_start_transfer_out))
        .route("/test/acceptOwnershipConfirmation", post(test_accept_ownership))
        .route("/test/declineOwnershipConfirmation", post(test_decline_ownership))
        .route("/test/approveIncomingTransfer", post(test_approve_incoming))
        .route("/test/rejectIncomingTransfer", post(test_reject_incoming))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorise));

    let diagnostics = Router::new()
        .route("/diagnostics/echo", any(echo))
        .route("/diagnostics/status/{code}", get(fixed_status))
        .route("/diagnostics/slow/{millis}", get(slow))
        .route("/diagnostics/redirect", any(redirect))
        .route("/diagnostics/rateLimited", get(rate_limited_not_found));

    api.merge(diagnostics).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn authorise(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|Query(query)| query)
        .unwrap_or_default();
    let path = request.uri().path().to_string();

    let authorised = query.get("apiKey") == Some(&state.config.api_key)
        && query.get("apiSecret") == Some(&state.config.api_secret);
    if !authorised {
        warn!(path = %path, "rejected request with invalid credentials");
        return RemoteException::access_denied().into_response();
    }

    let calls = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if state.config.rate_limit.is_some_and(|limit| calls > limit) {
        warn!(path = %path, calls, "rate limit exceeded");
        return RemoteException::rate_limited().into_response();
    }

    debug!(method = %request.method(), path = %path, calls, "api request");
    next.run(request).await
}

fn not_in_account(domain: &str) -> RemoteException {
    RemoteException::transaction("DOMAIN_NOT_IN_ACCOUNT", format!("The domain {domain} is not in your account"))
}

// --- utility / account ---

async fn ping() -> &'static str {
    "OK"
}

async fn balance(State(state): State<AppState>) -> Json<f64> {
    Json(state.registry.read().await.balance)
}

// --- domains ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityRequest {
    search_term: String,
    #[serde(default)]
    tlds: Vec<String>,
    #[serde(default)]
    suggestions: bool,
    #[serde(default)]
    suggestion_options: Option<SuggestionOptions>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionOptions {
    #[serde(default = "default_fill_count")]
    fill_count: usize,
}

fn default_fill_count() -> usize {
    25
}

fn availability(registry: &Registry, domain: &str, with_prices: bool) -> Value {
    let taken = registry.contains(domain);
    let prices = if with_prices && !taken {
        json!({
            "registration": [{
                "operation": "registration",
                "numberOfYears": 1,
                "priceType": "STANDARD",
                "standardBuyPrice": format!("{PRICE_PER_YEAR:.2}"),
                "hintedBuyPrice": PRICE_PER_YEAR,
                "confirmedBuyPrice": PRICE_PER_YEAR,
            }],
            "renewal": [{
                "operation": "renewal",
                "numberOfYears": "1",
                "priceType": "STANDARD",
                "standardBuyPrice": PRICE_PER_YEAR,
                "hintedBuyPrice": "N/A",
                "confirmedBuyPrice": PRICE_PER_YEAR,
            }],
        })
    } else {
        json!([])
    };
    json!({
        "domainName": domain,
        "availability": if taken { "UNAVAILABLE" } else { "AVAILABLE" },
        "prices": prices,
    })
}

async fn hinted_availability(State(state): State<AppState>, Json(request): Json<AvailabilityRequest>) -> ApiResult {
    let registry = state.registry.read().await;
    let term = request
        .search_term
        .trim()
        .to_ascii_lowercase()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();
    let tlds = if request.tlds.is_empty() {
        vec!["com".to_string(), "rodeo".to_string(), "uk".to_string()]
    } else {
        request.tlds
    };

    let mut tld_results = Map::new();
    for tld in &tlds {
        tld_results.insert(tld.clone(), availability(&registry, &format!("{term}.{tld}"), false));
    }

    let suggestions: Vec<Value> = if request.suggestions {
        let fill_count = request
            .suggestion_options
            .map(|options| options.fill_count)
            .unwrap_or_else(default_fill_count);
        tlds.iter()
            .flat_map(|tld| [format!("get{term}.{tld}"), format!("{term}online.{tld}")])
            .take(fill_count)
            .map(|domain| availability(&registry, &domain, false))
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(json!({"tldResults": tld_results, "suggestions": suggestions})))
}

async fn live_availability(State(state): State<AppState>, Path(domain): Path<String>) -> ApiResult {
    if !is_valid_domain(&domain) {
        return Err(RemoteException::transaction(
            "DOMAIN_INVALID",
            format!("The domain {domain} is not a valid domain name"),
        ));
    }
    let registry = state.registry.read().await;
    Ok(Json(availability(&registry, &domain, true)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    #[serde(default)]
    domain_names: Vec<String>,
    #[serde(default = "one")]
    registration_years: u32,
    #[serde(default)]
    owner_contact: Value,
    #[serde(default)]
    nameservers: Vec<String>,
    #[serde(default = "one_u8")]
    privacy_proxy: u8,
    #[serde(default)]
    auto_renew: bool,
    #[serde(default)]
    tags: Vec<String>,
}

fn one() -> u32 {
    1
}

fn one_u8() -> u8 {
    1
}

/// The first problem with registering `domain`, if any.
fn create_problem(registry: &Registry, domain: &str) -> Option<(&'static str, String)> {
    if !is_valid_domain(domain) {
        Some(("DOMAIN_INVALID", format!("The domain {domain} is not a valid domain name")))
    } else if registry.contains(domain) {
        Some(("DOMAIN_UNAVAILABLE", format!("The domain {domain} is not available")))
    } else {
        None
    }
}

async fn validate_domains(State(state): State<AppState>, Json(request): Json<CreateRequest>) -> ApiResult {
    let registry = state.registry.read().await;
    let mut results = Map::new();
    for domain in &request.domain_names {
        if let Some((code, message)) = create_problem(&registry, domain) {
            let mut errors = Map::new();
            errors.insert(code.to_string(), json!({"code": code, "message": message}));
            results.insert(domain.clone(), Value::Object(errors));
        }
    }
    Ok(Json(Value::Object(results)))
}

async fn create_domains(State(state): State<AppState>, Json(request): Json<CreateRequest>) -> ApiResult {
    if request.domain_names.is_empty() {
        return Err(RemoteException::transaction("NO_DOMAINS_SUPPLIED", "No domain names were supplied"));
    }
    let mut registry = state.registry.write().await;
    let cost = PRICE_PER_YEAR * f64::from(request.registration_years);
    let mut tx = TransactionBuilder::new("DOMAIN_CREATE");

    for domain in &request.domain_names {
        if let Some((code, message)) = create_problem(&registry, domain) {
            tx.failed(domain, code, &message);
            continue;
        }
        if registry.balance < cost {
            tx.failed(domain, "INSUFFICIENT_FUNDS", "Your account balance is too low");
            continue;
        }
        let mut record = DomainRecord::new(domain, request.registration_years, request.owner_contact.clone());
        record.nameservers = request.nameservers.clone();
        record.privacy_proxy = request.privacy_proxy;
        record.auto_renew = request.auto_renew;
        record.tags = request.tags.clone();
        registry.insert(record);
        registry.balance -= cost;
        tx.succeeded(domain, Value::Null, cost);
    }

    info!(domains = request.domain_names.len(), subtotal = tx.subtotal(), "domains created");
    Ok(Json(tx.build()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_page")]
    page: usize,
}

fn default_page_size() -> usize {
    50
}

fn default_page() -> usize {
    1
}

async fn list_domains(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult {
    let registry = state.registry.read().await;
    let skip = query.page.saturating_sub(1) * query.page_size;
    let names: Vec<&str> = registry.names().skip(skip).take(query.page_size).collect();
    Ok(Json(json!(names)))
}

async fn get_domain(State(state): State<AppState>, Path(domain): Path<String>) -> ApiResult {
    let registry = state.registry.read().await;
    let record = registry
        .get(&domain)
        .ok_or_else(|| RemoteException::not_found(&format!("The domain {domain}")))?;
    Ok(Json(json!(record)))
}

async fn get_multiple_domains(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> ApiResult {
    let registry = state.registry.read().await;
    let mut found = Map::new();
    for domain in &domains {
        if let Some(record) = registry.get(domain) {
            found.insert(domain.clone(), json!(record));
        }
    }
    Ok(Json(Value::Object(found)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    domain_names: Vec<String>,
    owner_contact: Option<Value>,
    admin_contact: Option<Value>,
    billing_contact: Option<Value>,
    technical_contact: Option<Value>,
    nameservers: Option<Vec<String>>,
    locked: Option<bool>,
    privacy_proxy: Option<u8>,
    auto_renew: Option<bool>,
    tags: Option<Vec<String>>,
}

async fn update_domains(State(state): State<AppState>, Json(request): Json<UpdateRequest>) -> ApiResult {
    let mut registry = state.registry.write().await;
    if let Some(missing) = request.domain_names.iter().find(|d| !registry.contains(d)) {
        return Err(not_in_account(missing));
    }

    let mut tx = TransactionBuilder::new("DOMAIN_UPDATE");
    for domain in &request.domain_names {
        let Some(record) = registry.get_mut(domain) else {
            continue;
        };
        if let Some(contact) = &request.owner_contact {
            // Owner changes wait for confirmation.
            let mut current = record.owner_contact.clone();
            if let Some(object) = current.as_object_mut() {
                object.insert("pendingContact".to_string(), contact.clone());
            } else {
                current = json!({"pendingContact": contact});
            }
            record.owner_contact = current;
        }
        if let Some(contact) = &request.admin_contact {
            record.admin_contact = contact.clone();
        }
        if let Some(contact) = &request.billing_contact {
            record.billing_contact = contact.clone();
        }
        if let Some(contact) = &request.technical_contact {
            record.technical_contact = contact.clone();
        }
        if let Some(nameservers) = &request.nameservers {
            record.nameservers = nameservers.clone();
        }
        if let Some(locked) = request.locked {
            record.locked = locked;
        }
        if let Some(privacy_proxy) = request.privacy_proxy {
            record.privacy_proxy = privacy_proxy;
        }
        if let Some(auto_renew) = request.auto_renew {
            record.auto_renew = auto_renew;
        }
        if let Some(tags) = &request.tags {
            record.tags = tags.clone();
        }
        tx.succeeded(domain, Value::Null, 0.0);
    }
    Ok(Json(tx.build()))
}

async fn renew_domain(State(state): State<AppState>, Path((domain, years)): Path<(String, u32)>) -> ApiResult {
    let mut registry = state.registry.write().await;
    let record = registry.get_mut(&domain).ok_or_else(|| not_in_account(&domain))?;
    record.renew(years);
    let expiry = record.expiry_date.clone();

    let cost = PRICE_PER_YEAR * f64::from(years);
    registry.balance -= cost;
    let mut tx = TransactionBuilder::new("DOMAIN_RENEW");
    tx.succeeded(&domain, json!({"expiryDate": expiry}), cost);
    Ok(Json(tx.build()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewRequest {
    domain_names: Vec<String>,
    additional_years: u32,
}

async fn renew_multiple(State(state): State<AppState>, Json(request): Json<RenewRequest>) -> ApiResult {
    let mut registry = state.registry.write().await;
    let cost = PRICE_PER_YEAR * f64::from(request.additional_years);
    let mut tx = TransactionBuilder::new("DOMAIN_RENEW");
    for domain in &request.domain_names {
        match registry.get_mut(domain) {
            Some(record) => {
                record.renew(request.additional_years);
                let expiry = record.expiry_date.clone();
                registry.balance -= cost;
                tx.succeeded(domain, json!({"expiryDate": expiry}), cost);
            }
            None => tx.failed(
                domain,
                "DOMAIN_NOT_IN_ACCOUNT",
                &format!("The domain {domain} is not in your account"),
            ),
        }
    }
    Ok(Json(tx.build()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    transfer_identifiers: Vec<String>,
    #[serde(default)]
    owner_contact: Value,
}

async fn transfer_domains(State(state): State<AppState>, Json(request): Json<TransferRequest>) -> ApiResult {
    let mut registry = state.registry.write().await;
    let mut tx = TransactionBuilder::new("DOMAIN_TRANSFER_IN");
    for identifier in &request.transfer_identifiers {
        let Some((domain, auth_code)) = identifier.split_once(',') else {
            tx.failed(identifier, "TRANSFER_IDENTIFIER_INVALID", "Transfer identifiers take the form domain,authcode");
            continue;
        };
        let domain = domain.trim();
        if auth_code.trim().is_empty() || !is_valid_domain(domain) {
            tx.failed(domain, "TRANSFER_IDENTIFIER_INVALID", "Transfer identifiers take the form domain,authcode");
        } else if registry.contains(domain) {
            tx.failed(domain, "DOMAIN_ALREADY_IN_ACCOUNT", &format!("The domain {domain} is already in your account"));
        } else {
            let mut record = DomainRecord::new(domain, 1, request.owner_contact.clone());
            record.status = "TRANSFER_PENDING".to_string();
            registry.insert(record);
            registry.balance -= PRICE_PER_YEAR;
            tx.succeeded(domain, Value::Null, PRICE_PER_YEAR);
        }
    }
    Ok(Json(tx.build()))
}

fn valid_glue_record(record: &GlueRecord) -> bool {
    let v4 = record.ipv4_address.as_deref().map(|ip| ip.parse::<Ipv4Addr>().is_ok());
    let v6 = record.ipv6_address.as_deref().map(|ip| ip.parse::<Ipv6Addr>().is_ok());
    !record.sub_domain_prefix.is_empty()
        && (v4.is_some() || v6.is_some())
        && v4.unwrap_or(true)
        && v6.unwrap_or(true)
}

async fn set_glue_records(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(records): Json<Vec<GlueRecord>>,
) -> ApiResult {
    let mut registry = state.registry.write().await;
    let existing = registry.get_mut(&domain).ok_or_else(|| not_in_account(&domain))?;
    let mut tx = TransactionBuilder::new("DOMAIN_GLUE_RECORD_SET");
    for record in records {
        let prefix = record.sub_domain_prefix.clone();
        if !valid_glue_record(&record) {
            tx.failed(&prefix, "GLUE_RECORD_INVALID", "Invalid glue record supplied");
            continue;
        }
        existing.glue_records.retain(|glue| glue.sub_domain_prefix != prefix);
        existing.glue_records.push(record);
        tx.succeeded(&prefix, Value::Null, 0.0);
    }
    Ok(Json(tx.build()))
}

async fn remove_glue_records(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(prefixes): Json<Vec<String>>,
) -> ApiResult {
    let mut registry = state.registry.write().await;
    let existing = registry.get_mut(&domain).ok_or_else(|| not_in_account(&domain))?;
    let mut tx = TransactionBuilder::new("DOMAIN_GLUE_RECORD_REMOVE");
    for prefix in &prefixes {
        let before = existing.glue_records.len();
        existing.glue_records.retain(|glue| &glue.sub_domain_prefix != prefix);
        if existing.glue_records.len() < before {
            tx.succeeded(prefix, Value::Null, 0.0);
        } else {
            tx.failed(prefix, "GLUE_RECORD_NOT_FOUND", "No glue record exists for that prefix");
        }
    }
    Ok(Json(tx.build()))
}

// --- test ---

async fn test_update_balance(State(state): State<AppState>, Path(balance): Path<f64>) -> StatusCode {
    state.registry.write().await.balance = balance;
    StatusCode::OK
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestUpdateRequest {
    domain_names: Vec<String>,
    status: Option<String>,
    expiry_date: Option<String>,
    locked_until: Option<String>,
    owner_contact: Option<Value>,
}

async fn test_update_domains(State(state): State<AppState>, Json(request): Json<TestUpdateRequest>) -> ApiResult {
    let mut registry = state.registry.write().await;
    if let Some(missing) = request.domain_names.iter().find(|d| !registry.contains(d)) {
        return Err(not_in_account(missing));
    }
    for domain in &request.domain_names {
        if let Some(record) = registry.get_mut(domain) {
            if let Some(status) = &request.status {
                record.status = status.clone();
            }
            if let Some(expiry) = &request.expiry_date {
                record.expiry_date = expiry.clone();
            }
            if let Some(locked_until) = &request.locked_until {
                record.locked_until = locked_until.clone();
            }
            if let Some(contact) = &request.owner_contact {
                record.owner_contact = contact.clone();
            }
        }
    }
    Ok(Json(json!(true)))
}

async fn test_remove_domain(State(state): State<AppState>, Path(domain): Path<String>) -> Result<StatusCode, RemoteException> {
    state
        .registry
        .write()
        .await
        .remove(&domain)
        .map(|_| StatusCode::OK)
        .ok_or_else(|| RemoteException::not_found(&format!("The domain {domain}")))
}

fn check_count(count: usize) -> Result<(), RemoteException> {
    if (1..=10).contains(&count) {
        Ok(())
    } else {
        Err(RemoteException::transaction(
            "INVALID_DOMAIN_COUNT",
            "Between 1 and 10 domains may be created at a time",
        ))
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn test_create_pull_transfer(Path(count): Path<usize>) -> ApiResult {
    check_count(count)?;
    let pairs: Vec<[String; 2]> = (0..count)
        .map(|_| [format!("pull-{}.rodeo", short_id()), short_id()])
        .collect();
    Ok(Json(json!(pairs)))
}

async fn test_create_push_transfer(State(state): State<AppState>, Path(count): Path<usize>) -> ApiResult {
    check_count(count)?;
    let mut registry = state.registry.write().await;
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let mut record = DomainRecord::new(&format!("push-{}.uk", short_id()), 1, Value::Null);
        record.status = "TRANSFER_PENDING".to_string();
        names.push(record.domain_name.clone());
        registry.insert(record);
    }
    Ok(Json(json!(names)))
}

/// Apply `change` to each named domain in the account; unknown names are
/// ignored.
async fn for_each_domain(state: &AppState, domains: &[String], change: impl Fn(&mut DomainRecord)) {
    let mut registry = state.registry.write().await;
    for domain in domains {
        if let Some(record) = registry.get_mut(domain) {
            change(record);
        }
    }
}

async fn test_start_transfer_out(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> StatusCode {
    for_each_domain(&state, &domains, |record| record.status = "TRANSFER_OUT_PENDING".to_string()).await;
    StatusCode::OK
}

async fn test_accept_ownership(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> StatusCode {
    for_each_domain(&state, &domains, |record| {
        let pending = record.owner_contact.get("pendingContact").cloned();
        if let Some(pending) = pending {
            record.owner_contact = pending;
        }
    })
    .await;
    StatusCode::OK
}

async fn test_decline_ownership(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> StatusCode {
    for_each_domain(&state, &domains, |record| {
        if let Some(object) = record.owner_contact.as_object_mut() {
            object.remove("pendingContact");
        }
    })
    .await;
    StatusCode::OK
}

async fn test_approve_incoming(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> StatusCode {
    for_each_domain(&state, &domains, |record| {
        if record.status == "TRANSFER_PENDING" {
            record.status = "ACTIVE".to_string();
        }
    })
    .await;
    StatusCode::OK
}

async fn test_reject_incoming(State(state): State<AppState>, Json(domains): Json<Vec<String>>) -> StatusCode {
    for_each_domain(&state, &domains, |record| {
        if record.status == "TRANSFER_PENDING" {
            record.status = "TRANSFER_REJECTED".to_string();
        }
    })
    .await;
    StatusCode::OK
}

// --- diagnostics ---

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let header_value = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let authorization = header_value(header::AUTHORIZATION);
    let basic_auth = authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|token| STANDARD.decode(token).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "contentType": header_value(header::CONTENT_TYPE),
        "authorization": authorization,
        "basicAuth": basic_auth,
        "body": body,
    }))
}

async fn fixed_status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, format!("status {code}"))
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "OK"
}

/// A 302 pointing at the echo route.
async fn redirect() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    (StatusCode::FOUND, [(header::LOCATION, "/diagnostics/echo")], "moved")
}

async fn rate_limited_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"exceptionType": "RateLimitExceeded", "message": "Too many requests"})),
    )
}
