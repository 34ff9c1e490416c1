use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const RATE_LIMIT_EXCEPTION: &str = "\\Kinikit\\MVC\\Exception\\RateLimitExceededException";
pub const ACCESS_DENIED_EXCEPTION: &str = "\\Kinikit\\MVC\\Exception\\AccessDeniedException";
pub const NOT_FOUND_EXCEPTION: &str = "\\Kinikit\\MVC\\Exception\\ObjectNotFoundException";
pub const TRANSACTION_EXCEPTION: &str = "\\Netistrar\\WebServices\\Common\\Exception\\TransactionException";

/// GBP per registration year.
pub const PRICE_PER_YEAR: f64 = 10.0;
const TAX_RATE: f64 = 0.2;

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1000);

/// A serialised remote exception, sent as a JSON error body.
#[derive(Debug, Clone)]
pub struct RemoteException {
    pub status: StatusCode,
    pub class: &'static str,
    pub message: String,
    pub transaction_errors: Option<Map<String, Value>>,
}

impl RemoteException {
    pub fn new(status: StatusCode, class: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            class,
            message: message.into(),
            transaction_errors: None,
        }
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            RATE_LIMIT_EXCEPTION,
            "Rate limit exceeded for this API key",
        )
    }

    pub fn access_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, ACCESS_DENIED_EXCEPTION, "Invalid API credentials")
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_EXCEPTION, format!("{what} could not be found"))
    }

    /// A `TransactionException` carrying a single reason code.
    pub fn transaction(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = Map::new();
        errors.insert(code.to_string(), json!({"code": code, "message": message}));
        Self {
            status: StatusCode::BAD_REQUEST,
            class: TRANSACTION_EXCEPTION,
            message,
            transaction_errors: Some(errors),
        }
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "exceptionClass": self.class,
            "message": self.message,
            "code": self.status.as_u16(),
        });
        if let (Some(errors), Some(object)) = (&self.transaction_errors, body.as_object_mut()) {
            object.insert("transactionErrors".to_string(), Value::Object(errors.clone()));
        }
        body
    }
}

impl IntoResponse for RemoteException {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlueRecord {
    pub sub_domain_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

/// A domain held in the account, in the remote's wire shape.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub domain_name: String,
    pub status: String,
    pub registered_date: String,
    pub expiry_date: String,
    pub locked_until: String,
    pub locked: bool,
    pub privacy_proxy: u8,
    pub auto_renew: bool,
    pub auth_code: String,
    pub nameservers: Vec<String>,
    pub owner_contact: Value,
    pub admin_contact: Value,
    pub billing_contact: Value,
    pub technical_contact: Value,
    pub glue_records: Vec<GlueRecord>,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub expiry_year: u32,
}

impl DomainRecord {
    pub fn new(domain_name: &str, years: u32, owner_contact: Value) -> Self {
        let expiry_year = 2026 + years;
        Self {
            domain_name: domain_name.to_string(),
            status: "ACTIVE".to_string(),
            registered_date: "01/01/2026 00:00:00".to_string(),
            expiry_date: format!("01/01/{expiry_year} 00:00:00"),
            locked_until: "N/A".to_string(),
            locked: true,
            privacy_proxy: 1,
            auto_renew: false,
            auth_code: Uuid::new_v4().simple().to_string()[..12].to_string(),
            nameservers: Vec::new(),
            admin_contact: owner_contact.clone(),
            billing_contact: owner_contact.clone(),
            technical_contact: owner_contact.clone(),
            owner_contact,
            glue_records: Vec::new(),
            tags: Vec::new(),
            expiry_year,
        }
    }

    pub fn renew(&mut self, years: u32) {
        self.expiry_year += years;
        self.expiry_date = format!("01/01/{} 00:00:00", self.expiry_year);
    }
}

/// Account state behind the mock API.
#[derive(Debug)]
pub struct Registry {
    pub balance: f64,
    domains: BTreeMap<String, DomainRecord>,
}

impl Registry {
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            domains: BTreeMap::new(),
        }
    }

    pub fn contains(&self, domain_name: &str) -> bool {
        self.domains.contains_key(domain_name)
    }

    pub fn get(&self, domain_name: &str) -> Option<&DomainRecord> {
        self.domains.get(domain_name)
    }

    pub fn get_mut(&mut self, domain_name: &str) -> Option<&mut DomainRecord> {
        self.domains.get_mut(domain_name)
    }

    /// Domain names in the account, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn insert(&mut self, record: DomainRecord) {
        self.domains.insert(record.domain_name.clone(), record);
    }

    pub fn remove(&mut self, domain_name: &str) -> Option<DomainRecord> {
        self.domains.remove(domain_name)
    }
}

/// Syntactic check for `label.tld` names.
pub fn is_valid_domain(name: &str) -> bool {
    let labels: Vec<&str> = name.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Builds a transaction body element by element.
#[derive(Debug)]
pub struct TransactionBuilder {
    kind: &'static str,
    elements: Map<String, Value>,
    succeeded: usize,
    failed: usize,
    subtotal: f64,
}

impl TransactionBuilder {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            elements: Map::new(),
            succeeded: 0,
            failed: 0,
            subtotal: 0.0,
        }
    }

    pub fn succeeded(&mut self, key: &str, operation_data: Value, cost: f64) {
        self.succeeded += 1;
        self.subtotal += cost;
        // Empty maps go out as `[]`, the way the live service sends them.
        self.elements.insert(
            key.to_string(),
            json!({
                "description": key,
                "elementStatus": "SUCCEEDED",
                "operationData": operation_data,
                "elementErrors": [],
            }),
        );
    }

    pub fn failed(&mut self, key: &str, code: &str, message: &str) {
        self.failed += 1;
        let mut errors = Map::new();
        errors.insert(code.to_string(), json!({"code": code, "message": message}));
        self.elements.insert(
            key.to_string(),
            json!({
                "description": key,
                "elementStatus": "FAILED",
                "elementErrors": Value::Object(errors),
            }),
        );
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn build(self) -> Value {
        let status = match (self.succeeded, self.failed) {
            (_, 0) => "SUCCEEDED",
            (0, _) => "ALL_ELEMENTS_FAILED",
            _ => "PARTIALLY_SUCCEEDED",
        };
        let (order_id, currency, subtotal, taxes, total) = if self.subtotal > 0.0 {
            let taxes = self.subtotal * TAX_RATE;
            (
                json!(NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)),
                json!("GBP"),
                json!(self.subtotal),
                json!(taxes),
                json!(self.subtotal + taxes),
            )
        } else {
            (json!("N/A"), json!("N/A"), json!("N/A"), json!("N/A"), json!("N/A"))
        };

        json!({
            "transactionType": self.kind,
            "transactionDateTime": "01/01/2026 12:00:00",
            "transactionStatus": status,
            "orderId": order_id,
            "orderCurrency": currency,
            "orderSubtotal": subtotal,
            "orderTaxes": taxes,
            "orderTotal": total,
            "transactionElements": Value::Object(self.elements),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_validation() {
        assert!(is_valid_domain("example.rodeo"));
        assert!(is_valid_domain("shop.co.uk"));
        assert!(!is_valid_domain("nodot"));
        assert!(!is_valid_domain("-bad.com"));
        assert!(!is_valid_domain("sp ace.com"));
    }

    #[test]
    fn transaction_status_follows_elements() {
        let mut tx = TransactionBuilder::new("DOMAIN_CREATE");
        tx.succeeded("a.rodeo", Value::Null, 10.0);
        tx.failed("b.rodeo", "DOMAIN_UNAVAILABLE", "Unavailable");
        let body = tx.build();
        assert_eq!(body["transactionStatus"], "PARTIALLY_SUCCEEDED");
        assert_eq!(body["orderCurrency"], "GBP");
        assert_eq!(body["orderTotal"], 12.0);
    }

    #[test]
    fn free_transactions_have_no_order() {
        let mut tx = TransactionBuilder::new("DOMAIN_UPDATE");
        tx.succeeded("a.rodeo", Value::Null, 0.0);
        let body = tx.build();
        assert_eq!(body["transactionStatus"], "SUCCEEDED");
        assert_eq!(body["orderId"], "N/A");
    }

    #[test]
    fn transaction_exception_body_lists_reasons() {
        let body = RemoteException::transaction("DOMAIN_NOT_IN_ACCOUNT", "Not yours").body();
        assert_eq!(body["exceptionClass"], TRANSACTION_EXCEPTION);
        assert_eq!(body["transactionErrors"]["DOMAIN_NOT_IN_ACCOUNT"]["message"], "Not yours");
    }

    #[test]
    fn renew_moves_expiry() {
        let mut record = DomainRecord::new("a.rodeo", 1, Value::Null);
        assert_eq!(record.expiry_date, "01/01/2027 00:00:00");
        record.renew(2);
        assert_eq!(record.expiry_date, "01/01/2029 00:00:00");
    }
}
