use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, OrderedMap};

/// Overall outcome of a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Succeeded,
    PartiallySucceeded,
    AllElementsFailed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// An error attached to a transaction or one of its elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_data: Option<Value>,
}

/// The part of a transaction concerning one domain name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionElement {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub element_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_data: Option<Value>,
    #[serde(default)]
    pub element_errors: OrderedMap<TransactionError>,
}

impl TransactionElement {
    pub fn has_errors(&self) -> bool {
        !self.element_errors.is_empty()
    }
}

/// Result of a lifecycle operation (create, renew, update, transfer, glue).
///
/// Order amounts are absent (`"N/A"` on the wire) unless the operation
/// produced a costed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub transaction_date_time: Option<String>,
    #[serde(default)]
    pub transaction_status: TransactionStatus,
    #[serde(default, deserialize_with = "lenient::u64_opt")]
    pub order_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string_opt")]
    pub order_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub order_subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub order_taxes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub order_total: Option<f64>,
    /// Elements keyed by domain name.
    #[serde(default)]
    pub transaction_elements: OrderedMap<TransactionElement>,
    #[serde(default)]
    pub transaction_error: Option<TransactionError>,
}

impl Transaction {
    pub fn succeeded(&self) -> bool {
        self.transaction_status == TransactionStatus::Succeeded
    }

    /// The first error found on any element, in element order.
    pub fn first_element_error(&self) -> Option<&TransactionError> {
        self.transaction_elements
            .values()
            .find_map(|element| element.element_errors.values().next())
    }

    /// A human-readable failure message: the transaction-level error, then
    /// the first element error.
    pub fn failure_message(&self) -> Option<&str> {
        if self.succeeded() {
            return None;
        }
        self.transaction_error
            .as_ref()
            .or_else(|| self.first_element_error())
            .map(|error| error.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_succeeded_transaction_with_order() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "transactionType": "DOMAIN_CREATE",
                "transactionStatus": "SUCCEEDED",
                "orderId": 1234,
                "orderCurrency": "GBP",
                "orderSubtotal": "10.00",
                "orderTaxes": 2,
                "orderTotal": 12.0,
                "transactionElements": {
                    "example.rodeo": {"elementStatus": "SUCCEEDED", "elementErrors": []}
                }
            }"#,
        )
        .unwrap();
        assert!(tx.succeeded());
        assert_eq!(tx.order_id, Some(1234));
        assert_eq!(tx.order_subtotal, Some(10.0));
        assert_eq!(tx.transaction_elements.keys().collect::<Vec<_>>(), vec!["example.rodeo"]);
        assert_eq!(tx.failure_message(), None);
    }

    #[test]
    fn not_applicable_order_fields_are_absent() {
        let tx: Transaction = serde_json::from_str(
            r#"{"transactionStatus":"SUCCEEDED","orderId":"N/A","orderCurrency":"N/A","orderTotal":"N/A"}"#,
        )
        .unwrap();
        assert_eq!(tx.order_id, None);
        assert_eq!(tx.order_currency, None);
        assert_eq!(tx.order_total, None);
    }

    #[test]
    fn unknown_status_does_not_fail_parsing() {
        let tx: Transaction = serde_json::from_str(r#"{"transactionStatus":"SOMETHING_NEW"}"#).unwrap();
        assert_eq!(tx.transaction_status, TransactionStatus::Unknown);
    }

    #[test]
    fn failure_message_prefers_first_element_error() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "transactionStatus": "ALL_ELEMENTS_FAILED",
                "transactionElements": {
                    "a.com": {"elementStatus": "SUCCEEDED", "elementErrors": {}},
                    "b.com": {"elementStatus": "FAILED", "elementErrors": {
                        "GLUE_RECORD_INVALID": {"code": "GLUE_RECORD_INVALID", "message": "Invalid glue record"}
                    }}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(tx.failure_message(), Some("Invalid glue record"));
        assert!(tx.transaction_elements.get("b.com").unwrap().has_errors());
    }
}
