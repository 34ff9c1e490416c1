use serde::{Deserialize, Serialize};

use super::{lenient, OrderedMap};

/// A contact attached to a domain name (owner, admin, billing or technical).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string_opt")]
    pub telephone_dialling_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string_opt")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string_opt")]
    pub fax_dialling_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::string_opt")]
    pub fax: Option<String>,
    /// Set while an owner change is awaiting confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_contact: Option<Box<DomainNameContact>>,
}

impl DomainNameContact {
    pub fn new(name: impl Into<String>, email_address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email_address: Some(email_address.into()),
            ..Self::default()
        }
    }

    /// Split a `dialling-code.number` phone string (e.g. `44.1865123456`).
    pub fn split_phone(full: &str) -> (Option<String>, Option<String>) {
        let mut parts = full.splitn(2, '.');
        let code = parts.next().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let number = parts.next().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        (code, number)
    }

    pub fn with_telephone(mut self, full: &str) -> Self {
        let (code, number) = Self::split_phone(full);
        self.telephone_dialling_code = code;
        self.telephone = number;
        self
    }

    pub fn with_fax(mut self, full: &str) -> Self {
        let (code, number) = Self::split_phone(full);
        self.fax_dialling_code = code;
        self.fax = number;
        self
    }

    /// The telephone in `dialling-code.number` form, when a number is set.
    pub fn phone_number(&self) -> Option<String> {
        let number = self.telephone.as_deref()?;
        Some(format!("{}.{}", self.telephone_dialling_code.as_deref().unwrap_or_default(), number))
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending_contact.is_some()
    }
}

/// A child nameserver (glue record) for a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameGlueRecord {
    pub sub_domain_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

impl DomainNameGlueRecord {
    pub fn new(sub_domain_prefix: impl Into<String>, ipv4_address: Option<String>) -> Self {
        Self {
            sub_domain_prefix: sub_domain_prefix.into(),
            ipv4_address,
            ipv6_address: None,
        }
    }
}

/// Full details for a domain name held in the account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameObject {
    pub domain_name: String,
    #[serde(default)]
    pub status: Option<String>,
    /// `dd/mm/YYYY HH:mi:ss`
    #[serde(default, deserialize_with = "lenient::string_opt")]
    pub registered_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_opt")]
    pub expiry_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_opt")]
    pub locked_until: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub locked: bool,
    #[serde(default, deserialize_with = "lenient::u64_opt")]
    pub privacy_proxy: Option<u64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub auto_renew: bool,
    #[serde(default, deserialize_with = "lenient::string_opt")]
    pub auth_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub nameservers: Vec<String>,
    #[serde(default)]
    pub owner_contact: Option<DomainNameContact>,
    #[serde(default)]
    pub admin_contact: Option<DomainNameContact>,
    #[serde(default)]
    pub billing_contact: Option<DomainNameContact>,
    #[serde(default)]
    pub technical_contact: Option<DomainNameContact>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub glue_records: Vec<DomainNameGlueRecord>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub tags: Vec<String>,
}

impl DomainNameObject {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("ACTIVE")
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.status.as_deref(), Some("EXPIRED") | Some("RGP"))
    }

    pub fn uses_privacy_proxy(&self) -> bool {
        self.privacy_proxy == Some(1)
    }
}

fn default_privacy_proxy() -> u8 {
    1
}

/// Descriptor for registering one or more domain names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameCreateDescriptor {
    pub domain_names: Vec<String>,
    pub registration_years: u32,
    pub owner_contact: DomainNameContact,
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_contact: Option<DomainNameContact>,
    /// 0 = public WHOIS, 1 = privacy proxy, 2 = partial redaction.
    #[serde(default = "default_privacy_proxy")]
    pub privacy_proxy: u8,
    #[serde(default)]
    pub auto_renew: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl DomainNameCreateDescriptor {
    pub fn new(domain_names: Vec<String>, registration_years: u32, owner_contact: DomainNameContact) -> Self {
        Self {
            domain_names,
            registration_years,
            owner_contact,
            nameservers: Vec::new(),
            admin_contact: None,
            billing_contact: None,
            technical_contact: None,
            privacy_proxy: default_privacy_proxy(),
            auto_renew: false,
            tags: Vec::new(),
        }
    }
}

/// Descriptor for starting incoming transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameTransferDescriptor {
    /// Entries of the form `domain,authcode`.
    pub transfer_identifiers: Vec<String>,
    pub owner_contact: DomainNameContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_contact: Option<DomainNameContact>,
    #[serde(default = "default_privacy_proxy")]
    pub privacy_proxy: u8,
    #[serde(default)]
    pub auto_renew: bool,
}

impl DomainNameTransferDescriptor {
    pub fn new(transfer_identifiers: Vec<String>, owner_contact: DomainNameContact) -> Self {
        Self {
            transfer_identifiers,
            owner_contact,
            admin_contact: None,
            billing_contact: None,
            technical_contact: None,
            privacy_proxy: default_privacy_proxy(),
            auto_renew: false,
        }
    }

    pub fn transfer_identifier(domain_name: &str, auth_code: &str) -> String {
        format!("{domain_name},{auth_code}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameRenewDescriptor {
    pub domain_names: Vec<String>,
    pub additional_years: u32,
}

impl DomainNameRenewDescriptor {
    pub fn new(domain_names: Vec<String>, additional_years: u32) -> Self {
        Self {
            domain_names,
            additional_years,
        }
    }
}

/// Descriptor for updating domains. Only fields that are set are sent, so
/// the remote leaves everything else unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameUpdateDescriptor {
    pub domain_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_contact: Option<DomainNameContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_proxy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_renew: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl DomainNameUpdateDescriptor {
    pub fn for_domains(domain_names: Vec<String>) -> Self {
        Self {
            domain_names,
            ..Self::default()
        }
    }
}

/// Options controlling suggestion generation in availability searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameSuggestionOptions {
    pub include_tlds: bool,
    pub include_categories: bool,
    pub fill_count: u32,
}

impl Default for DomainNameSuggestionOptions {
    fn default() -> Self {
        Self {
            include_tlds: true,
            include_categories: true,
            fill_count: 25,
        }
    }
}

/// Descriptor for an availability search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameAvailabilityDescriptor {
    pub search_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tld_categories: Option<Vec<String>>,
    #[serde(default)]
    pub tlds: Vec<String>,
    #[serde(default)]
    pub suggestions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_options: Option<DomainNameSuggestionOptions>,
}

impl DomainNameAvailabilityDescriptor {
    /// TLDs are accepted with or without surrounding dots.
    pub fn new<I, S>(search_term: impl Into<String>, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            search_term: search_term.into(),
            tld_categories: None,
            tlds: tlds
                .into_iter()
                .map(|tld| tld.as_ref().trim_matches('.').to_string())
                .collect(),
            suggestions: false,
            suggestion_options: None,
        }
    }

    pub fn with_suggestions(mut self, options: DomainNameSuggestionOptions) -> Self {
        self.suggestions = true;
        self.suggestion_options = Some(options);
        self
    }
}

/// Price for one operation over a number of years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAvailabilityPrice {
    /// `registration`, `renewal` or `transfer`.
    pub operation: String,
    #[serde(default, deserialize_with = "lenient::u64_opt")]
    pub number_of_years: Option<u64>,
    #[serde(default)]
    pub price_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub standard_buy_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub hinted_buy_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub confirmed_buy_price: Option<f64>,
}

/// Availability of a single domain name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAvailability {
    pub domain_name: String,
    /// `AVAILABLE`, `UNAVAILABLE` or a not-supported marker.
    pub availability: String,
    /// Prices keyed by operation.
    #[serde(default)]
    pub prices: OrderedMap<Vec<DomainAvailabilityPrice>>,
}

impl DomainAvailability {
    pub fn is_available(&self) -> bool {
        self.availability == "AVAILABLE"
    }

    pub fn is_registered(&self) -> bool {
        self.availability == "UNAVAILABLE"
    }

    /// The second-level label and the remaining TLD, e.g. `("shop", "co.uk")`.
    pub fn split_name(&self) -> (&str, &str) {
        self.domain_name
            .split_once('.')
            .unwrap_or((self.domain_name.as_str(), ""))
    }
}

/// Results of an availability search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameAvailabilityResults {
    /// Results for the searched term, keyed by TLD in the order requested.
    #[serde(default)]
    pub tld_results: OrderedMap<DomainAvailability>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub suggestions: Vec<DomainAvailability>,
}

/// Test-only attribute changes applied through the test API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDomainNameUpdateDescriptor {
    pub domain_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<DomainNameContact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_phone_handles_missing_parts() {
        assert_eq!(
            DomainNameContact::split_phone("44.1865123456"),
            (Some("44".to_string()), Some("1865123456".to_string()))
        );
        assert_eq!(DomainNameContact::split_phone("1865123456"), (Some("1865123456".to_string()), None));
        assert_eq!(DomainNameContact::split_phone(""), (None, None));
    }

    #[test]
    fn phone_number_joins_code_and_number() {
        let contact = DomainNameContact::new("Jo Bloggs", "jo@example.com").with_telephone("44.1865123456");
        assert_eq!(contact.phone_number().as_deref(), Some("44.1865123456"));
        assert_eq!(DomainNameContact::default().phone_number(), None);
    }

    #[test]
    fn create_descriptor_defaults_to_privacy_proxy() {
        let descriptor = DomainNameCreateDescriptor::new(
            vec!["example.rodeo".to_string()],
            1,
            DomainNameContact::new("Jo Bloggs", "jo@example.com"),
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["privacyProxy"], 1);
        assert_eq!(json["registrationYears"], 1);
        assert_eq!(json["ownerContact"]["emailAddress"], "jo@example.com");
        assert!(json.get("adminContact").is_none());
    }

    #[test]
    fn update_descriptor_only_sends_set_fields() {
        let descriptor = DomainNameUpdateDescriptor {
            locked: Some(true),
            ..DomainNameUpdateDescriptor::for_domains(vec!["example.com".to_string()])
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json, serde_json::json!({"domainNames": ["example.com"], "locked": true}));
    }

    #[test]
    fn availability_descriptor_trims_tld_dots() {
        let descriptor = DomainNameAvailabilityDescriptor::new("shop", [".com", "co.uk."]);
        assert_eq!(descriptor.tlds, vec!["com", "co.uk"]);
    }

    #[test]
    fn domain_object_reads_loose_remote_values() {
        let domain: DomainNameObject = serde_json::from_str(
            r#"{
                "domainName": "example.com",
                "status": "ACTIVE",
                "expiryDate": "01/02/2030 00:00:00",
                "lockedUntil": "",
                "locked": "1",
                "privacyProxy": "1",
                "nameservers": {"0": "ns1.example.net", "1": "ns2.example.net"},
                "ownerContact": {
                    "name": "Jo Bloggs",
                    "emailAddress": "jo@example.com",
                    "telephoneDiallingCode": 44,
                    "pendingContact": {"name": "New Owner"}
                }
            }"#,
        )
        .unwrap();
        assert!(domain.is_active());
        assert!(domain.locked);
        assert!(domain.uses_privacy_proxy());
        assert_eq!(domain.locked_until, None);
        assert_eq!(domain.nameservers, vec!["ns1.example.net", "ns2.example.net"]);
        let owner = domain.owner_contact.unwrap();
        assert_eq!(owner.telephone_dialling_code.as_deref(), Some("44"));
        assert!(owner.has_pending_change());
    }

    #[test]
    fn availability_split_name() {
        let availability = DomainAvailability {
            domain_name: "shop.co.uk".to_string(),
            availability: "AVAILABLE".to_string(),
            ..DomainAvailability::default()
        };
        assert_eq!(availability.split_name(), ("shop", "co.uk"));
        assert!(availability.is_available());
    }
}
