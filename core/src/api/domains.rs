use crate::error::Result;
use crate::exception::ExceptionMap;
use crate::proxy::{path_segment, Expected, MethodCall, WebServiceProxy};
use crate::types::{
    DomainAvailability, DomainNameAvailabilityDescriptor, DomainNameAvailabilityResults, DomainNameCreateDescriptor,
    DomainNameGlueRecord, DomainNameObject, DomainNameRenewDescriptor, DomainNameTransferDescriptor,
    DomainNameUpdateDescriptor, OrderedMap, Transaction, TransactionError,
};

/// Domain name search, registration and lifecycle operations.
///
/// Lifecycle operations (create, update, renew, transfer, glue records)
/// return a `Transaction` and translate remote transaction failures into
/// `ClientException::Transaction`. Every call translates rate limiting into
/// `ClientException::RateLimitExceeded`.
#[derive(Debug, Clone)]
pub struct DomainsApi {
    proxy: WebServiceProxy,
}

impl DomainsApi {
    pub(crate) fn new(proxy: WebServiceProxy) -> Self {
        Self { proxy }
    }

    /// Availability from cached registry data, with optional suggestions.
    pub fn hinted_availability(
        &self,
        descriptor: &DomainNameAvailabilityDescriptor,
    ) -> Result<DomainNameAvailabilityResults> {
        self.proxy.call(
            &MethodCall::post("hintedAvailability")
                .payload(descriptor)?
                .returns(Expected::object("DomainNameAvailabilityResults"))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    /// Availability checked live against the registry, with pricing.
    pub fn live_availability(&self, domain_name: &str) -> Result<DomainAvailability> {
        self.proxy.call(
            &MethodCall::get(format!("liveAvailability/{}", path_segment(domain_name)))
                .returns(Expected::object("DomainAvailability"))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    /// Validate a create descriptor without registering anything.
    ///
    /// Returns validation errors keyed by domain name, then by error code.
    /// An empty map means the descriptor is valid.
    pub fn validate(
        &self,
        descriptor: &DomainNameCreateDescriptor,
    ) -> Result<OrderedMap<OrderedMap<TransactionError>>> {
        self.proxy.call(
            &MethodCall::post("validate")
                .payload(descriptor)?
                .returns(Expected::map_of(Expected::map_of(Expected::object("TransactionError"))))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    pub fn create(&self, descriptor: &DomainNameCreateDescriptor) -> Result<Transaction> {
        self.transaction(MethodCall::post("").payload(descriptor)?)
    }

    pub fn get(&self, domain_name: &str) -> Result<DomainNameObject> {
        self.proxy.call(
            &MethodCall::get(path_segment(domain_name))
                .returns(Expected::object("DomainNameObject"))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    /// Details for several domains, keyed by domain name. Names not in the
    /// account are omitted.
    pub fn get_multiple<S: AsRef<str>>(&self, domain_names: &[S]) -> Result<OrderedMap<DomainNameObject>> {
        let names: Vec<&str> = domain_names.iter().map(AsRef::as_ref).collect();
        self.proxy.call(
            &MethodCall::post("multiple")
                .payload(&names)?
                .returns(Expected::map_of(Expected::object("DomainNameObject")))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    /// Domain names in the account, one page at a time. Pages start at 1.
    pub fn list(&self, page_size: u32, page: u32) -> Result<Vec<String>> {
        self.proxy.call(
            &MethodCall::get("")
                .param("pageSize", page_size)
                .param("page", page)
                .returns(Expected::array_of(Expected::string()))
                .exceptions(ExceptionMap::rate_limited()),
        )
    }

    pub fn update(&self, descriptor: &DomainNameUpdateDescriptor) -> Result<Transaction> {
        self.transaction(MethodCall::put("").payload(descriptor)?)
    }

    pub fn renew(&self, domain_name: &str, years: u32) -> Result<Transaction> {
        self.transaction(MethodCall::get(format!("renew/{}/{years}", path_segment(domain_name))))
    }

    pub fn renew_multiple(&self, descriptor: &DomainNameRenewDescriptor) -> Result<Transaction> {
        self.transaction(MethodCall::post("renew").payload(descriptor)?)
    }

    /// Start incoming transfers. Identifiers are `domain,authcode`; see
    /// `DomainNameTransferDescriptor::transfer_identifier`.
    pub fn transfer_create(&self, descriptor: &DomainNameTransferDescriptor) -> Result<Transaction> {
        self.transaction(MethodCall::post("transfer").payload(descriptor)?)
    }

    /// Create or replace glue records. Transaction elements are keyed by
    /// sub-domain prefix.
    pub fn glue_records_set(&self, domain_name: &str, glue_records: &[DomainNameGlueRecord]) -> Result<Transaction> {
        self.transaction(MethodCall::put(format!("glue/{}", path_segment(domain_name))).payload(glue_records)?)
    }

    pub fn glue_records_remove<S: AsRef<str>>(&self, domain_name: &str, sub_domain_prefixes: &[S]) -> Result<Transaction> {
        let prefixes: Vec<&str> = sub_domain_prefixes.iter().map(AsRef::as_ref).collect();
        self.transaction(MethodCall::post(format!("glue/{}/remove", path_segment(domain_name))).payload(&prefixes)?)
    }

    fn transaction(&self, call: MethodCall) -> Result<Transaction> {
        self.proxy.call(
            &call
                .returns(Expected::object("Transaction"))
                .exceptions(ExceptionMap::transactional()),
        )
    }
}
