use crate::error::Result;
use crate::exception::ExceptionMap;
use crate::proxy::{Expected, MethodCall, WebServiceProxy};

/// Connectivity and credential checks.
#[derive(Debug, Clone)]
pub struct UtilityApi {
    proxy: WebServiceProxy,
}

impl UtilityApi {
    pub(crate) fn new(proxy: WebServiceProxy) -> Self {
        Self { proxy }
    }

    /// Returns `"OK"` when the service is reachable and the credentials are
    /// accepted.
    pub fn ping(&self) -> Result<String> {
        self.proxy.call(
            &MethodCall::get("ping")
                .returns(Expected::string())
                .exceptions(ExceptionMap::rate_limited()),
        )
    }
}
