use crate::error::Result;
use crate::exception::ExceptionMap;
use crate::proxy::{Expected, MethodCall, WebServiceProxy};

#[derive(Debug, Clone)]
pub struct AccountApi {
    proxy: WebServiceProxy,
}

impl AccountApi {
    pub(crate) fn new(proxy: WebServiceProxy) -> Self {
        Self { proxy }
    }

    /// Current account balance in UK pounds.
    pub fn balance(&self) -> Result<f64> {
        self.proxy.call(
            &MethodCall::get("balance")
                .returns(Expected::float())
                .exceptions(ExceptionMap::rate_limited()),
        )
    }
}
