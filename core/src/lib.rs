//! Synchronous client for the Netistrar registrar REST API.
//!
//! # Overview
//! A generic typed RPC proxy over a pluggable HTTP transport. Facades
//! (`DomainsApi`, `UtilityApi`, `AccountApi`, `TestApi`) describe each remote
//! operation as a `MethodCall`; `WebServiceProxy` sends it through a
//! `Transport`, shapes the JSON response and re-maps remote exceptions to
//! local `ClientException`s.
//!
//! # Design
//! - `RemoteRequest` is plain data; `PreparedRequest` is its wire rendering,
//!   shared by both transports so they behave identically.
//! - `AgentTransport` (ureq) and `SocketTransport` (`std::net`) are selected
//!   through `TransportKind`.
//! - Global parameters (API key and secret) are captured once in an `Arc`
//!   and merged under each call's own parameters.
//! - Nothing is retried or cached; every call is one HTTP exchange.
//!
//! ```no_run
//! use netistrar_core::{ApiProvider, ClientConfig};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiProvider::from_config(&config)?;
//! assert_eq!(api.utility().ping()?, "OK");
//! # Ok::<(), netistrar_core::ApiError>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod exception;
pub mod http;
pub mod provider;
pub mod proxy;
pub mod transport;
pub mod types;

pub use api::{AccountApi, DomainsApi, TestApi, UtilityApi};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, Result};
pub use exception::{ClientException, ExceptionMap, RemoteError, RemoteErrorCode, TransactionException};
pub use http::{HttpMethod, HttpResponse, ParamValue, Parameters, PreparedRequest, RemoteRequest};
pub use provider::ApiProvider;
pub use proxy::{Expected, MethodCall, Primitive, WebServiceProxy};
pub use transport::{AgentTransport, SocketTransport, Transport, TransportKind};
