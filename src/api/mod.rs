//! OData request execution
//!
//! Turns an [`ODataRequest`] into exactly one HTTP call with the protocol headers
//! OData expects (`Accept`, `If-Match`, `Prefer`), optional observer hooks, caller
//! driven cancellation, and a single failure shape for HTTP and transport errors.

pub mod constants;
pub mod error;
pub mod models;
pub mod request;
pub mod runner;
pub mod transport;

pub use error::{
    FailureKind, HookStage, RequestError, RequestFailure, TransportError, TransportFailureKind,
};
pub use models::{Credentials, RestVerb};
pub use request::ODataRequest;
pub use runner::{AfterResponseHook, BeforeRequestHook, RequestRunner, preference_applied};
pub use transport::{
    ReqwestTransport, ReqwestTransportFactory, Transport, TransportConfig, TransportFactory,
};
