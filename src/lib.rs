//! OData runtime core: schema name resolution and single-call request execution

pub mod api;
pub mod config;
pub mod naming;
