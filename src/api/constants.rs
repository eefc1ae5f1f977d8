//! Wire constants for OData requests

/// User agent sent when the configuration does not override it
pub const DEFAULT_USER_AGENT: &str = concat!("odata-cli/", env!("CARGO_PKG_VERSION"));

/// Media type requested when a request declares no accept list
pub const DEFAULT_ACCEPT: &str = "application/json";

/// Header names and values used by the request pipeline
pub mod headers {
    /// Content type for JSON request bodies
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Preference header name (lower case, usable with `HeaderName::from_static`)
    pub const PREFER: &str = "prefer";

    /// Header a server uses to report which preferences it honored
    pub const PREFERENCE_APPLIED: &str = "preference-applied";

    /// Ask the server to echo the created or updated entity
    pub const RETURN_CONTENT: &str = "return-content";

    /// Ask the server to omit the entity from the response
    pub const RETURN_NO_CONTENT: &str = "return-no-content";

    /// If-Match value accepting any current version
    pub const IF_MATCH_ANY: &str = "*";
}

/// HTTP methods understood by the runner
pub mod methods {
    pub const GET: &str = "GET";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
    pub const PATCH: &str = "PATCH";
    pub const MERGE: &str = "MERGE";
    pub const DELETE: &str = "DELETE";
}
