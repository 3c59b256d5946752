mod method;
pub use method::Method;

mod status;
pub use status::StatusCode;

mod headers;
pub use headers::HeaderMap;

mod url;
pub use url::Url;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::ParseError;
