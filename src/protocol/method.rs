use std::fmt;

/// An HTTP request method.
///
/// Parsing is case-sensitive: only the uppercase wire forms are accepted
/// (RFC 2616 §5.1.1, "The method is case-sensitive").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Parses a method token, returning `None` for anything that is not one
    /// of the nine standard methods in its exact uppercase form.
    pub fn parse(token: &str) -> Option<Method> {
        match token {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "CONNECT" => Some(Method::Connect),
            "OPTIONS" => Some(Method::Options),
            "TRACE" => Some(Method::Trace),
            "PATCH" => Some(Method::Patch),
            _ => None,
        }
    }

    /// The uppercase wire form of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
