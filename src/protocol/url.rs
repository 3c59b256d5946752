//! Request-target and URL parsing.
//!
//! The server accepts the three request-target shapes of RFC 7230: the
//! asterisk form (`OPTIONS *`), origin-form (`/path?query`), and
//! absolute-URI form (scheme and authority are consumed and discarded, only
//! the path part is kept). Paths are normalized with the remove-dot-segments
//! algorithm of RFC 3986 §5.2.4.

/// A parsed request-target.
///
/// Most fields are views into the input the URL was parsed from; `path` is
/// owned because dot-segment removal rewrites it. After a successful parse,
/// `path` starts with `/` and contains no `/./` or `/../` segments. The
/// single exception is the asterisk form, which parses to the distinct path
/// value `"*"`.
///
/// `scheme`, `host` and `port` are only populated by
/// [`Url::parse_absolute`], which the client uses on full
/// `scheme://host:port/...` URLs. [`Url::parse`] consumes those components
/// without capturing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url<'a> {
    /// The unmodified input.
    pub full_raw: &'a str,
    pub scheme: Option<&'a str>,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    /// The path-and-after portion, as received. Used by the client as the
    /// request-target when serializing.
    pub target_raw: &'a str,
    /// Normalized path. Owned because of dot-segment removal.
    pub path: String,
    /// The `;`-delimited params segment, without the `;`.
    pub params: Option<&'a str>,
    /// The query, without the `?`.
    pub query: Option<&'a str>,
    /// The fragment, without the `#`. Not technically part of the URL
    /// (RFC 1808).
    pub fragment: Option<&'a str>,
}

impl<'a> Url<'a> {
    /// Parses a request-target as received by the server.
    ///
    /// Scheme and authority of absolute-URIs are accepted but discarded;
    /// the remainder must be an absolute path.
    pub fn parse(input: &'a str) -> Option<Url<'a>> {
        let mut url = Url { full_raw: input, ..Default::default() };

        // RFC 2616, 5.1.2: the asterisk form
        if input == "*" {
            url.target_raw = input;
            url.path.push('*');
            return Some(url);
        }

        let mut rest = input;

        // RFC 1808, 2.4.1: the fragment is not technically part of the URL
        if let Some(hash) = rest.find('#') {
            url.fragment = Some(&rest[hash + 1..]);
            rest = &rest[..hash];
        }

        if rest.is_empty() {
            return None;
        }

        // RFC 1808, 2.4.2: if all characters before a colon are valid scheme
        // characters, everything up to and including the colon is a scheme.
        if let Some(colon) = rest.find(':') {
            if rest[..colon].bytes().all(is_scheme_char) {
                rest = &rest[colon + 1..];
            }
        }

        // RFC 1808, 2.4.3: drop the authority up to the next slash. Which
        // host the authority names is not checked; RFC 2616 5.2 would have
        // the server reject foreign hosts with a 400 here.
        if rest.starts_with("//") {
            match rest[2..].find('/') {
                Some(slash) => rest = &rest[2 + slash..],
                None => return None,
            }
        }

        url.target_raw = rest;

        // RFC 1808, 2.4.4
        if let Some(question) = rest.find('?') {
            url.query = Some(&rest[question + 1..]);
            rest = &rest[..question];
        }

        // RFC 1808, 2.4.5
        if let Some(semi) = rest.find(';') {
            url.params = Some(&rest[semi + 1..]);
            rest = &rest[..semi];
        }

        // What is left has to be abs_path (RFC 1808, 2.2).
        if !rest.starts_with('/') {
            return None;
        }
        url.path = remove_dot_segments(rest);

        Some(url)
    }

    /// Parses a full `scheme://host[:port]/...` URL, capturing scheme, host
    /// and port for the client in addition to everything [`Url::parse`]
    /// produces for the target.
    pub fn parse_absolute(input: &'a str) -> Option<Url<'a>> {
        let colon = input.find(':')?;
        let scheme = &input[..colon];
        if scheme.is_empty() || !scheme.bytes().all(is_scheme_char) {
            return None;
        }

        let rest = input[colon + 1..].strip_prefix("//")?;
        let authority_end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        if authority.is_empty() {
            return None;
        }

        let (host, port) = match authority.rfind(':') {
            Some(split) => (&authority[..split], Some(authority[split + 1..].parse::<u16>().ok()?)),
            None => (authority, None),
        };

        let target = &rest[authority_end..];
        let target = if target.is_empty() { "/" } else { target };

        let mut url = Url::parse(target)?;
        url.full_raw = input;
        url.scheme = Some(scheme);
        url.host = Some(host);
        url.port = port;
        url.target_raw = target;
        Some(url)
    }

    pub fn is_asterisk(&self) -> bool {
        self.path == "*"
    }
}

fn is_scheme_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'.' || byte == b'-'
}

/// RFC 3986, 5.2.4: Remove Dot Segments.
///
/// The input must be non-empty and start with a slash, which lets every
/// loop iteration assume the remaining input still starts with a slash and
/// keeps trailing slashes intact.
fn remove_dot_segments(input: &str) -> String {
    debug_assert!(input.starts_with('/'));
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while !rest.is_empty() {
        debug_assert!(rest.starts_with('/'));

        if rest == "/" {
            output.push('/');
            break;
        }

        let segment_end = rest[1..].find('/').map(|slash| slash + 1);
        let segment = match segment_end {
            Some(end) => &rest[..end],
            None => rest,
        };

        match segment {
            "/." => {}
            "/.." => {
                // Also drop the segment already written to the output.
                if let Some(last_slash) = output.rfind('/') {
                    output.truncate(last_slash);
                }
            }
            _ => output.push_str(segment),
        }

        match segment_end {
            Some(end) => rest = &rest[end..],
            None => break,
        }
    }
    if output.is_empty() {
        output.push('/');
    }
    output
}
