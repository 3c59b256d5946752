use std::future::{ready, Future, Ready};

use crate::protocol::{Request, Response};

/// A request handler shared by every server session.
///
/// The request is passed by reference and only lives as long as the
/// session's buffers; a handler that wants to keep request bytes must copy
/// them. Producing the `Response` is the one and only answer to the
/// request.
pub trait Handler: Send + Sync + 'static {
    type Fut<'a>: Future<Output = Response> + Send + 'a
    where
        Self: 'a;

    fn call<'a>(&'a self, request: &'a Request<'a>) -> Self::Fut<'a>;
}

/// [`Handler`] for a synchronous closure, see [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'r> Fn(&'r Request<'r>) -> Response + Send + Sync + 'static,
{
    type Fut<'a> = Ready<Response> where Self: 'a;

    fn call<'a>(&'a self, request: &'a Request<'a>) -> Self::Fut<'a> {
        ready((self.f)(request))
    }
}

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'r> Fn(&'r Request<'r>) -> Response + Send + Sync + 'static,
{
    HandlerFn { f }
}
