//! Method + url routing.
//!
//! Routes are kept in registration order and the first one whose method
//! equals the request method and whose pattern matches the whole url wins,
//! however specific the later ones are. The table is immutable once built.
//!
//! Patterns are literal paths with two placeholders:
//!
//! - `{int}`: one or more ascii digits
//! - `{string}`: one or more characters other than `/`
//!
//! ```
//! use relay_web::router::{get, post, Router};
//! use relay_web::handler::NotFound;
//! use relay_http::protocol::Method;
//!
//! let router = Router::builder()
//!     .route("/api/example", get(NotFound::default))
//!     .route("/api/part/{int}/{string}", post(NotFound::default))
//!     .build()
//!     .unwrap();
//!
//! let (_, captures) = router.at(Method::Post, "/api/part/42/bob").unwrap();
//! assert_eq!(captures, ["42", "bob"]);
//! assert!(router.at(Method::Get, "/api/part/42/bob").is_none());
//! ```

use regex::Regex;
use relay_http::protocol::Method;
use std::fmt;

use crate::handler::{BadRequest, Endpoint, HandlerFactory, NotFound};
use crate::RouteError;

/// A compiled route pattern, anchored at both ends.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut expr = String::with_capacity(pattern.len() + 16);
        expr.push('^');

        let mut rest = pattern;
        while let Some(start) = rest.find('{') {
            expr.push_str(&regex::escape(&rest[..start]));

            let Some(len) = rest[start..].find('}') else {
                return Err(RouteError::UnclosedPlaceholder { pattern: pattern.to_string() });
            };
            match &rest[start + 1..start + len] {
                "int" => expr.push_str("([0-9]+)"),
                "string" => expr.push_str("([^/]+)"),
                placeholder => {
                    return Err(RouteError::UnknownPlaceholder {
                        pattern: pattern.to_string(),
                        placeholder: placeholder.to_string(),
                    });
                }
            }
            rest = &rest[start + len + 1..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|source| RouteError::InvalidPattern { pattern: pattern.to_string(), source })?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The capture groups in pattern order, or `None` when `url` doesn't match.
    pub fn captures(&self, url: &str) -> Option<Vec<String>> {
        self.regex.captures(url).map(|captures| {
            captures.iter().skip(1).flatten().map(|capture| capture.as_str().to_string()).collect()
        })
    }
}

/// A handler factory bound to a method, waiting for its path.
pub struct MethodRoute {
    method: Method,
    factory: Box<dyn HandlerFactory>,
}

macro_rules! method_route {
    ($name:ident, $method:expr) => {
        pub fn $name<F: HandlerFactory>(factory: F) -> MethodRoute {
            MethodRoute { method: $method, factory: Box::new(factory) }
        }
    };
}

method_route!(get, Method::Get);
method_route!(post, Method::Post);

impl fmt::Debug for MethodRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRoute").field("method", &self.method).finish_non_exhaustive()
    }
}

struct Route {
    method: Method,
    pattern: RoutePattern,
    factory: Box<dyn HandlerFactory>,
}

pub struct Router {
    routes: Vec<Route>,
    not_found: Box<dyn HandlerFactory>,
    bad_request: Box<dyn HandlerFactory>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Finds the first route for `method` matching `url`, with its captures.
    pub fn at(&self, method: Method, url: &str) -> Option<(&dyn HandlerFactory, Vec<String>)> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| route.pattern.captures(url).map(|captures| (route.factory.as_ref(), captures)))
    }

    pub fn not_found(&self) -> &dyn HandlerFactory {
        self.not_found.as_ref()
    }

    pub fn bad_request(&self) -> &dyn HandlerFactory {
        self.bad_request.as_ref()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.iter().map(|route| format!("{} {}", route.method, route.pattern.as_str()));
        f.debug_struct("Router").field("routes", &routes.collect::<Vec<_>>()).finish_non_exhaustive()
    }
}

pub struct RouterBuilder {
    routes: Vec<(String, MethodRoute)>,
    not_found: Box<dyn HandlerFactory>,
    bad_request: Box<dyn HandlerFactory>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { routes: Vec::new(), not_found: Box::new(NotFound::default), bad_request: Box::new(BadRequest::default) }
    }

    pub fn route(mut self, path: impl Into<String>, route: MethodRoute) -> Self {
        self.routes.push((path.into(), route));
        self
    }

    /// Registers `H` at its own method and path.
    pub fn endpoint<H: Endpoint>(self) -> Self {
        self.route(H::PATH, MethodRoute { method: H::METHOD, factory: Box::new(H::default) })
    }

    /// Replaces the handler answering requests no route matches.
    pub fn not_found<F: HandlerFactory>(mut self, factory: F) -> Self {
        self.not_found = Box::new(factory);
        self
    }

    /// Replaces the handler answering requests rejected by `preprocess`.
    ///
    /// Its own `preprocess` gets the rejected request, captures and body
    /// included. If that fails too, the built-in [`BadRequest`] answers.
    pub fn bad_request<F: HandlerFactory>(mut self, factory: F) -> Self {
        self.bad_request = Box::new(factory);
        self
    }

    pub fn build(self) -> Result<Router, RouteError> {
        let routes = self
            .routes
            .into_iter()
            .map(|(path, MethodRoute { method, factory })| {
                Ok(Route { method, pattern: RoutePattern::parse(&path)?, factory })
            })
            .collect::<Result<Vec<_>, RouteError>>()?;

        Ok(Router { routes, not_found: self.not_found, bad_request: self.bad_request })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.iter().map(|(path, route)| format!("{} {}", route.method, path));
        f.debug_struct("RouterBuilder").field("routes", &routes.collect::<Vec<_>>()).finish_non_exhaustive()
    }
}
