//! Explicit route table built and validated before serving.
//!
//! A [`Route`] owns a path pattern, the gates that apply to every method on
//! it, and at most one binding per HTTP method. [`RouteTable`] holds routes in
//! registration order and refuses duplicates at build time, so dispatch never
//! has to choose between two handlers.
//!
//! Matching is delegated to Actix's [`ResourceDef`], so captured parameters
//! are percent-decoded and paths match exactly: no slash folding.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use actix_web::dev::{Path, ResourceDef, Url};
use actix_web::http::{Method, Uri};

use super::handler::Handler;
use crate::inbound::http::gate::Gate;

/// Problems found while assembling routes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    /// The path pattern cannot be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A method was registered twice on one route.
    #[error("route '{pattern}' already has a {method} handler")]
    DuplicateMethod {
        /// Route pattern.
        pattern: String,
        /// Repeated method.
        method: Method,
    },
    /// Two routes share the same path shape.
    #[error("route '{pattern}' is registered more than once")]
    DuplicateRoute {
        /// Repeated pattern.
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Param(_), Self::Param(_)) => true,
            _ => false,
        }
    }
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteTableError> {
    let invalid = |reason| RouteTableError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    };
    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(invalid("must start with '/'"));
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    if rest.ends_with('/') {
        return Err(invalid("trailing slash"));
    }
    let mut seen = Vec::new();
    rest.split('/')
        .map(|segment| {
            match segment
                .strip_prefix('{')
                .and_then(|inner| inner.strip_suffix('}'))
            {
                _ if segment.is_empty() => Err(invalid("empty path segment")),
                Some("") => Err(invalid("empty parameter name")),
                Some(name) if !is_param_name(name) => Err(invalid("invalid parameter name")),
                Some(name) if seen.contains(&name) => Err(invalid("repeated parameter name")),
                Some(name) => {
                    seen.push(name);
                    Ok(Segment::Param(name.to_owned()))
                }
                None if segment.contains(['{', '}']) => Err(invalid("unbalanced braces")),
                None => Ok(Segment::Literal(segment.to_owned())),
            }
        })
        .collect()
}

pub(super) struct MethodBinding {
    pub(super) method: Method,
    pub(super) gates: Vec<Arc<dyn Gate>>,
    pub(super) handler: Arc<dyn Handler>,
}

/// A path pattern with its method bindings.
///
/// # Examples
/// ```
/// use session_gate::inbound::http::dispatch::{HandlerRequest, Reply, Route, handler_fn};
///
/// let route = Route::new("/api/spaces/{spaceId}")
///     .and_then(|route| {
///         route.get(handler_fn(|_req: HandlerRequest| async { Ok(Reply::empty()) }))
///     })
///     .expect("valid route");
/// assert_eq!(route.pattern(), "/api/spaces/{spaceId}");
/// ```
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    resource: ResourceDef,
    pub(super) gates: Vec<Arc<dyn Gate>>,
    pub(super) bindings: Vec<MethodBinding>,
}

impl Route {
    /// Start a route for `pattern`. `{name}` segments capture parameters.
    pub fn new(pattern: impl Into<String>) -> Result<Self, RouteTableError> {
        let pattern = pattern.into();
        let segments = parse_pattern(&pattern)?;
        let resource = ResourceDef::new(pattern.as_str());
        Ok(Self {
            pattern,
            segments,
            resource,
            gates: Vec::new(),
            bindings: Vec::new(),
        })
    }

    /// Path pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Add a gate that runs for every method on this route, before any
    /// method-specific gate.
    #[must_use]
    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    /// Bind `handler` to `method`.
    pub fn register(
        self,
        method: Method,
        handler: impl Handler + 'static,
    ) -> Result<Self, RouteTableError> {
        self.register_gated(method, Vec::new(), handler)
    }

    /// Bind `handler` to `method` behind `gates`, evaluated in order.
    pub fn register_gated(
        mut self,
        method: Method,
        gates: Vec<Arc<dyn Gate>>,
        handler: impl Handler + 'static,
    ) -> Result<Self, RouteTableError> {
        if self.bindings.iter().any(|binding| binding.method == method) {
            return Err(RouteTableError::DuplicateMethod {
                pattern: self.pattern,
                method,
            });
        }
        self.bindings.push(MethodBinding {
            method,
            gates,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Shorthand for `register(Method::GET, ..)`.
    pub fn get(self, handler: impl Handler + 'static) -> Result<Self, RouteTableError> {
        self.register(Method::GET, handler)
    }

    /// Shorthand for `register(Method::POST, ..)`.
    pub fn post(self, handler: impl Handler + 'static) -> Result<Self, RouteTableError> {
        self.register(Method::POST, handler)
    }

    /// Shorthand for `register(Method::PUT, ..)`.
    pub fn put(self, handler: impl Handler + 'static) -> Result<Self, RouteTableError> {
        self.register(Method::PUT, handler)
    }

    /// Shorthand for `register(Method::PATCH, ..)`.
    pub fn patch(self, handler: impl Handler + 'static) -> Result<Self, RouteTableError> {
        self.register(Method::PATCH, handler)
    }

    /// Shorthand for `register(Method::DELETE, ..)`.
    pub fn delete(self, handler: impl Handler + 'static) -> Result<Self, RouteTableError> {
        self.register(Method::DELETE, handler)
    }

    /// Registered methods in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.bindings.iter().map(|binding| &binding.method)
    }

    pub(super) fn binding(&self, method: &Method) -> Option<&MethodBinding> {
        self.bindings.iter().find(|binding| &binding.method == method)
    }

    fn matches(&self, url: &Url) -> Option<HashMap<String, String>> {
        let mut path = Path::new(url.clone());
        self.resource.capture_match_info(&mut path).then(|| {
            path.iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect()
        })
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("gates", &self.gates)
            .field("methods", &self.methods().collect::<Vec<_>>())
            .finish()
    }
}

/// Validated, ordered set of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Start assembling a table.
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// First route whose pattern matches `path`, with captured parameters
    /// percent-decoded. A path that is not a valid URI path matches nothing.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        let url = Url::new(path.parse::<Uri>().ok()?);
        self.routes
            .iter()
            .find_map(|route| route.matches(&url).map(|params| (route, params)))
    }

    /// Routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

/// Collects routes for a [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Append a route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Append every route of another table.
    #[must_use]
    pub fn merge(mut self, table: RouteTable) -> Self {
        self.routes.extend(table.routes);
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        for (index, route) in self.routes.iter().enumerate() {
            if self
                .routes
                .iter()
                .take(index)
                .any(|earlier| earlier.same_shape(route))
            {
                return Err(RouteTableError::DuplicateRoute {
                    pattern: route.pattern.clone(),
                });
            }
        }
        Ok(RouteTable {
            routes: self.routes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::dispatch::{HandlerRequest, Reply, handler_fn};
    use crate::inbound::http::gate::RequireUser;
    use rstest::rstest;

    fn noop() -> impl Handler + 'static {
        handler_fn(|_req: HandlerRequest| async { Ok(Reply::empty()) })
    }

    #[rstest]
    #[case("api/profile", "must start with '/'")]
    #[case("/api//profile", "empty path segment")]
    #[case("/api/{}", "empty parameter name")]
    #[case("/api/{id}/{id}", "repeated parameter name")]
    #[case("/api/{id", "unbalanced braces")]
    #[case("/api/profile/", "trailing slash")]
    #[case("/api/{id:\\d+}", "invalid parameter name")]
    #[case("/api/{1st}", "invalid parameter name")]
    fn malformed_patterns_are_rejected(#[case] pattern: &str, #[case] reason: &'static str) {
        let Err(err) = Route::new(pattern) else {
            panic!("expected {pattern} to be rejected");
        };
        assert_eq!(
            err,
            RouteTableError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason
            }
        );
    }

    #[rstest]
    fn duplicate_method_is_rejected_at_registration() {
        let route = Route::new("/api/profile")
            .and_then(|route| route.get(noop()))
            .expect("first binding");
        let Err(err) = route.get(noop()) else {
            panic!("second GET must be rejected");
        };
        assert_eq!(
            err,
            RouteTableError::DuplicateMethod {
                pattern: "/api/profile".to_owned(),
                method: Method::GET
            }
        );
    }

    #[rstest]
    fn distinct_methods_share_a_route() {
        let route = Route::new("/api/pages/{pageId}")
            .and_then(|route| route.get(noop()))
            .and_then(|route| route.put(noop()))
            .and_then(|route| route.delete(noop()))
            .expect("distinct methods");
        assert_eq!(
            route.methods().cloned().collect::<Vec<_>>(),
            vec![Method::GET, Method::PUT, Method::DELETE]
        );
    }

    #[rstest]
    #[case("/api/spaces/{spaceId}", "/api/spaces/{id}")]
    #[case("/api/{spaceId}/pages", "/api/{id}/pages")]
    fn duplicate_route_shapes_are_rejected(#[case] first: &str, #[case] second: &str) {
        let result = RouteTable::builder()
            .route(Route::new(first).expect("first"))
            .route(Route::new(second).expect("second"))
            .build();
        assert!(matches!(result, Err(RouteTableError::DuplicateRoute { .. })));
    }

    #[rstest]
    fn resolve_captures_parameters_in_registration_order() {
        let table = RouteTable::builder()
            .route(Route::new("/api/spaces/mine").expect("literal"))
            .route(
                Route::new("/api/spaces/{spaceId}")
                    .expect("param")
                    .with_gate(RequireUser),
            )
            .build()
            .expect("valid table");

        let (route, params) = table.resolve("/api/spaces/mine").expect("literal wins");
        assert_eq!(route.pattern(), "/api/spaces/mine");
        assert!(params.is_empty());

        let (route, params) = table.resolve("/api/spaces/abc").expect("param route");
        assert_eq!(route.pattern(), "/api/spaces/{spaceId}");
        assert_eq!(params.get("spaceId").map(String::as_str), Some("abc"));

        assert!(table.resolve("/api/spaces/abc/pages").is_none());
    }

    #[rstest]
    #[case("/api/spaces/a%20b", "a b")]
    #[case("/api/spaces/caf%C3%A9", "café")]
    #[case("/api/spaces/a%2Fb", "a%2Fb")]
    fn captured_parameters_are_percent_decoded(#[case] path: &str, #[case] expected: &str) {
        let table = RouteTable::builder()
            .route(Route::new("/api/spaces/{spaceId}").expect("param"))
            .build()
            .expect("valid table");
        let (_, params) = table.resolve(path).expect("route matches");
        assert_eq!(params.get("spaceId").map(String::as_str), Some(expected));
    }

    #[rstest]
    #[case("/api/spaces/abc/")]
    #[case("/api//spaces/abc")]
    #[case("/api/spaces/abc/pages")]
    fn paths_match_exactly(#[case] path: &str) {
        let table = RouteTable::builder()
            .route(Route::new("/api/spaces/{spaceId}").expect("param"))
            .build()
            .expect("valid table");
        assert!(table.resolve(path).is_none(), "{path} should not match");
    }

    #[rstest]
    fn root_pattern_matches_root_path() {
        let table = RouteTable::builder()
            .route(Route::new("/").expect("root"))
            .build()
            .expect("valid table");
        assert!(table.resolve("/").is_some());
        assert!(table.resolve("/other").is_none());
    }
}
