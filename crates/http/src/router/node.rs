use std::collections::HashMap;
use std::fmt;

use http::Method;

use crate::handler::Handler;
use crate::router::{PathParams, RouteError};
use crate::utils::ensure;

/// How a route segment matches a request path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Static(&'a str),
    /// `:name`, matches exactly one segment
    Param(&'a str),
    /// `*name`, matches the rest of the path
    Wildcard(&'a str),
}

impl<'a> Segment<'a> {
    pub(crate) fn parse(segment: &'a str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            Segment::Param(name)
        } else if let Some(name) = segment.strip_prefix('*') {
            Segment::Wildcard(name)
        } else {
            Segment::Static(segment)
        }
    }
}

/// Trims surrounding slashes and splits `path` into its segments.
///
/// The root path yields no segments.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, RouteError> {
    ensure!(path.starts_with('/'), RouteError::invalid_path(path));

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    ensure!(segments.iter().all(|segment| !segment.is_empty()), RouteError::empty_segment(path));
    Ok(segments)
}

/// One level of the routing trie.
#[derive(Default)]
pub(crate) struct Node {
    /// the route segment this node was created for, `:name` and `*name` included
    segment: String,
    children: HashMap<String, Node>,
    param_child: Option<Box<Node>>,
    wildcard_child: Option<Box<Node>>,
    handlers: HashMap<Method, Box<dyn Handler>>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("children", &self.children)
            .field("param_child", &self.param_child)
            .field("wildcard_child", &self.wildcard_child)
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Node {
    fn new(segment: &str) -> Self {
        Self { segment: segment.to_string(), ..Default::default() }
    }

    /// The parameter name of a `:name` or `*name` node.
    fn name(&self) -> &str {
        &self.segment[1..]
    }

    pub(crate) fn insert(&mut self, method: Method, path: &str, handler: Box<dyn Handler>) -> Result<(), RouteError> {
        let segments = split_path(path)?;
        let last = segments.len().saturating_sub(1);

        let mut current = self;
        for (index, &segment) in segments.iter().enumerate() {
            current = match Segment::parse(segment) {
                Segment::Static(literal) => current.children.entry(literal.to_string()).or_insert_with(|| Node::new(literal)),
                Segment::Param(name) => {
                    ensure!(!name.is_empty(), RouteError::empty_param_name(path));
                    let child = current.param_child.get_or_insert_with(|| Box::new(Node::new(segment)));
                    ensure!(
                        child.segment == segment,
                        RouteError::ConflictingParam { path: path.to_string(), existing: child.segment.clone() }
                    );
                    child.as_mut()
                }
                Segment::Wildcard(name) => {
                    ensure!(!name.is_empty(), RouteError::empty_param_name(path));
                    ensure!(index == last, RouteError::WildcardNotLast { path: path.to_string() });
                    let child = current.wildcard_child.get_or_insert_with(|| Box::new(Node::new(segment)));
                    ensure!(
                        child.segment == segment,
                        RouteError::ConflictingWildcard { path: path.to_string(), existing: child.segment.clone() }
                    );
                    child.as_mut()
                }
            };
        }

        ensure!(
            !current.handlers.contains_key(&method),
            RouteError::DuplicateRoute { method: method.clone(), path: path.to_string() }
        );
        current.handlers.insert(method, handler);
        Ok(())
    }

    /// Walks the trie without backtracking: a static child always wins over the
    /// param child, which wins over the wildcard child.
    pub(crate) fn search(&self, method: &Method, segments: &[&str]) -> Option<(&dyn Handler, PathParams)> {
        let mut current = self;
        let mut params = PathParams::new();

        for (index, &segment) in segments.iter().enumerate() {
            if let Some(child) = current.children.get(segment) {
                current = child;
            } else if let Some(child) = &current.param_child {
                params.insert(child.name(), segment);
                current = child;
            } else if let Some(child) = &current.wildcard_child {
                params.insert(child.name(), segments[index..].join("/"));
                current = child;
                break;
            } else {
                return None;
            }
        }

        current.handlers.get(method).map(|handler| (handler.as_ref(), params))
    }
}
