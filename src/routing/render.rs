//! Route template rendering.
//!
//! Target patterns are minijinja templates with exactly two variables:
//! `client_id` and `query_string`. Output is a destination descriptor, not
//! HTML, so auto-escaping is turned off. Undefined variables are errors.
//!
//! Patterns are compiled on first use and kept in the environment, keyed by
//! the pattern text itself. Only patterns from loaded routing tables reach
//! the renderer, so the cache is bounded by configuration.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use minijinja::{context, AutoEscape, Environment, UndefinedBehavior, Value};
use thiserror::Error;

use crate::routing::document::TreatmentRoute;
use crate::routing::ids::ClientId;

/// Variable holding the resolved client id.
pub const CLIENT_ID_VAR: &str = "client_id";

/// Variable holding the form-encoded inbound query parameters.
pub const QUERY_STRING_VAR: &str = "query_string";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("unknown placeholder(s): {}", .0.join(", "))]
    UnknownPlaceholder(Vec<String>),
}

/// Renders treatment routes into destination strings.
pub struct RouteRenderer {
    env: Environment<'static>,
    compiled: Arc<AtomicUsize>,
}

impl RouteRenderer {
    pub fn new() -> Self {
        let compiled = Arc::new(AtomicUsize::new(0));
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let loads = compiled.clone();
        env.set_loader(move |pattern| {
            loads.fetch_add(1, Ordering::Relaxed);
            Ok(Some(pattern.to_string()))
        });

        Self { env, compiled }
    }

    /// Number of distinct patterns compiled so far.
    pub fn compiled_patterns(&self) -> usize {
        self.compiled.load(Ordering::Relaxed)
    }

    /// Check that a pattern compiles and uses only the supported variables.
    pub fn check(&self, pattern: &str) -> Result<(), RenderError> {
        let template = self.env.template_from_str(pattern)?;
        let unknown: BTreeSet<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| name != CLIENT_ID_VAR && name != QUERY_STRING_VAR)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(RenderError::UnknownPlaceholder(unknown.into_iter().collect()))
        }
    }

    /// Expand `route.target_pattern`.
    ///
    /// An absent client id renders as the empty string. Query parameters
    /// keep their inbound order.
    pub fn render(
        &self,
        route: &TreatmentRoute,
        client_id: Option<ClientId>,
        query: &[(String, String)],
    ) -> Result<String, RenderError> {
        let client_id = match client_id {
            Some(id) => Value::from(id.0),
            None => Value::from(""),
        };

        let template = self.env.get_template(&route.target_pattern)?;
        let rendered = template.render(context! {
            client_id => client_id,
            query_string => encode_query(query),
        })?;
        Ok(rendered)
    }
}

impl Default for RouteRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Form-encode query pairs as `a=1&b=2`.
pub fn encode_query(query: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
