//! Variable resolution: rewriting `${namespace.key}` tokens inside raw
//! parameter values into concrete values before a step runs.
//!
//! Two namespaces exist: `variables` looks up the workflow definition's
//! variable table, `context` looks up the live run context. A token that is
//! the *entire* text value resolves to the referenced value with its
//! original type preserved (a numeric variable stays numeric); a token
//! embedded inside surrounding text substitutes as text. Missing keys and
//! unknown namespaces are hard errors — silently defaulting a mis-set
//! camera distance or grid size to zero costs far more to debug than a loud
//! failure at the step about to consume it.
//!
//! Only literal substitution is performed; this is deliberately not an
//! expression evaluator.

use renderflow_types::{ParamValue, WorkflowDefinition};

use crate::context::RunContext;
use crate::error::ResolveError;

/// Produces a fully resolved copy of `value`.
///
/// Text is scanned for tokens, lists resolve element-wise, and numbers and
/// booleans pass through unchanged.
pub fn resolve_value(value: &ParamValue, workflow: &WorkflowDefinition, context: &RunContext) -> Result<ParamValue, ResolveError> {
    match value {
        ParamValue::Text(text) => resolve_text(text, workflow, context),
        ParamValue::List(items) => items
            .iter()
            .map(|item| resolve_value(item, workflow, context))
            .collect::<Result<Vec<_>, _>>()
            .map(ParamValue::List),
        other => Ok(other.clone()),
    }
}

/// Checks every token in `value` that can be verified without a live
/// context: malformed tokens, unknown namespaces, and `variables` keys
/// missing from the table are errors. `context` references are skipped —
/// the context is populated while the run executes, so those are checked at
/// resolution time.
pub fn check_static_refs(value: &ParamValue, workflow: &WorkflowDefinition) -> Result<(), ResolveError> {
    match value {
        ParamValue::Text(text) => {
            for token in extract_tokens(text) {
                let (namespace, key) = split_token(token)?;
                match namespace {
                    "context" => {}
                    "variables" => {
                        if workflow.variable(key).is_none() {
                            return Err(unresolved(namespace, key, token));
                        }
                    }
                    other => {
                        return Err(ResolveError::UnknownNamespace {
                            namespace: other.to_string(),
                            token: token.to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
        ParamValue::List(items) => items.iter().try_for_each(|item| check_static_refs(item, workflow)),
        _ => Ok(()),
    }
}

fn resolve_text(text: &str, workflow: &WorkflowDefinition, context: &RunContext) -> Result<ParamValue, ResolveError> {
    // A token spanning the whole value keeps the referenced value's type.
    if let Some(token) = whole_token(text) {
        return lookup(token, workflow, context).cloned();
    }

    let mut output = String::new();
    let mut remaining = text;
    while let Some(start) = remaining.find("${") {
        let (before, after) = remaining.split_at(start);
        output.push_str(before);

        let Some(end) = after.find('}') else {
            // No closing brace: the rest is plain text.
            output.push_str(after);
            return Ok(ParamValue::Text(output));
        };
        let token = &after[2..end];
        output.push_str(&lookup(token, workflow, context)?.as_text());
        remaining = &after[end + 1..];
    }
    output.push_str(remaining);
    Ok(ParamValue::Text(output))
}

/// Returns the token text when the whole value is exactly one token.
fn whole_token(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?;
    let end = inner.find('}')?;
    (end + 1 == inner.len()).then(|| &inner[..end])
}

/// Extracts all `${`…`}` token bodies from a text value.
fn extract_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut remaining = text;
    while let Some(start) = remaining.find("${") {
        let after = &remaining[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        tokens.push(&after[..end]);
        remaining = &after[end + 1..];
    }
    tokens
}

fn split_token(token: &str) -> Result<(&str, &str), ResolveError> {
    let trimmed = token.trim();
    trimmed
        .split_once('.')
        .filter(|(namespace, key)| !namespace.is_empty() && !key.is_empty())
        .ok_or_else(|| ResolveError::MalformedToken(trimmed.to_string()))
}

fn lookup<'a>(token: &str, workflow: &'a WorkflowDefinition, context: &'a RunContext) -> Result<&'a ParamValue, ResolveError> {
    let (namespace, key) = split_token(token)?;
    match namespace {
        "variables" => workflow.variable(key).ok_or_else(|| unresolved(namespace, key, token)),
        "context" => context.get(key).ok_or_else(|| unresolved(namespace, key, token)),
        other => Err(ResolveError::UnknownNamespace {
            namespace: other.to_string(),
            token: token.trim().to_string(),
        }),
    }
}

fn unresolved(namespace: &str, key: &str, token: &str) -> ResolveError {
    ResolveError::UnresolvedKey {
        namespace: namespace.to_string(),
        key: key.to_string(),
        token: token.trim().to_string(),
    }
}
