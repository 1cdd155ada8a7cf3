//! Placeholder resolution for hook environment values and commands
//!
//! Templates use `{{ name }}` placeholders. Names are looked up with the same
//! rules as condition references, so `{{ env.HOME }}` and `{{ matrix.os }}`
//! work too. Text outside placeholders is copied verbatim.

use super::condition::{lookup, EvaluationError};
use super::types::Bindings;

/// A piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Plain text content
    Text(String),
    /// Placeholder reference
    Placeholder(String),
}

/// Parse a template string into nodes.
///
/// An unterminated `{{` is a syntax error.
pub fn parse(input: &str) -> Result<Vec<TemplateNode>, EvaluationError> {
    let mut nodes = Vec::new();
    let mut rest = input;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            nodes.push(TemplateNode::Text(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        let end = after_open.find("}}").ok_or_else(|| EvaluationError::Syntax {
            position: offset + start,
            message: "unterminated placeholder".to_string(),
        })?;
        let name = after_open[..end].trim();
        if name.is_empty() {
            return Err(EvaluationError::Syntax {
                position: offset + start,
                message: "empty placeholder".to_string(),
            });
        }
        nodes.push(TemplateNode::Placeholder(name.to_string()));

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        nodes.push(TemplateNode::Text(rest.to_string()));
    }

    Ok(nodes)
}

/// Render a template against bindings
///
/// # Examples
///
/// ```
/// use hookline_core::hooks::template::render;
/// use hookline_core::hooks::Bindings;
///
/// let mut bindings = Bindings::new();
/// bindings.insert("version".to_string(), "1.2.0".to_string());
///
/// assert_eq!(render("v{{ version }}", &bindings).unwrap(), "v1.2.0");
/// assert!(render("{{ missing }}", &bindings).is_err());
/// ```
pub fn render(template: &str, bindings: &Bindings) -> Result<String, EvaluationError> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    let mut output = String::with_capacity(template.len());
    for node in parse(template)? {
        match node {
            TemplateNode::Text(text) => output.push_str(&text),
            TemplateNode::Placeholder(name) => {
                let value = lookup(bindings, &name)
                    .ok_or_else(|| EvaluationError::UnresolvedReference(name.clone()))?;
                output.push_str(value);
            }
        }
    }
    Ok(output)
}

/// Render every value of an environment map
pub fn render_all(templates: &Bindings, bindings: &Bindings) -> Result<Bindings, EvaluationError> {
    templates
        .iter()
        .map(|(name, value)| Ok((name.clone(), render(value, bindings)?)))
        .collect()
}
