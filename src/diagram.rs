//! Compiles LLM-produced architecture descriptions into Mermaid flowcharts.
//!
//! The input is untrusted: only the top-level `modules` array is required.
//! Anything malformed below it degrades to default ids and labels, and
//! edges to undeclared components are dropped.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::error::DiagramError;

/// Style directive appended to every compiled diagram.
pub const DEFAULT_STYLE: &str = "classDef default fill:#f4f6fb,stroke:#4a5568,stroke-width:1px;";

/// Validated architecture description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramSpec {
    /// Top-level groupings.
    pub modules: Vec<DiagramModule>,
    /// Edges between components.
    pub relationships: Vec<Relationship>,
}

/// A group of components rendered as a subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramModule {
    /// Module id as given.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Member components.
    pub components: Vec<Component>,
}

/// A node in the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Component id as given.
    pub id: String,
    /// Display label.
    pub label: String,
}

/// Edge rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Direct dependency.
    Solid,
    /// Indirect or optional dependency.
    Dotted,
}

/// A directed edge between two component ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Source component id.
    pub from: String,
    /// Target component id.
    pub to: String,
    /// Rendering style.
    pub kind: EdgeKind,
    /// Optional description. Kept in the model but not rendered.
    pub label: Option<String>,
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}

impl DiagramSpec {
    /// Parses the raw response text, tolerating a surrounding code fence.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::InvalidDiagramData`] if the text is not JSON
    /// or has no `modules` array.
    pub fn parse(raw: &str) -> Result<Self, DiagramError> {
        let value: Value = serde_json::from_str(strip_fences(raw)).map_err(|e| {
            DiagramError::InvalidDiagramData(format!("response is not valid JSON: {e}"))
        })?;
        Self::from_value(&value)
    }

    /// Validates an already-parsed description.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::InvalidDiagramData`] if `modules` is missing
    /// or not an array.
    pub fn from_value(value: &Value) -> Result<Self, DiagramError> {
        let Some(modules) = value.get("modules").and_then(Value::as_array) else {
            return Err(DiagramError::InvalidDiagramData("`modules` must be an array".into()));
        };

        let modules = modules
            .iter()
            .enumerate()
            .map(|(index, module)| {
                let id = text(module, "id").unwrap_or_else(|| format!("module_{}", index + 1));
                let label = text(module, "label").unwrap_or_else(|| id.clone());
                let components = items(module, "components")
                    .iter()
                    .map(|component| {
                        let id = text(component, "id").unwrap_or_default();
                        let label = text(component, "label").unwrap_or_else(|| id.clone());
                        Component { id, label }
                    })
                    .collect();
                DiagramModule { id, label, components }
            })
            .collect();

        let relationships = items(value, "relationships")
            .iter()
            .map(|edge| Relationship {
                from: text(edge, "from").unwrap_or_default(),
                to: text(edge, "to").unwrap_or_default(),
                kind: if text(edge, "kind").as_deref() == Some("dotted") {
                    EdgeKind::Dotted
                } else {
                    EdgeKind::Solid
                },
                label: text(edge, "label"),
            })
            .collect();

        Ok(Self { modules, relationships })
    }

    /// Renders the description as Mermaid flowchart source.
    ///
    /// Each component id is declared once; later duplicates are skipped.
    #[must_use]
    pub fn compile(&self) -> String {
        let mut out = String::from("graph TD\n");
        let mut declared: HashSet<String> = HashSet::new();

        for module in &self.modules {
            let _ = writeln!(
                out,
                "  subgraph {}_group[\"{}\"]",
                sanitize_id(&module.id),
                sanitize_label(&module.label)
            );
            for component in &module.components {
                let id = sanitize_id(&component.id);
                if !declared.insert(id.clone()) {
                    continue;
                }
                let label = if component.label.is_empty() { &id } else { &component.label };
                let _ = writeln!(out, "    {id}[\"{}\"]", sanitize_label(label));
            }
            out.push_str("  end\n");
        }

        for edge in &self.relationships {
            let from = sanitize_id(&edge.from);
            let to = sanitize_id(&edge.to);
            if !declared.contains(&from) || !declared.contains(&to) {
                continue;
            }
            let arrow = match edge.kind {
                EdgeKind::Solid => "-->",
                EdgeKind::Dotted => "-.->",
            };
            let _ = writeln!(out, "  {from} {arrow} {to}");
        }

        let _ = writeln!(out, "  {DEFAULT_STYLE}");
        out
    }
}

/// Parses and compiles in one step.
///
/// # Errors
///
/// See [`DiagramSpec::parse`].
pub fn compile_text(raw: &str) -> Result<String, DiagramError> {
    Ok(DiagramSpec::parse(raw)?.compile())
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`; empty ids
/// become `node`.
#[must_use]
pub fn sanitize_id(id: &str) -> String {
    if id.is_empty() {
        return "node".to_string();
    }
    id.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "'").replace(['\n', '\r'], " ")
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
