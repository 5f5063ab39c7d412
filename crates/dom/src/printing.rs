use core::fmt;

use indextree::NodeId;
use serde_json::{Map, Value, json};

use crate::{DOMNode, DOMUpdate, Document, NodeKind};

fn sorted_attrs(node: &DOMNode) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = node.attrs.iter().cloned().collect();
    pairs.sort_by(|left, right| left.0.cmp(&right.0));
    pairs
}

fn node_to_json(document: &Document, id: NodeId) -> Value {
    let Some(node_ref) = document.dom.get(id) else {
        return Value::Null;
    };
    let node = node_ref.get();
    let children: Vec<Value> = id
        .children(&document.dom)
        .map(|child| node_to_json(document, child))
        .filter(|value| !value.is_null())
        .collect();
    match &node.kind {
        NodeKind::Document => json!({ "type": "document", "children": children }),
        NodeKind::Element { tag } => {
            let mut attrs_obj = Map::new();
            for (name, value) in sorted_attrs(node) {
                attrs_obj.insert(name, Value::String(value));
            }
            let mut listeners: Vec<&str> = node.listeners.iter().map(String::as_str).collect();
            listeners.sort_unstable();
            json!({
                "type": "element",
                "tag": tag.to_lowercase(),
                "attrs": Value::Object(attrs_obj),
                "listeners": listeners,
                "children": children,
            })
        }
        NodeKind::Text { text } => json!({ "type": "text", "text": text }),
    }
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_indent(out: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str("  ")?;
    }
    Ok(())
}

fn fmt_node(
    document: &Document,
    id: NodeId,
    out: &mut fmt::Formatter<'_>,
    depth: usize,
) -> fmt::Result {
    let Some(node_ref) = document.dom.get(id) else {
        return Ok(());
    };
    let node = node_ref.get();
    write_indent(out, depth)?;
    match &node.kind {
        NodeKind::Document => {
            writeln!(out, "#document")?;
        }
        NodeKind::Element { tag } => {
            write!(out, "<{}", tag.to_lowercase())?;
            for (name, value) in sorted_attrs(node) {
                write!(out, " {}=\"{}\"", name, escape_text(&value))?;
            }
            for event in &node.listeners {
                write!(out, " @{event}")?;
            }
            writeln!(out, ">")?;
        }
        NodeKind::Text { text } => {
            writeln!(out, "\"{}\"", escape_text(text))?;
            return Ok(());
        }
    }
    for child in id.children(&document.dom) {
        fmt_node(document, child, out, depth + 1)?;
    }
    if let NodeKind::Element { tag } = &node.kind {
        write_indent(out, depth)?;
        writeln!(out, "</{}>", tag.to_lowercase())?;
    }
    Ok(())
}

impl fmt::Debug for Document {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "DOM")?;
        fmt_node(self, self.root, out, 0)
    }
}

impl Document {
    /// Build a deterministic JSON representation of the attached tree.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "listeners": [..], "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json_value(&self) -> Value {
        node_to_json(self, self.root)
    }

    /// Pretty JSON string for snapshots and test comparisons.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Serialize a batch of updates, one JSON object per update.
pub fn updates_to_json(batch: &[DOMUpdate]) -> Value {
    serde_json::to_value(batch).unwrap_or(Value::Null)
}
