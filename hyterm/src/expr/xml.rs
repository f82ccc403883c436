//! XML projection of expression trees, used by trace logging and snapshot tests.
//!
//! Every node becomes one element named after its variant. Payloads become attributes. A
//! higher order without structure is written as a `higherOrder` attribute, a structured
//! one as a nested `HigherOrder` element; dead ends are omitted.

use std::fmt::{self, Write};

use crate::expr::{
    Expr, ExprKind,
    pretty::{PrettyExpr, PrettyMode},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}<{}", "", self.name, indent = indent)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, escape(value))?;
        }
        if self.children.is_empty() {
            return writeln!(f, " />");
        }
        writeln!(f, ">")?;
        for child in &self.children {
            child.write_indented(f, indent + 2)?;
        }
        writeln!(f, "{:indent$}</{}>", "", self.name, indent = indent)
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl Expr {
    pub fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(self.expr_type().to_string());

        element = match self.kind() {
            ExprKind::Variable(symbol) | ExprKind::BoundVariable(symbol) => {
                element.attribute("symbol", symbol)
            }
            ExprKind::Constant(value) => element
                .attribute("value", value)
                .attribute("type", value.host_type()),
            ExprKind::Type(ty) => element
                .attribute("name", ty)
                .attribute("category", ty.category()),
            ExprKind::Method(method) | ExprKind::MethodBinder(method) => element
                .attribute("name", method.name())
                .attribute("arity", method.arity()),
            ExprKind::MethodPartialClosure(partial) => {
                let mut arguments = String::new();
                for (i, argument) in partial.arguments().iter().enumerate() {
                    if i > 0 {
                        arguments.push(' ');
                    }
                    let _ = write!(arguments, "{argument}");
                }
                element
                    .attribute("name", partial.method().name())
                    .attribute("arguments", arguments)
                    .attribute("remaining", partial.remaining())
            }
            ExprKind::Property(property) => element
                .attribute("name", property.name())
                .attribute("type", property.host_type()),
            ExprKind::Placeholder(index) => element.attribute("index", index.0),
            _ => element,
        };

        if !self.range().is_unknown() {
            element = element.attribute("range", self.range());
        }

        let higher_order = self.higher_order();
        if !higher_order.is_dead_end() {
            if higher_order.children().is_empty() {
                element = element.attribute(
                    "higherOrder",
                    higher_order.pretty_string(PrettyMode::Minimum),
                );
            } else {
                element = element.child(XmlElement::new("HigherOrder").child(higher_order.to_xml()));
            }
        }

        for child in self.children() {
            element = element.child(child.to_xml());
        }
        element
    }
}
