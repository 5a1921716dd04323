//! Link builders: markdown-style cell links the result table renders as
//! clickable text.
//!
//! A link cell has the shape `[title](url){type}`. Components are escaped
//! so that brackets and braces inside titles or urls cannot break the
//! structure; query-string values built here are fully URL-encoded.

use super::super::error::BindResult;
use super::super::expr::{
    any_aggregate, any_child_data, check_arity, eval_children, merge_children, set_children,
    ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::values::Val;

/// Escape the structural characters of a link component. Everything else
/// passes through untouched so urls stay readable.
fn escape_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '[' => out.push_str("%5B"),
            ']' => out.push_str("%5D"),
            '{' => out.push_str("%7B"),
            '}' => out.push_str("%7D"),
            '%' => out.push_str("%25"),
            _ => out.push(c),
        }
    }
    out
}

fn make_link(title: &str, url: &str, link_type: Option<&str>) -> String {
    let mut out = String::new();
    out.push('[');
    out.push_str(&escape_component(title));
    out.push_str("](");
    out.push_str(&escape_component(url));
    out.push(')');
    if let Some(link_type) = link_type {
        out.push('{');
        out.push_str(&escape_component(link_type));
        out.push('}');
    }
    out
}

/// How a [`LinkFunction`] assembles its cell text from evaluated children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `link(title[, url[, type]])`
    Link,
    /// `dashboard(title, uuid[, params])` — a link targeting another
    /// dashboard, with the uuid and params carried in the query string
    Dashboard,
}

impl LinkKind {
    pub fn name(&self) -> &'static str {
        match self {
            LinkKind::Link => "link",
            LinkKind::Dashboard => "dashboard",
        }
    }

    fn arity(&self) -> (usize, usize) {
        match self {
            LinkKind::Link => (1, 3),
            LinkKind::Dashboard => (2, 3),
        }
    }

    fn assemble(&self, values: &[Val]) -> String {
        let text = |idx: usize| {
            values
                .get(idx)
                .map(Val::to_display_string)
                .unwrap_or_default()
        };
        match self {
            LinkKind::Link => {
                let title = text(0);
                let url = if values.len() > 1 { text(1) } else { title.clone() };
                let link_type = (values.len() > 2).then(|| text(2));
                make_link(&title, &url, link_type.as_deref())
            }
            LinkKind::Dashboard => {
                let title = text(0);
                let mut url = format!("?uuid={}", urlencoding::encode(&text(1)));
                if values.len() > 2 {
                    url.push_str("&params=");
                    url.push_str(&urlencoding::encode(&text(2)));
                }
                make_link(&title, &url, Some("dashboard"))
            }
        }
    }
}

/// The shared function shape for both link builders.
pub struct LinkFunction {
    kind: LinkKind,
    params: Vec<Param>,
}

impl LinkFunction {
    pub fn new(kind: LinkKind, params: Vec<Param>) -> BindResult<Self> {
        let (min, max) = kind.arity();
        check_arity(kind.name(), min, max, &params)?;
        Ok(Self { kind, params })
    }
}

impl Function for LinkFunction {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(LinkGenerator {
            kind: self.kind,
            children: self.params.iter().map(|p| p.create_generator()).collect(),
        })
    }

    fn has_aggregate(&self) -> bool {
        any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

struct LinkGenerator {
    kind: LinkKind,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for LinkGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match eval_children(&self.children, storage, child_data) {
            Ok(values) => Val::String(self.kind.assemble(&values)),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}
