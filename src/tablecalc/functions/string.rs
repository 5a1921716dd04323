//! String manipulation functions.
//!
//! All of these render their input through the value model's display
//! conversion, so they accept any variant (Null renders empty in `concat`,
//! propagates elsewhere). Regex-taking functions compile a statically-known
//! pattern once at bind time — a malformed static pattern aborts
//! compilation — and fall back to a cached per-evaluation compile when the
//! pattern is itself an expression.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use super::arithmetic::MANY;
use super::super::error::{BindResult, ExprError};
use super::super::expr::{
    any_aggregate, any_child_data, check_arity, eval_children, merge_children, set_children,
    ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::values::Val;

/// Cache of compiled regexes for dynamically supplied patterns.
static REGEX_CACHE: OnceLock<Mutex<HashMap<String, Arc<Regex>>>> = OnceLock::new();

/// Patterns cached before the cache is cleared wholesale.
const MAX_REGEX_CACHE_SIZE: usize = 1000;

/// Full-match compile: expression regexes match the whole input, so the
/// pattern is anchored before compilation.
fn compile_full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("\\A(?:{})\\z", pattern))
}

fn cached_regex(pattern: &str, full_match: bool) -> Result<Arc<Regex>, Val> {
    let key = if full_match {
        format!("\u{1}{}", pattern)
    } else {
        pattern.to_string()
    };
    let cache = REGEX_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap();
    if let Some(regex) = guard.get(&key) {
        return Ok(Arc::clone(regex));
    }
    let compiled = if full_match {
        compile_full_match(pattern)
    } else {
        Regex::new(pattern)
    };
    let regex = match compiled {
        Ok(r) => Arc::new(r),
        Err(_) => return Err(Val::err(format!("Invalid regular expression '{}'", pattern))),
    };
    if guard.len() >= MAX_REGEX_CACHE_SIZE {
        guard.clear();
    }
    guard.insert(key, Arc::clone(&regex));
    Ok(regex)
}

/// A regex argument: compiled at bind time when static, per evaluation
/// otherwise.
enum PatternArg {
    Static(Arc<Regex>),
    Dynamic(Param),
}

impl PatternArg {
    fn bind(name: &str, param: Param, full_match: bool) -> BindResult<Self> {
        let static_pattern = param.static_value().map(Val::to_display_string);
        match static_pattern {
            Some(pattern) => {
                let compiled = if full_match {
                    compile_full_match(&pattern)
                } else {
                    Regex::new(&pattern)
                };
                compiled
                    .map(|r| PatternArg::Static(Arc::new(r)))
                    .map_err(|_| {
                        ExprError::argument(
                            name,
                            format!("invalid regular expression '{}'", pattern),
                        )
                    })
            }
            None => Ok(PatternArg::Dynamic(param)),
        }
    }

    fn create_runtime(&self, full_match: bool) -> PatternRuntime {
        match self {
            PatternArg::Static(regex) => PatternRuntime::Static(Arc::clone(regex)),
            PatternArg::Dynamic(param) => PatternRuntime::Dynamic {
                child: param.create_generator(),
                full_match,
            },
        }
    }

    fn has_aggregate(&self) -> bool {
        match self {
            PatternArg::Static(_) => false,
            PatternArg::Dynamic(param) => param.has_aggregate(),
        }
    }

    fn requires_child_data(&self) -> bool {
        match self {
            PatternArg::Static(_) => false,
            PatternArg::Dynamic(param) => param.requires_child_data(),
        }
    }
}

/// The runtime face of a [`PatternArg`].
enum PatternRuntime {
    Static(Arc<Regex>),
    Dynamic {
        child: Box<dyn Generator>,
        full_match: bool,
    },
}

impl PatternRuntime {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        if let PatternRuntime::Dynamic { child, .. } = self {
            child.set(values, storage);
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        if let PatternRuntime::Dynamic { child, .. } = self {
            child.merge(target, source);
        }
    }

    fn regex(
        &self,
        storage: &StoredValues,
        child_data: Option<&dyn ChildDataSupplier>,
    ) -> Result<Arc<Regex>, Val> {
        match self {
            PatternRuntime::Static(regex) => Ok(Arc::clone(regex)),
            PatternRuntime::Dynamic { child, full_match } => {
                let value = child.eval(storage, child_data);
                if value.is_err() {
                    return Err(value);
                }
                cached_regex(&value.to_display_string(), *full_match)
            }
        }
    }
}

/// `concat(...)`: rendered children joined in argument order. Null renders
/// as the empty string; an error child propagates unchanged.
pub struct Concat {
    params: Vec<Param>,
}

impl Concat {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("concat", 1, MANY, &params)?;
        Ok(Self { params })
    }
}

impl Function for Concat {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(ConcatGenerator {
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

struct ConcatGenerator {
    children: Vec<Box<dyn Generator>>,
}

impl Generator for ConcatGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match eval_children(&self.children, storage, child_data) {
            Ok(values) => Val::String(
                values
                    .iter()
                    .map(Val::to_display_string)
                    .collect::<String>(),
            ),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// The transformation a single-input string function applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    UpperCase,
    LowerCase,
    Length,
    EncodeUrl,
    DecodeUrl,
}

impl TextOp {
    pub fn name(&self) -> &'static str {
        match self {
            TextOp::UpperCase => "upperCase",
            TextOp::LowerCase => "lowerCase",
            TextOp::Length => "stringLength",
            TextOp::EncodeUrl => "encodeUrl",
            TextOp::DecodeUrl => "decodeUrl",
        }
    }

    fn apply(&self, text: &str) -> Val {
        match self {
            TextOp::UpperCase => Val::String(text.to_uppercase()),
            TextOp::LowerCase => Val::String(text.to_lowercase()),
            TextOp::Length => Val::Integer(text.chars().count() as i32),
            TextOp::EncodeUrl => Val::String(urlencoding::encode(text).into_owned()),
            TextOp::DecodeUrl => match urlencoding::decode(text) {
                Ok(decoded) => Val::String(decoded.into_owned()),
                Err(_) => Val::err(format!("Unable to decode '{}' as a URL", text)),
            },
        }
    }
}

/// `upperCase`, `lowerCase`, `stringLength`, `encodeUrl`, `decodeUrl`.
pub struct Text {
    op: TextOp,
    param: Param,
}

impl Text {
    pub fn new(op: TextOp, params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity(op.name(), 1, 1, &params)?;
        Ok(Self {
            op,
            param: params.remove(0),
        })
    }
}

impl Function for Text {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(TextGenerator {
            op: self.op,
            child: self.param.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.param.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.param.requires_child_data()
    }
}

struct TextGenerator {
    op: TextOp,
    child: Box<dyn Generator>,
}

impl Generator for TextGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        self.op.apply(&value.to_display_string())
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// `substring(value, start, end)`: character positions, end-exclusive,
/// clamped to the input like the original rather than failing on
/// out-of-range positions.
pub struct Substring {
    params: Vec<Param>,
}

impl Substring {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("substring", 3, 3, &params)?;
        Ok(Self { params })
    }
}

impl Function for Substring {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(SubstringGenerator {
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

struct SubstringGenerator {
    children: Vec<Box<dyn Generator>>,
}

impl Generator for SubstringGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let values = match eval_children(&self.children, storage, child_data) {
            Ok(values) => values,
            Err(error) => return error,
        };
        if values[0].is_null() {
            return Val::Null;
        }
        let text = values[0].to_display_string();
        let (Some(start), Some(end)) = (values[1].to_integer(), values[2].to_integer()) else {
            return Val::err("Unable to read substring positions".to_string());
        };
        let chars: Vec<char> = text.chars().collect();
        let start = start.max(0) as usize;
        let end = (end.max(0) as usize).min(chars.len());
        if start >= end {
            return Val::String(String::new());
        }
        Val::String(chars[start..end].iter().collect())
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// `indexOf(value, fragment)`: the first character position of `fragment`,
/// or -1 when absent.
pub struct IndexOf {
    params: Vec<Param>,
}

impl IndexOf {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("indexOf", 2, 2, &params)?;
        Ok(Self { params })
    }
}

impl Function for IndexOf {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(IndexOfGenerator {
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

struct IndexOfGenerator {
    children: Vec<Box<dyn Generator>>,
}

impl Generator for IndexOfGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let values = match eval_children(&self.children, storage, child_data) {
            Ok(values) => values,
            Err(error) => return error,
        };
        let text = values[0].to_display_string();
        let fragment = values[1].to_display_string();
        match text.find(&fragment) {
            // Byte offset back to character position for non-ASCII input
            Some(byte_pos) => Val::Integer(text[..byte_pos].chars().count() as i32),
            None => Val::Integer(-1),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// `replace(value, regex, replacement)`: every match of the pattern
/// replaced.
pub struct Replace {
    value: Param,
    pattern: PatternArg,
    replacement: Param,
}

impl Replace {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("replace", 3, 3, &params)?;
        let mut params = params;
        let replacement = params.remove(2);
        let pattern = PatternArg::bind("replace", params.remove(1), false)?;
        Ok(Self {
            value: params.remove(0),
            pattern,
            replacement,
        })
    }
}

impl Function for Replace {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(ReplaceGenerator {
            value: self.value.create_generator(),
            pattern: self.pattern.create_runtime(false),
            replacement: self.replacement.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate()
            || self.pattern.has_aggregate()
            || self.replacement.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data()
            || self.pattern.requires_child_data()
            || self.replacement.requires_child_data()
    }
}

struct ReplaceGenerator {
    value: Box<dyn Generator>,
    pattern: PatternRuntime,
    replacement: Box<dyn Generator>,
}

impl Generator for ReplaceGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.value.set(values, storage);
        self.pattern.set(values, storage);
        self.replacement.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.value.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        let regex = match self.pattern.regex(storage, child_data) {
            Ok(regex) => regex,
            Err(error) => return error,
        };
        let replacement = self.replacement.eval(storage, child_data);
        if replacement.is_err() {
            return replacement;
        }
        let text = value.to_display_string();
        let replaced = regex.replace_all(&text, replacement.to_display_string().as_str());
        Val::String(replaced.into_owned())
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.value.merge(target, source);
        self.pattern.merge(target, source);
        self.replacement.merge(target, source);
    }
}

/// `match(value, regex)`: true when the pattern matches the whole input.
pub struct Match {
    value: Param,
    pattern: PatternArg,
}

impl Match {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("match", 2, 2, &params)?;
        let mut params = params;
        let pattern = PatternArg::bind("match", params.remove(1), true)?;
        Ok(Self {
            value: params.remove(0),
            pattern,
        })
    }
}

impl Function for Match {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(MatchGenerator {
            value: self.value.create_generator(),
            pattern: self.pattern.create_runtime(true),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate() || self.pattern.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data() || self.pattern.requires_child_data()
    }
}

struct MatchGenerator {
    value: Box<dyn Generator>,
    pattern: PatternRuntime,
}

impl Generator for MatchGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.value.set(values, storage);
        self.pattern.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.value.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        let regex = match self.pattern.regex(storage, child_data) {
            Ok(regex) => regex,
            Err(error) => return error,
        };
        Val::Boolean(regex.is_match(&value.to_display_string()))
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.value.merge(target, source);
        self.pattern.merge(target, source);
    }
}
