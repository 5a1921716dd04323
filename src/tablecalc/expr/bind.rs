//! Token-to-parameter binding.
//!
//! The lexer/grammar layer upstream produces typed tokens; this module turns
//! one token into an evaluable [`Param`]: literals become values, field
//! references claim a column position in the [`FieldIndex`], and named
//! parameter references substitute their statically bound value. Anything
//! that fails here (malformed date, unparseable number) is a bind-time
//! failure carrying the token's source position, never a runtime error
//! value.

use std::collections::HashMap;
use std::sync::Arc;

use super::field_index::FieldIndex;
use super::function::{Expression, Ref};
use super::param::Param;
use super::stored::StateIndex;
use crate::tablecalc::error::{BindResult, ExprError};
use crate::tablecalc::values::{datetime, Val};

/// The kind of a pre-lexed token, as typed by the upstream grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Quoted text; `text` holds the unquoted content
    String,
    /// A numeric literal
    Number,
    /// An ISO-8601 date-time literal
    DateLiteral,
    /// A compact or ISO-8601 duration literal
    DurationLiteral,
    /// A bare identifier: a field reference or a named parameter
    Field,
}

/// One pre-lexed token with its source position for error reporting.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Resolves raw tokens into evaluable parameters.
///
/// Carries the query's named-parameter substitutions: a field token whose
/// name matches a bound parameter becomes that parameter's value instead of
/// a column reference.
#[derive(Debug, Default)]
pub struct ParamBinder {
    named: HashMap<String, Val>,
}

impl ParamBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A binder with named-parameter substitutions. Lookup is
    /// case-insensitive like field names.
    pub fn with_named(named: HashMap<String, Val>) -> Self {
        let named = named
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { named }
    }

    /// Bind one token to a parameter.
    pub fn bind(
        &self,
        field_index: &mut FieldIndex,
        state: &mut StateIndex,
        token: &Token,
    ) -> BindResult<Param> {
        log::trace!("bind() - {:?} '{}'", token.kind, token.text);
        match token.kind {
            TokenKind::String => Ok(Param::Value(Val::string(token.text.clone()))),
            TokenKind::Number => token
                .text
                .parse::<f64>()
                .map(|v| Param::Value(Val::Double(v)))
                .map_err(|_| {
                    ExprError::token("Unable to parse number", &token.text, token.position)
                }),
            TokenKind::DateLiteral => datetime::parse_iso(&token.text)
                .map(|ms| Param::Value(Val::Date(ms)))
                .ok_or_else(|| {
                    ExprError::token("Unable to parse date", &token.text, token.position)
                }),
            TokenKind::DurationLiteral => datetime::parse_duration(&token.text)
                .map(|ms| Param::Value(Val::Duration(ms)))
                .ok_or_else(|| {
                    ExprError::token("Unable to parse duration", &token.text, token.position)
                }),
            TokenKind::Field => {
                if let Some(value) = self.named.get(&token.text.to_lowercase()) {
                    // A named parameter substitutes statically; it never
                    // claims a column position
                    return Ok(Param::Value(value.clone()));
                }
                let column = field_index.get_or_create(&token.text);
                let slot = state.next();
                Ok(Param::Function(Arc::new(Ref::new(
                    token.text.clone(),
                    column,
                    slot,
                ))))
            }
        }
    }
}

/// Wrap a fully bound parameter tree as the query's top-level expression.
///
/// The upstream grammar reduces its token structure to exactly one root
/// parameter; anything else is a structural error.
pub fn bind_expression(mut params: Vec<Param>) -> BindResult<Expression> {
    log::trace!("bind_expression() - {} root param(s)", params.len());
    match params.len() {
        1 => Ok(Expression::new(params.remove(0))),
        0 => Err(ExprError::parse("Expected an expression")),
        n => Err(ExprError::parse(format!(
            "Expected a single root parameter, found {}",
            n
        ))),
    }
}
