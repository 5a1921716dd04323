//! # tablecalc
//!
//! The expression evaluation core of an analytic query language: turns a
//! bound tree of functions and literals into per-row and per-group computed
//! values over tabular search results (numbers, strings, dates, durations,
//! booleans, errors).
//!
//! ## Features
//!
//! - **Closed Value Model**: one tagged [`Val`] type with total coercions —
//!   bad data becomes typed error values, never exceptions
//! - **Streaming Aggregation**: generator state lives in external storage
//!   and partial per-group results merge exactly
//! - **Selector Functions**: first/last/nth/top/bottom pick member rows
//!   from lazily supplied group data; `any` skips materialisation entirely
//! - **Consistent Coercion**: one generic comparator drives equality,
//!   ordering and min/max across mixed value types
//!
//! ## Quick Start
//!
//! ```rust
//! use tablecalc::{
//!     create_function, ExpressionContext, FieldIndex, ParamBinder, StateIndex, Token,
//!     TokenKind, Val,
//! };
//!
//! // Bind sum(${value}) once per query
//! let ctx = ExpressionContext::with_reference_time(0);
//! let binder = ParamBinder::new();
//! let mut fields = FieldIndex::new();
//! let mut state = StateIndex::new();
//!
//! let field = binder
//!     .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "value", 0))
//!     .unwrap();
//! let sum = create_function(&ctx, "sum", vec![field], &mut state).unwrap();
//!
//! // Evaluate per row, then read the aggregate out
//! let mut generator = sum.create_generator();
//! let mut storage = state.create_stored_values();
//! for v in [3.0, 4.0, 5.0] {
//!     generator.set(&[Val::Double(v)], &mut storage);
//! }
//! assert_eq!(generator.eval(&storage, None), Val::Double(12.0));
//! ```

pub mod tablecalc;

pub use crate::tablecalc::{
    bind_expression, create_function, BindResult, CaseSensitivity, ChildData, ChildDataSupplier,
    Expression, ExprError, ExpressionContext, FieldIndex, Function, Generator, GroupRows,
    LazyChildData, Param, ParamBinder, ResolvedZone, StateIndex, StaticValueFunction,
    StoredValues, TimeZonePolicy, Token, TokenKind, Val,
};
