// Expression evaluation core for tabular analytic queries
// Turns a bound tree of functions and literals into per-row and per-group
// computed values over search results

pub mod context;
pub mod error;
pub mod expr;
pub mod functions;
pub mod values;

// Re-export main API
pub use context::{ExpressionContext, ResolvedZone, TimeZonePolicy};
pub use error::{BindResult, ExprError};
pub use expr::{
    bind_expression, ChildData, ChildDataSupplier, Expression, FieldIndex, Function, Generator,
    GroupRows, LazyChildData, Param, ParamBinder, StateIndex, StaticValueFunction, StoredValues,
    Token, TokenKind,
};
pub use functions::create as create_function;
pub use values::{CaseSensitivity, Val};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "value_model",         // closed tagged value type with total coercions
    "generator_protocol",  // set/eval/merge evaluation over external storage
    "streaming_merge",     // partial per-group state combination
    "aggregate_functions", // sum, min, max, average, variance, stDev, count
    "selector_functions",  // any, first, last, nth, top, bottom
    "date_rounding",       // calendar-unit and arbitrary-duration rounding
    "string_functions",    // concat, case, substring, replace, match
    "logic_functions",     // if, and, or, not, comparison family
    "link_builders",       // markdown-style link and dashboard cells
    "parameter_binding",   // typed token to field/literal resolution
];
