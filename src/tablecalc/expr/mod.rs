//! The expression protocol: bindable function trees, their runtime
//! generators, per-row storage and the group-data contract.

pub mod bind;
pub mod child_data;
pub mod field_index;
pub mod function;
pub mod generator;
pub mod param;
pub mod stored;

pub use bind::{bind_expression, ParamBinder, Token, TokenKind};
pub use child_data::{ChildData, ChildDataSupplier, GroupRows, LazyChildData};
pub use field_index::FieldIndex;
pub use function::{check_arity, Brackets, Expression, Function, Ref, StaticValueFunction};
pub use generator::{
    eval_children, merge_children, set_children, Generator, StaticGenerator,
};
pub use param::{any_aggregate, any_child_data, Param};
pub use stored::{StateCell, StateIndex, StateRef, StoredValues};
