pub mod aggregate_merge_test;
pub mod binding_test;
pub mod date_rounding_test;
pub mod evaluation_test;
pub mod selector_test;
pub mod value_model_test;

pub mod support;
