// Expression engine tests - Binding, evaluation, aggregation and merge
pub mod expression;
