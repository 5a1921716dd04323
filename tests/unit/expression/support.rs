//! Shared helpers for expression tests: a tiny harness that stands in for
//! the surrounding row/grouping engine.

use std::sync::Arc;

use tablecalc::{
    create_function, ChildData, ExpressionContext, FieldIndex, Function, GroupRows, ParamBinder,
    StateIndex, Token, TokenKind, Val,
};

/// One bound function plus everything the engine would hold alongside it.
pub struct Compiled {
    pub function: Arc<dyn Function>,
    pub fields: FieldIndex,
    pub state: StateIndex,
}

impl Compiled {
    /// Bind `name(${val1}, ...extra)` — a single field reference over
    /// column 0 followed by literal parameters.
    pub fn with_field(name: &str, extra: Vec<Val>) -> Self {
        let ctx = ExpressionContext::with_reference_time(0);
        let binder = ParamBinder::new();
        let mut fields = FieldIndex::new();
        let mut state = StateIndex::new();
        let mut params = vec![binder
            .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 0))
            .unwrap()];
        params.extend(extra.into_iter().map(tablecalc::Param::Value));
        let function = create_function(&ctx, name, params, &mut state).unwrap();
        Self {
            function,
            fields,
            state,
        }
    }

    /// Bind `name(...)` over literal parameters only.
    pub fn with_values(name: &str, values: Vec<Val>) -> Self {
        let ctx = ExpressionContext::with_reference_time(0);
        let mut state = StateIndex::new();
        let params = values.into_iter().map(tablecalc::Param::Value).collect();
        let function = create_function(&ctx, name, params, &mut state).unwrap();
        Self {
            function,
            fields: FieldIndex::new(),
            state,
        }
    }

    /// Drive the generator over single-column rows and return the final
    /// evaluation.
    pub fn run_rows(&self, rows: &[Val]) -> Val {
        let mut generator = self.function.create_generator();
        let mut storage = self.state.create_stored_values();
        for row in rows {
            generator.set(std::slice::from_ref(row), &mut storage);
        }
        generator.eval(&storage, None)
    }

    /// Evaluate with no rows at all (constant expressions).
    pub fn run(&self) -> Val {
        self.run_rows(&[])
    }

    /// Build per-member storage for a group the way the grouping engine
    /// does: one fresh generator pass per member row.
    pub fn group_of(&self, rows: &[Val]) -> GroupRows {
        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            let mut generator = self.function.create_generator();
            let mut storage = self.state.create_stored_values();
            generator.set(std::slice::from_ref(row), &mut storage);
            members.push(storage);
        }
        GroupRows::new(members)
    }
}

/// Build a `ChildData` box from single-column member rows for a compiled
/// function.
pub fn child_data(compiled: &Compiled, rows: &[Val]) -> Box<dyn ChildData> {
    Box::new(compiled.group_of(rows))
}
