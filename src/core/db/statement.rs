/// Prepared Statement Module
///
/// The statement an accessor holds between `prepare_statement` and
/// `clear_statement`: its SQL, the explicitly bound parameters and the
/// cursor over the rows of its last execution.
use crate::core::db::driver::{DriverError, DriverResult, StatementInfo};
use crate::core::db::params::{Binding, ParamSlot, Placeholder};
use crate::core::db::query::ResultCursor;
use crate::core::db::value::{ParamType, Value};

#[derive(Debug, Clone)]
enum BindSource {
    /// Copied when bound
    Value(Value),
    /// Read when the statement executes
    Slot(ParamSlot),
}

#[derive(Debug, Clone)]
struct BoundParam {
    placeholder: Placeholder,
    source: BindSource,
    ty: Option<ParamType>,
    length: Option<usize>,
}

impl BoundParam {
    fn resolve(&self) -> Binding {
        let value = match &self.source {
            BindSource::Value(value) => value.clone(),
            BindSource::Slot(slot) => slot.get(),
        };
        let ty = self.ty.unwrap_or_else(|| ParamType::infer(&value));
        Binding {
            placeholder: self.placeholder.clone(),
            value,
            ty,
            length: self.length,
        }
    }
}

/// A statement prepared on the accessor's connection.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    info: StatementInfo,
    bound: Vec<BoundParam>,
    cursor: Option<ResultCursor>,
    affected: u64,
}

impl PreparedStatement {
    pub fn new(sql: &str, info: StatementInfo) -> Self {
        PreparedStatement {
            sql: sql.to_string(),
            info,
            bound: Vec::new(),
            cursor: None,
            affected: 0,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        self.info.parameter_count
    }

    /// Positions are 1-based and must not exceed the parameter count. Names
    /// are left to the driver.
    pub fn check_placeholder(&self, placeholder: &Placeholder) -> DriverResult<()> {
        match placeholder {
            Placeholder::Index(i) if *i == 0 || *i > self.parameter_count() => {
                Err(DriverError::invalid_parameter_number(format!(
                    "position {} out of range, statement has {} parameter(s)",
                    i,
                    self.parameter_count()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Rows changed by the last execution.
    pub fn row_count(&self) -> u64 {
        self.affected
    }

    /// Number of explicitly bound placeholders.
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    /// Binds a shared slot; rebinding a placeholder replaces the earlier binding.
    pub fn bind_slot(
        &mut self,
        placeholder: Placeholder,
        slot: &ParamSlot,
        ty: Option<ParamType>,
        length: Option<usize>,
    ) {
        self.bind(BoundParam {
            placeholder,
            source: BindSource::Slot(slot.clone()),
            ty,
            length,
        });
    }

    pub fn bind_value(&mut self, placeholder: Placeholder, value: Value, ty: Option<ParamType>) {
        self.bind(BoundParam {
            placeholder,
            source: BindSource::Value(value),
            ty,
            length: None,
        });
    }

    fn bind(&mut self, param: BoundParam) {
        match self
            .bound
            .iter_mut()
            .find(|existing| existing.placeholder == param.placeholder)
        {
            Some(existing) => *existing = param,
            None => self.bound.push(param),
        }
    }

    /// Resolves the explicit bindings against the current slot values.
    pub fn bindings(&self) -> Vec<Binding> {
        self.bound.iter().map(BoundParam::resolve).collect()
    }

    /// Records the outcome of an execution, replacing the previous cursor.
    pub fn set_result(&mut self, cursor: ResultCursor, affected: u64) {
        self.cursor = Some(cursor);
        self.affected = affected;
    }

    /// Drops the previous execution's rows, e.g. after a failed execution.
    pub fn reset_result(&mut self) {
        self.cursor = None;
        self.affected = 0;
    }

    pub fn cursor_mut(&mut self) -> Option<&mut ResultCursor> {
        self.cursor.as_mut()
    }
}
