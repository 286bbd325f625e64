use std::collections::HashMap;

use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::{OrderByType, PlanNodeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunctionType {
    CountStar,
    Count,
    Sum,
    Min,
    Max,
    Rank,
}

/// One window function definition bound to an output column.
#[derive(Debug, Clone)]
pub struct WindowFunction {
    pub function: ExpressionRef,
    pub win_type: WindowFunctionType,
    pub partition_by: Vec<ExpressionRef>,
    pub order_by: Vec<(OrderByType, ExpressionRef)>,
}

/// Window aggregation: one output row per input row, with window-function
/// columns substituted at their placeholder positions.
#[derive(Debug, Clone)]
pub struct WindowPlanNode {
    output_schema: Schema,
    columns: Vec<ExpressionRef>,
    window_functions: HashMap<usize, WindowFunction>,
    children: Vec<PlanNodeRef>,
}

impl WindowPlanNode {
    pub fn new(
        output_schema: Schema,
        columns: Vec<ExpressionRef>,
        window_functions: HashMap<usize, WindowFunction>,
        child: PlanNodeRef,
    ) -> Self {
        Self {
            output_schema,
            columns,
            window_functions,
            children: vec![child],
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        &self.children
    }

    pub fn get_child_plan(&self) -> &PlanNodeRef {
        &self.children[0]
    }

    pub fn get_columns(&self) -> &[ExpressionRef] {
        &self.columns
    }

    pub fn get_window_functions(&self) -> &HashMap<usize, WindowFunction> {
        &self.window_functions
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            columns: self.columns.clone(),
            window_functions: self.window_functions.clone(),
            children,
        }
    }
}
