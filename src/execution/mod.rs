pub mod execution_common;
pub mod execution_engine;
pub mod executor_context;
pub mod executors;
pub mod expressions;
pub mod plans;
