pub mod abstract_executor;
pub mod aggregation_executor;
pub mod delete_executor;
pub mod filter_executor;
pub mod hash_join_executor;
pub mod index_scan_executor;
pub mod insert_executor;
pub mod limit_executor;
pub mod nested_loop_join_executor;
pub mod seq_scan_executor;
pub mod sort_executor;
pub mod topn_executor;
pub mod update_executor;
pub mod values_executor;
pub mod window_executor;
