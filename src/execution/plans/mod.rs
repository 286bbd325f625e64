pub mod abstract_plan;
pub mod aggregation_plan;
pub mod delete_plan;
pub mod filter_plan;
pub mod hash_join_plan;
pub mod index_scan_plan;
pub mod insert_plan;
pub mod limit_plan;
pub mod nested_loop_join_plan;
pub mod seq_scan_plan;
pub mod sort_plan;
pub mod topn_plan;
pub mod update_plan;
pub mod values_plan;
pub mod window_plan;
