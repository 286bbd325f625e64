pub mod extendible_hash_table_index;
