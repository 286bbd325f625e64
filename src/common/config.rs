pub type FrameId = usize; // frame id type
pub type PageId = u64; // page id type
pub type TxnId = u64; // transaction id type
pub type SlotId = u32; // slot number type
pub type Oid = u64; // object id type
pub type TableOid = u64;
pub type IndexOid = u64;
pub type Timestamp = u64;

pub const DB_PAGE_SIZE: usize = 4096; // size of a data page in bytes
pub const INVALID_PAGE_ID: PageId = PageId::MAX; // invalid page id
pub const INVALID_TXN_ID: TxnId = 0; // invalid transaction id
pub const INVALID_TS: Timestamp = Timestamp::MAX;
pub const BUFFER_POOL_SIZE: usize = 10; // default size of the buffer pool
pub const LRUK_REPLACER_K: usize = 10; // default lookback window for the lru-k replacer

/// Transaction ids are drawn from the top half of the timestamp space, so a
/// tuple timestamp `ts >= TXN_START_ID` always denotes an uncommitted write
/// by transaction `ts`.
pub const TXN_START_ID: TxnId = 1 << 62;

/// Largest depth a hash table header page can be initialized with; bounds the
/// directory-id array so the page fits in `DB_PAGE_SIZE`.
pub const HTABLE_HEADER_MAX_DEPTH: u32 = 8;
/// Largest depth a hash table directory page can be initialized with.
pub const HTABLE_DIRECTORY_MAX_DEPTH: u32 = 8;
