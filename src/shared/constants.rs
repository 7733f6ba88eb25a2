/// Owner id whose records are visible to every caller
pub const SHARED_OWNER_ID: i64 = 0;

/// Longest accepted file name, in characters
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Extra request body allowance for multipart framing on upload routes
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Default number of chat messages returned by the history endpoint
pub const DEFAULT_CHAT_HISTORY_LIMIT: i64 = 50;

/// Upper bound for the chat history `limit` parameter
pub const MAX_CHAT_HISTORY_LIMIT: i64 = 500;
