/// Input validation for query text
///
/// Rejects input before it reaches the tokenizer, so oversized or empty
/// queries never allocate token buffers.
use querylite_core::error::{Error, Result};

/// Default upper bound on query length, in bytes
pub const MAX_QUERY_LENGTH: usize = 1024 * 1024; // 1 MB

/// Validates query text against a length limit
///
/// # Security
///
/// - Prevents empty or whitespace-only queries
/// - Prevents oversized queries (> `max_length` bytes)
/// - Prevents embedded NUL bytes
///
/// # Errors
///
/// Returns Error::InvalidInput if validation fails
#[inline]
pub fn validate_query(query: &str, max_length: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("Query cannot be empty".to_string()));
    }

    if query.len() > max_length {
        return Err(Error::InvalidInput(format!(
            "Query length {} exceeds maximum {}",
            query.len(),
            max_length
        )));
    }

    if query.contains('\0') {
        return Err(Error::InvalidInput(
            "Query cannot contain NUL bytes".to_string(),
        ));
    }

    Ok(())
}
