//! Some useful tools for the project.
//!
//! Usually, you don't need to use this module directly.

use tokio::task::JoinError;

/// Unwrap one `JoinSet` result.
///
/// The sub-tasks of a page-step are never cancelled from outside while
/// the set is being drained, so a join error can only be a panic; it is
/// resumed on the caller.
pub(crate) fn unwrap_joined<T>(joined: Result<T, JoinError>) -> T {
    match joined {
        Ok(value) => value,
        Err(join_error) => {
            if let Ok(reason) = join_error.try_into_panic() {
                // Expect unknown error, so we just resume the panic
                std::panic::resume_unwind(reason)
            }
            panic!("Unexpected task cancelled");
        }
    }
}

/// The file extension of an image URL, query string and fragment
/// ignored. `None` when the last path segment carries no extension.
pub(crate) fn file_extension(url: &str) -> Option<&str> {
    let path = match url.find(['?', '#']) {
        Some(end) => &url[..end],
        None => url,
    };
    let name = path.rsplit('/').next()?;
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension)
}
