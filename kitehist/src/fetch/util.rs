use kitehist_core::KiteError;

/// Join a collection of tasks and apply an optional request-level deadline.
///
/// On timeout this returns `KiteError::RequestTimeout("request")`; call sites
/// remap it to a more specific capability label as needed.
///
/// # Errors
/// Returns `RequestTimeout` when the deadline elapses before every task finishes.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    deadline: Option<std::time::Duration>,
) -> Result<Vec<T>, KiteError>
where
    I: IntoIterator<Item = F>,
    F: core::future::Future<Output = T>,
{
    crate::core::with_request_deadline(deadline, futures::future::join_all(tasks)).await
}
