/// Classification for retry policy.
///
/// Used by the transport to decide whether to re-issue a request and by the
/// registry to decide whether to move on to the next provider.
///
/// # Behavior Summary
///
/// | Class | Retried by transport? | Next provider tried? | Recorded as attempt? |
/// |-------|-----------------------|----------------------|----------------------|
/// | `Retry` | Yes, within the request policy | Yes, once budget is spent | Yes |
/// | `NextProvider` | No | Yes | Yes |
/// | `Abort` | No | No | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Transient failure: rate limiting, server error, network or timeout.
    ///
    /// The transport re-issues the request after the fixed policy delay
    /// until the retry budget is exhausted; after that it behaves like
    /// `NextProvider`.
    Retry,

    /// Permanent for this provider (not found, bad request, malformed
    /// payload). Another provider might still succeed.
    NextProvider,

    /// Stop the whole resolution: invalid caller input, cancellation, or an
    /// already-aggregated failure.
    Abort,
}
