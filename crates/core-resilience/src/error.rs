//! Error types for resilience operations
//!
//! Both types are generic over the error produced by the wrapped operation, so
//! the caller always gets its own transport error back at the bottom of the
//! cause chain.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::retry::{ErrorClass, StatusCategory, TransportStatus};

/// Outcome of a single failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure<E> {
    /// The attempt did not finish within its time bound
    Timeout(Duration),
    /// The operation itself reported a failure
    Operation(E),
}

impl<E> AttemptFailure<E> {
    /// Classify this failure using the supplied classifier.
    ///
    /// Timeouts are always retryable; operation errors are handed to `classify`.
    pub fn classify_with<C>(&self, classify: C) -> ErrorClass
    where
        C: Fn(&E) -> ErrorClass,
    {
        match self {
            AttemptFailure::Timeout(_) => ErrorClass::Retryable,
            AttemptFailure::Operation(e) => classify(e),
        }
    }

    /// The operation error, if this was not a timeout
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            AttemptFailure::Operation(e) => Some(e),
            AttemptFailure::Timeout(_) => None,
        }
    }
}

impl<E: TransportStatus> AttemptFailure<E> {
    /// Transport category of this failure, when one is known
    pub fn status_category(&self) -> Option<StatusCategory> {
        match self {
            AttemptFailure::Timeout(_) => Some(StatusCategory::DeadlineExceeded),
            AttemptFailure::Operation(e) => e.status_category(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for AttemptFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout(limit) => write!(f, "attempt timed out after {:?}", limit),
            AttemptFailure::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E: Error + 'static> Error for AttemptFailure<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AttemptFailure::Timeout(_) => None,
            AttemptFailure::Operation(e) => Some(e),
        }
    }
}

/// Terminal failure of a resilient call
///
/// Every variant keeps enough of the cause to answer "why did this fail":
/// the circuit was open, the operation was rejected, or the retry budget ran
/// out. A timed-out final attempt always surfaces as `RetriesExhausted`
/// with `last` set to `AttemptFailure::Timeout`, even when no retry was
/// configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError<E> {
    /// Circuit breaker is open, the operation was never started
    CircuitOpen,

    /// The operation failed with an error that is not retried
    Operation(E),

    /// All attempts failed with retryable errors
    RetriesExhausted {
        /// Total number of attempts made (first try included)
        attempts: u32,
        /// Failure of the final attempt
        last: AttemptFailure<E>,
    },
}

impl<E> ResilienceError<E> {
    /// Check if the call was rejected by an open circuit
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen)
    }

    /// Check if the call (or its final attempt) timed out
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ResilienceError::RetriesExhausted {
                    last: AttemptFailure::Timeout(_),
                    ..
                }
        )
    }

    /// Check if the retry budget was spent
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ResilienceError::RetriesExhausted { .. })
    }

    /// Number of attempts made before this error was produced
    pub fn attempts(&self) -> u32 {
        match self {
            ResilienceError::CircuitOpen => 0,
            ResilienceError::Operation(_) => 1,
            ResilienceError::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    /// The underlying operation error, if any attempt produced one last
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            ResilienceError::RetriesExhausted { last, .. } => last.operation_error(),
            _ => None,
        }
    }

    /// Convert the operation error type, keeping the failure shape
    pub fn map_err<F, O>(self, op: O) -> ResilienceError<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            ResilienceError::CircuitOpen => ResilienceError::CircuitOpen,
            ResilienceError::Operation(e) => ResilienceError::Operation(op(e)),
            ResilienceError::RetriesExhausted { attempts, last } => {
                let last = match last {
                    AttemptFailure::Timeout(d) => AttemptFailure::Timeout(d),
                    AttemptFailure::Operation(e) => AttemptFailure::Operation(op(e)),
                };
                ResilienceError::RetriesExhausted { attempts, last }
            }
        }
    }
}

impl<E: fmt::Display> fmt::Display for ResilienceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::CircuitOpen => write!(f, "Circuit breaker is open, rejecting call"),
            ResilienceError::Operation(e) => write!(f, "Operation failed: {}", e),
            ResilienceError::RetriesExhausted { attempts, last } => {
                write!(f, "All {} attempts failed, last error: {}", attempts, last)
            }
        }
    }
}

impl<E: Error + 'static> Error for ResilienceError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            ResilienceError::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Rejected(&'static str);

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "rejected: {}", self.0)
        }
    }

    impl Error for Rejected {}

    #[test]
    fn test_cause_chain_reaches_operation_error() {
        let err: ResilienceError<Rejected> = ResilienceError::RetriesExhausted {
            attempts: 3,
            last: AttemptFailure::Operation(Rejected("busy")),
        };

        let first = err.source().expect("exhausted error has a source");
        let second = first.source().expect("attempt failure has a source");
        assert_eq!(second.to_string(), "rejected: busy");
        assert_eq!(err.operation_error(), Some(&Rejected("busy")));
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_timeout_detection() {
        let single: ResilienceError<Rejected> = ResilienceError::RetriesExhausted {
            attempts: 1,
            last: AttemptFailure::Timeout(Duration::from_secs(1)),
        };
        assert!(single.is_timeout());
        assert_eq!(single.attempts(), 1);

        let rejected: ResilienceError<Rejected> = ResilienceError::Operation(Rejected("no"));
        assert!(!rejected.is_timeout());
        assert!(!rejected.is_exhausted());

        let exhausted: ResilienceError<Rejected> = ResilienceError::RetriesExhausted {
            attempts: 2,
            last: AttemptFailure::Timeout(Duration::from_secs(1)),
        };
        assert!(exhausted.is_timeout());
        assert!(exhausted.is_exhausted());
        assert!(exhausted.operation_error().is_none());
    }

    #[test]
    fn test_map_err_keeps_shape() {
        let err: ResilienceError<Rejected> = ResilienceError::RetriesExhausted {
            attempts: 4,
            last: AttemptFailure::Operation(Rejected("down")),
        };

        let mapped = err.map_err(|e| e.0.len());
        assert_eq!(
            mapped,
            ResilienceError::RetriesExhausted {
                attempts: 4,
                last: AttemptFailure::Operation(4),
            }
        );
        assert!(ResilienceError::<Rejected>::CircuitOpen
            .map_err(|e| e.0)
            .is_circuit_open());
    }

    #[test]
    fn test_display() {
        let err: ResilienceError<Rejected> = ResilienceError::CircuitOpen;
        assert_eq!(err.to_string(), "Circuit breaker is open, rejecting call");

        let err: ResilienceError<Rejected> = ResilienceError::Operation(Rejected("bad sn"));
        assert_eq!(err.to_string(), "Operation failed: rejected: bad sn");
    }
}
