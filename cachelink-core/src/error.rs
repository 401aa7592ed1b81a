use thiserror::Error;

/// Failure to obtain a value from a resource manager.
///
/// The manager has already released the caller's reference by the time this
/// error is returned, so no holder is leaked.
///
/// # Type Parameters
///
/// * `E` - The error type produced by the caller-supplied factory
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AcquireError<E> {
    /// The factory returned no value.
    #[error("factory declined to construct a value")]
    Declined,

    /// The factory returned an error, forwarded unchanged.
    #[error("factory failed to construct a value: {0}")]
    Factory(E),
}

impl<E> AcquireError<E> {
    /// Returns the factory's error, if this is a factory failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelink_core::AcquireError;
    ///
    /// let err: AcquireError<&str> = AcquireError::Factory("disk full");
    /// assert_eq!(err.into_factory_error(), Some("disk full"));
    ///
    /// let declined: AcquireError<&str> = AcquireError::Declined;
    /// assert_eq!(declined.into_factory_error(), None);
    /// ```
    pub fn into_factory_error(self) -> Option<E> {
        match self {
            AcquireError::Factory(e) => Some(e),
            AcquireError::Declined => None,
        }
    }

    /// Returns `true` if the factory declined to construct a value.
    pub fn is_declined(&self) -> bool {
        matches!(self, AcquireError::Declined)
    }
}
