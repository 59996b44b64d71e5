use super::Error;

/// Error when the backend fails to execute an operation.
///
/// This wraps the driver's native error (rusqlite, I/O, URL parsing) and is
/// surfaced to the caller unchanged. The engine never retries.
#[derive(Debug)]
pub(super) struct DriverOperationFailed {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for DriverOperationFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for DriverOperationFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.inner, f)?;
        let mut source = self.inner.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

impl Error {
    /// Creates an error from a driver operation failure.
    pub fn driver_operation_failed(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::DriverOperationFailed(
            DriverOperationFailed {
                inner: Box::new(err),
            },
        ))
    }

    /// Returns `true` if this error, or a cause of it, is a driver operation failure.
    pub fn is_driver_operation_failed(&self) -> bool {
        self.find_kind(|kind| {
            matches!(kind, super::ErrorKind::DriverOperationFailed(_)).then_some(())
        })
        .is_some()
    }
}
