use std::fmt::Display;
use std::panic::Location;

/// Logging for the fallible steps `main` runs through.
pub trait ResultExt<T, E> {
    /// Emit an `error` event naming `context` and the calling line when
    /// `self` is `Err`. The result is returned as it was.
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        let location = Location::caller();
        self.inspect_err(|e| {
            tracing::error!(
                target: "subtracker_gateway",
                error = %e,
                at = %location,
                context = %context.to_string(),
                "Gateway step failed"
            );
        })
    }
}
