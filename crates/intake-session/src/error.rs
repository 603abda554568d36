use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The driver task has exited; the handle is no longer usable.
    #[error("session has shut down")]
    Closed,
}
