use rayon::ThreadPoolBuildError;

#[derive(Debug, thiserror::Error)]
pub enum OtSenderError {
    /// The peer supplied bytes that do not decode to a group element.
    #[error("sender received an invalid point encoding")]
    InvalidPoint,

    #[error("sender requires at least one worker thread")]
    NoThreads,

    #[error("sender I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sender thread pool error: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

#[derive(Debug, thiserror::Error)]
pub enum OtReceiverError {
    /// The peer supplied bytes that do not decode to a group element.
    #[error("receiver received an invalid point encoding")]
    InvalidPoint,

    #[error("receiver requires at least one worker thread")]
    NoThreads,

    #[error("receiver I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("receiver thread pool error: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}
