use thiserror::Error;

/// Conditions surfaced by the tracker. None of them is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Unrecognized video URL: {url:?}")]
    UnrecognizedSource { url: String },
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable { backend: Backend, reason: String },
    #[error("{backend} query failed: {reason}")]
    TransientQueryFailure { backend: Backend, reason: String },
}

impl TrackerError {
    pub(crate) fn unavailable(backend: Backend, reason: impl Into<String>) -> Self {
        TrackerError::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    pub(crate) fn query_failed(backend: Backend, err: &anyhow::Error) -> Self {
        TrackerError::TransientQueryFailure {
            backend,
            reason: format!("{:#}", err),
        }
    }
}

/// The external player family an adapter binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Youtube,
    Vimeo,
    MediaElement,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Backend::Youtube => "YouTube",
            Backend::Vimeo => "Vimeo",
            Backend::MediaElement => "Media element",
        };
        f.write_str(name)
    }
}
