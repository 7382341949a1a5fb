use thiserror::Error;

/// A route pattern that can't be compiled.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("unknown placeholder {{{placeholder}}} in route {pattern}, expect {{int}} or {{string}}")]
    UnknownPlaceholder { pattern: String, placeholder: String },

    #[error("unclosed placeholder in route {pattern}")]
    UnclosedPlaceholder { pattern: String },

    #[error("invalid route {pattern}: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
}
