use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("domain is required")]
    MissingDomain,

    #[error("code is required")]
    MissingCode,

    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    #[error("{0} is out of range")]
    AmountOutOfRange(&'static str),
}
