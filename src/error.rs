use thiserror::Error;

pub const EXIT_FAILED: u8 = 1;
pub const EXIT_FAILED_NO_TERMINAL: u8 = 2;
pub const EXIT_FAILED_BUCKET_LISTING: u8 = 3;

/// Conditions the browser core reports upward instead of crashing the render loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Please expand the height of your terminal")]
    TerminalTooSmall,

    #[error("Listing unavailable: {0}")]
    ListingUnavailable(String),
}

impl BrowserError {
    pub fn listing(err: &anyhow::Error) -> Self {
        Self::ListingUnavailable(format!("{err:#}"))
    }
}
