use std::fmt;

pub mod detail;
pub mod listing;

pub use detail::{DetailScreen, DetailView, PurchaseButton, PurchaseOutcome};
pub use listing::{Draft, DraftError, DraftField, DraftImage, ListingScreen, ListingView, SubmitOutcome};

/// Which view a screen renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Loading => write!(f, "Loading..."),
            Phase::Ready => write!(f, "Ready"),
            Phase::Failed => write!(f, "Could not load this page. Try again."),
        }
    }
}
