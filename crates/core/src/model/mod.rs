mod card;
mod ids;
mod recommendation;
mod review;
mod session;

pub use ids::{CardId, ParseIdError, SessionId, UserId};

pub use card::{Card, CardError, EnhancedCard, SpacedRepetitionState};
pub use recommendation::{PerformanceReport, StudyRecommendation};
pub use review::ReviewClassification;
pub use session::{ActiveSession, CardOutcome, FinishedSession, StudySession, StudySessionError};
