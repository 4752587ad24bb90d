use adapter::ImportJob;
use service::{ListingComposer, RatingAggregator, ReviewCreator};
use storage::Db;

use crate::auth::UserTokens;
use crate::pow::PowGuard;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub listing: ListingComposer,
    pub ratings: RatingAggregator,
    pub creator: ReviewCreator,
    pub import: ImportJob,
    pub pow: PowGuard,
    pub tokens: UserTokens,
    pub admin_token: String,
}
