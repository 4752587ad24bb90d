mod locale;
mod models;
mod rating;
mod sorting;
mod validation;

pub use locale::Locale;
pub use models::{
    ExternalOrigin, ExternalReview, FileRef, Pagination, ProductInfo, Review, ReviewItem,
    ReviewPage, RichText, TextFormat, ANONYMOUS_NAME, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    MAX_RATING, MIN_RATING,
};
pub use rating::{ratio2, RatingSummary, StarBucket};
pub use sorting::{SortCatalog, SortDirection, SortField, SortOption};
pub use validation::{CreateResult, FieldError, ReviewInput, ValidReview};
