use crate::core::errors::LendingError;
use crate::core::models::{Review, User};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub fn validate_rating(rating: u8) -> Result<(), LendingError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(LendingError::invalid_input(
            "rating",
            "Invalid Rating",
            format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
        ));
    }
    Ok(())
}

/// Mean rating of the reviews addressed to `user_id`; 0.0 when there are none.
pub fn average_rating(user_id: &str, reviews: &[Review]) -> f64 {
    let (sum, count) = reviews
        .iter()
        .filter(|r| r.reviewed_user_id == user_id)
        .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r.rating), count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Replaces `user.rating` with the mean of the full review set.
pub fn recompute_rating(user: &mut User, reviews: &[Review]) -> f64 {
    user.rating = average_rating(&user.id, reviews);
    user.rating
}
