//! Fixed broker topic set.

/// Topics the relay subscribes to for its whole lifetime.
///
/// Re-subscription after a reconnect always re-creates exactly this list.
pub const RELAY_TOPICS: &[&str] = &[
    "user.created",
    "user.deleted",
    "product.created",
    "product.deleted",
    "review.created",
    "transaction.created",
];
