pub mod application;
pub mod distribution;
pub mod entry_type;
pub mod purchase;
pub mod qr;
pub mod rating;
pub mod user;
pub mod venue;

pub use application::{ApplicationStatus, VenueApplication};
pub use distribution::{DistributionStatus, PaymentDistribution};
pub use entry_type::{DurationKind, EntryType};
pub use purchase::{Purchase, PurchaseLine, PurchaseStatus};
pub use qr::{QrCode, ScanLog};
pub use rating::Rating;
pub use user::{Role, User};
pub use venue::{SubscriptionPlan, SubscriptionState, Venue, VenuePhoto};
