pub mod event;
pub mod participant;
pub mod user;

pub use event::{Event, EventStatus};
pub use participant::{Participant, PaymentMethod, PaymentStatus};
pub use user::User;
