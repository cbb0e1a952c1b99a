pub mod movie;
pub mod showtime;
pub mod seat;
pub mod booking;
pub mod payment;
pub mod user;

pub use movie::{Movie, NewMovie};
pub use showtime::{ScheduledShowtime, Showtime};
pub use seat::Seat;
pub use booking::Booking;
pub use payment::{Payment, PaymentStatus};
pub use user::{NewUser, User, UserRole};
