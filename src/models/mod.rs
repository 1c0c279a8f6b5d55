pub mod user;
pub mod organizer;
pub mod venue;
pub mod event;
pub mod ticket;
pub mod attendee;

pub use user::User;
pub use organizer::Organizer;
pub use venue::Venue;
pub use event::Event;
pub use ticket::Ticket;
pub use attendee::Attendee;
