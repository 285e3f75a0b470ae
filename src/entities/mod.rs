pub mod booking;
pub mod booking_detail;
pub mod equipment;
pub mod facility;
