pub mod admin;
pub mod generate_timetable;
pub mod login;
pub mod wizard;
