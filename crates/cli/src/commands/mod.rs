pub mod doctor;
pub mod onboard;
pub mod search;
