pub mod capabilities;
pub mod description;
pub mod geo;
pub mod search;
