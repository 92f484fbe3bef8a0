pub mod geo;
pub mod observation;
pub mod series;
pub mod time_window;
pub mod units;
