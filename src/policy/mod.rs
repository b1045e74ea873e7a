pub mod clock;
pub mod multi_clock;
pub mod o1;
