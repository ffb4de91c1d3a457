pub mod bottom_bar;
pub mod detail;
pub mod grid;
pub mod top;
pub mod util;
