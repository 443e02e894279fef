/// terminal and file logging set up through simplelog
pub mod logging;
