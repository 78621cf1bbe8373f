pub mod output;
pub mod parser;
pub mod plot;
pub mod trend;
