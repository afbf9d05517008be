pub mod checks;
pub mod converters;
pub mod wizard;
