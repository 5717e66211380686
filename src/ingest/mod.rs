pub mod categories;
pub mod importer;
pub mod records;
pub mod source;
