pub mod csv;
pub mod text;
pub mod wfdb;
