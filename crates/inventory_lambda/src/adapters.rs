pub mod alerts;
pub mod aws;
pub mod object_source;
pub mod table;
