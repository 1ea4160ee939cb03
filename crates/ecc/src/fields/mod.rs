pub mod field;
pub mod field_params;
