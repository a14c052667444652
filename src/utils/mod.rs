pub mod archive;
pub mod hidden;
pub mod http;
pub mod path_validator;
