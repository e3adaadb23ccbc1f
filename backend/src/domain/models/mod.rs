pub mod actor;
pub mod birth_record;
