pub mod record_mapper;
