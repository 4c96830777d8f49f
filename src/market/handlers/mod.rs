pub mod postgres_handler;
