pub mod class_db;
