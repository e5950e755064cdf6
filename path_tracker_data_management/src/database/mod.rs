mod constants;
mod db;

pub use db::PathDatabase;
