pub mod comment;
pub mod fix;
pub mod geo;
pub mod kml;
pub mod path;
pub mod path_point;
pub mod photo;
