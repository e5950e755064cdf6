#![allow(dead_code)]

pub const PATHS_TABLE_NAME: &str = "Paths";
pub const PATH_ID: &str = "path_id";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const START_TIME: &str = "start_time";
pub const END_TIME: &str = "end_time";
pub const TOTAL_DISTANCE: &str = "total_distance";
pub const AVERAGE_SPEED: &str = "average_speed";
pub const RATING: &str = "rating";
pub const COMPLETED: &str = "completed";
pub const CREATED_AT: &str = "created_at";

pub const PATH_POINTS_TABLE_NAME: &str = "PathPoints";
pub const POINT_ID: &str = "point_id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const ALTITUDE: &str = "altitude";
pub const TIMESTAMP: &str = "timestamp";
pub const ACCURACY: &str = "accuracy";

pub const PHOTOS_TABLE_NAME: &str = "Photos";
pub const PHOTO_ID: &str = "photo_id";
pub const FILE_PATH: &str = "file_path";
pub const CAPTION: &str = "caption";

pub const COMMENTS_TABLE_NAME: &str = "Comments";
pub const COMMENT_ID: &str = "comment_id";
pub const BODY: &str = "body";
