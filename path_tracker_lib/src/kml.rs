//! KML document generation for recorded paths.
//!
//! The output is a plain string template: header with a CDATA summary, five
//! fixed style blocks, one LineString for the walked route with start/end
//! markers, then one point placemark per photo and per located comment.
//! Serialization is deterministic for identical inputs.

use chrono::{DateTime, Local, Utc};

use crate::{comment::Comment, path::Path, path_point::PathPoint, photo::Photo};

pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// File name for an exported document: `path_<name>_<millis>.kml` with
/// spaces in the name replaced by underscores.
pub fn export_file_name(path_name: &str, exported_at_millis: i64) -> String {
    format!("path_{}_{}.kml", path_name.replace(' ', "_"), exported_at_millis)
}

/// Escapes the five XML special characters. `&` goes first so already
/// produced entities are never escaped again.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

const STYLE_BLOCKS: &str = r#"    <Style id="pathStyle">
      <LineStyle>
        <color>ff0000ff</color>
        <width>4</width>
      </LineStyle>
    </Style>
    <Style id="photoStyle">
      <IconStyle>
        <Icon>
          <href>http://maps.google.com/mapfiles/kml/shapes/camera.png</href>
        </Icon>
        <scale>1.2</scale>
      </IconStyle>
    </Style>
    <Style id="commentStyle">
      <IconStyle>
        <Icon>
          <href>http://maps.google.com/mapfiles/kml/shapes/info-i.png</href>
        </Icon>
        <scale>1.0</scale>
      </IconStyle>
    </Style>
    <Style id="startStyle">
      <IconStyle>
        <Icon>
          <href>http://maps.google.com/mapfiles/kml/shapes/flag.png</href>
        </Icon>
        <scale>1.3</scale>
      </IconStyle>
    </Style>
    <Style id="endStyle">
      <IconStyle>
        <Icon>
          <href>http://maps.google.com/mapfiles/kml/shapes/checkered_flag.png</href>
        </Icon>
        <scale>1.3</scale>
      </IconStyle>
    </Style>
"#;

/// Serializes a path and its records into a complete KML document.
///
/// Points must be in timestamp order; the store's read API already
/// guarantees that. Comments without a location are left off the map.
pub fn path_document(path: &Path, points: &[PathPoint], photos: &[Photo], comments: &[Comment]) -> String {
    let start_date = format_timestamp(path.start_time);
    let end_date = match path.end_time {
        Some(end_time) => format_timestamp(end_time),
        None => "In Progress".to_string(),
    };

    let mut doc = String::new();

    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    doc.push_str("  <Document>\n");
    doc.push_str(&format!("    <name>{}</name>\n", escape_xml(&path.name)));
    doc.push_str("    <description><![CDATA[\n");
    doc.push_str("      <h3>Path Details</h3>\n");
    doc.push_str(&format!("      <p><strong>Description:</strong> {}</p>\n", escape_xml(&path.description)));
    doc.push_str(&format!("      <p><strong>Start Time:</strong> {start_date}</p>\n"));
    doc.push_str(&format!("      <p><strong>End Time:</strong> {end_date}</p>\n"));
    doc.push_str(&format!("      <p><strong>Distance:</strong> {:.2} km</p>\n", path.total_distance));
    doc.push_str(&format!("      <p><strong>Average Speed:</strong> {:.2} km/h</p>\n", path.average_speed));
    doc.push_str(&format!("      <p><strong>Rating:</strong> {}/5.0</p>\n", path.rating));
    doc.push_str("    ]]></description>\n");
    doc.push_str(STYLE_BLOCKS);

    if !points.is_empty() {
        doc.push_str("    <Placemark>\n");
        doc.push_str("      <name>Walking Path</name>\n");
        doc.push_str("      <description>GPS tracked walking route</description>\n");
        doc.push_str("      <styleUrl>#pathStyle</styleUrl>\n");
        doc.push_str("      <LineString>\n");
        doc.push_str("        <tessellate>1</tessellate>\n");
        doc.push_str("        <coordinates>\n");
        for point in points {
            doc.push_str(&format!("{},{},{}\n", point.longitude, point.latitude, point.altitude));
        }
        doc.push_str("        </coordinates>\n");
        doc.push_str("      </LineString>\n");
        doc.push_str("    </Placemark>\n");

        // first()/last() are safe, the slice is non-empty here
        let start_point = &points[0];
        let end_point = &points[points.len() - 1];
        doc.push_str(&point_placemark(
            "Start",
            &format!("Path starting point - {}", format_timestamp(start_point.timestamp)),
            "startStyle",
            start_point.longitude,
            start_point.latitude,
            start_point.altitude,
        ));
        doc.push_str(&point_placemark(
            "End",
            &format!("Path ending point - {}", format_timestamp(end_point.timestamp)),
            "endStyle",
            end_point.longitude,
            end_point.latitude,
            end_point.altitude,
        ));
    }

    for photo in photos {
        doc.push_str("    <Placemark>\n");
        doc.push_str("      <name>Photo</name>\n");
        doc.push_str("      <description><![CDATA[\n");
        doc.push_str("        <h3>Photo Location</h3>\n");
        doc.push_str(&format!("        <p><strong>Caption:</strong> {}</p>\n", escape_xml(&photo.caption)));
        doc.push_str(&format!("        <p><strong>Time:</strong> {}</p>\n", format_timestamp(photo.timestamp)));
        doc.push_str(&format!("        <p><strong>Location:</strong> {:.6}, {:.6}</p>\n", photo.latitude, photo.longitude));
        doc.push_str("      ]]></description>\n");
        doc.push_str("      <styleUrl>#photoStyle</styleUrl>\n");
        doc.push_str("      <Point>\n");
        doc.push_str(&format!("        <coordinates>{},{},0</coordinates>\n", photo.longitude, photo.latitude));
        doc.push_str("      </Point>\n");
        doc.push_str("    </Placemark>\n");
    }

    for comment in comments {
        let Some((latitude, longitude)) = comment.location() else {
            // No position was available when the comment was taken; it still
            // exists in the store, it just has no placemark.
            continue;
        };

        doc.push_str("    <Placemark>\n");
        doc.push_str("      <name>Comment</name>\n");
        doc.push_str("      <description><![CDATA[\n");
        doc.push_str("        <h3>User Comment</h3>\n");
        doc.push_str(&format!("        <p>{}</p>\n", escape_xml(&comment.body)));
        doc.push_str(&format!("        <p><strong>Time:</strong> {}</p>\n", format_timestamp(comment.timestamp)));
        doc.push_str(&format!("        <p><strong>Location:</strong> {latitude:.6}, {longitude:.6}</p>\n"));
        doc.push_str("      ]]></description>\n");
        doc.push_str("      <styleUrl>#commentStyle</styleUrl>\n");
        doc.push_str("      <Point>\n");
        doc.push_str(&format!("        <coordinates>{longitude},{latitude},0</coordinates>\n"));
        doc.push_str("      </Point>\n");
        doc.push_str("    </Placemark>\n");
    }

    doc.push_str("  </Document>\n");
    doc.push_str("</kml>\n");

    doc
}

fn point_placemark(name: &str, description: &str, style: &str, lon: f64, lat: f64, alt: f64) -> String {
    let mut placemark = String::new();
    placemark.push_str("    <Placemark>\n");
    placemark.push_str(&format!("      <name>{name}</name>\n"));
    placemark.push_str(&format!("      <description>{description}</description>\n"));
    placemark.push_str(&format!("      <styleUrl>#{style}</styleUrl>\n"));
    placemark.push_str("      <Point>\n");
    placemark.push_str(&format!("        <coordinates>{lon},{lat},{alt}</coordinates>\n"));
    placemark.push_str("      </Point>\n");
    placemark.push_str("    </Placemark>\n");
    placemark
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Fix;

    fn test_path(end_time: Option<DateTime<Utc>>) -> Path {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Path {
            path_id: 1,
            name: "Morning Walk".into(),
            description: "Around the lake".into(),
            start_time: start,
            end_time,
            total_distance: 5.0,
            average_speed: 4.2,
            rating: 4.5,
            completed: end_time.is_some(),
            created_at: start,
        }
    }

    fn test_points(count: usize) -> Vec<PathPoint> {
        (0..count)
            .map(|i| {
                let fix = Fix::new(
                    56.0 + i as f64 * 0.001,
                    10.0,
                    12.0,
                    5.0,
                    DateTime::from_timestamp(1_700_000_000 + i as i64, 0).unwrap(),
                );
                PathPoint::new(i as i64, 1, &fix)
            })
            .collect()
    }

    #[test]
    fn placemark_counts_match_record_counts() {
        let path = test_path(Some(DateTime::from_timestamp(1_700_003_600, 0).unwrap()));
        let points = test_points(4);
        let photos = vec![Photo {
            photo_id: 1,
            path_id: 1,
            latitude: 56.0,
            longitude: 10.0,
            file_path: "/photos/1.jpg".into(),
            caption: "lake".into(),
            timestamp: path.start_time,
        }];
        let comments = vec![
            Comment::new(1, 1, Some((56.0, 10.0)), "nice spot".into(), path.start_time),
            Comment::new(2, 1, None, "no gps here".into(), path.start_time),
        ];

        let doc = path_document(&path, &points, &photos, &comments);

        // route line + start + end + 1 photo + 1 located comment
        assert_eq!(doc.matches("<Placemark>").count(), 5);
        assert_eq!(doc.matches("<LineString>").count(), 1);
        assert_eq!(doc.matches("#startStyle").count(), 1);
        assert_eq!(doc.matches("#endStyle").count(), 1);
        assert_eq!(doc.matches("#photoStyle").count(), 1);
        assert_eq!(doc.matches("#commentStyle").count(), 1);
        assert!(!doc.contains("no gps here"));

        // one coordinate triple per point inside the LineString
        let coords = doc.split("<coordinates>\n").nth(1).unwrap();
        let coords = coords.split("        </coordinates>").next().unwrap();
        assert_eq!(coords.lines().count(), 4);
    }

    #[test]
    fn empty_path_has_no_route_placemarks() {
        let path = test_path(None);
        let doc = path_document(&path, &[], &[], &[]);

        assert_eq!(doc.matches("<Placemark>").count(), 0);
        assert_eq!(doc.matches("<LineString>").count(), 0);
        assert!(doc.contains("In Progress"));
    }

    #[test]
    fn document_summary_is_formatted() {
        let path = test_path(Some(DateTime::from_timestamp(1_700_003_600, 0).unwrap()));
        let doc = path_document(&path, &[], &[], &[]);

        assert!(doc.contains("<name>Morning Walk</name>"));
        assert!(doc.contains("<strong>Distance:</strong> 5.00 km"));
        assert!(doc.contains("<strong>Average Speed:</strong> 4.20 km/h"));
        assert!(doc.contains("<strong>Rating:</strong> 4.5/5.0"));
        assert!(!doc.contains("In Progress"));
    }

    #[test]
    fn special_characters_are_escaped_once() {
        assert_eq!(escape_xml("&<>\"'"), "&amp;&lt;&gt;&quot;&apos;");
        assert_eq!(escape_xml("fish & chips"), "fish &amp; chips");
        // already produced entities stay intact
        assert!(!escape_xml("a & b").contains("&amp;amp;"));

        let mut path = test_path(None);
        path.name = "Tom & Jerry's <walk>".into();
        let doc = path_document(&path, &[], &[], &[]);
        assert!(doc.contains("<name>Tom &amp; Jerry&apos;s &lt;walk&gt;</name>"));
    }

    #[test]
    fn serialization_is_deterministic() {
        let path = test_path(Some(DateTime::from_timestamp(1_700_003_600, 0).unwrap()));
        let points = test_points(3);
        let first = path_document(&path, &points, &[], &[]);
        let second = path_document(&path, &points, &[], &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn export_file_name_convention() {
        assert_eq!(export_file_name("Morning Walk", 1234), "path_Morning_Walk_1234.kml");
        assert_eq!(export_file_name("trail", 9), "path_trail_9.kml");
    }
}
