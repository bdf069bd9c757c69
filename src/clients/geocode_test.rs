use super::*;
use crate::clients::http::decode;

fn search_body(json: &str) -> Result<Option<GeocodeHit>, ClientError> {
    decode::<Vec<Place>>(200, json).map(first_hit)
}

#[test]
fn parses_first_result() {
    let json = r#"[
        {"place_id": 1, "lat": "9.9312", "lon": "76.2673", "display_name": "Kochi, Kerala, India", "type": "city"},
        {"place_id": 2, "lat": "10.0", "lon": "76.0", "display_name": "Elsewhere"}
    ]"#;
    let hit = search_body(json).unwrap().unwrap();
    assert!((hit.lat - 9.9312).abs() < 1e-9);
    assert!((hit.lon - 76.2673).abs() < 1e-9);
    assert_eq!(hit.display_name, "Kochi, Kerala, India");
}

#[test]
fn empty_result_is_none() {
    assert!(search_body("[]").unwrap().is_none());
}

#[test]
fn skips_entries_with_unparseable_coordinates() {
    let json = r#"[
        {"lat": "north", "lon": "76.0", "display_name": "Broken"},
        {"lat": "10.5", "lon": "76.1", "display_name": "Thrissur"}
    ]"#;
    let hit = search_body(json).unwrap().unwrap();
    assert_eq!(hit.display_name, "Thrissur");
}

#[test]
fn non_array_body_is_parse_error() {
    let err = search_body(r#"{"error":"rate limited"}"#).unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}
