// Performer creation from a profile URL
//
// Scraped data is untrusted: every field is read on its own, only the
// allow-listed ones survive, and malformed values are dropped instead of
// failing the whole record.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::catalog::{Catalog, CatalogId, NewPerformer, ScrapedPerformer};
use crate::constants::{DATE_PATTERN, GENDERS, PERFORMER_FIELDS};
use crate::error::{MapperError, Result};
use crate::report::Reporter;

/// Scrape `url` and create a performer from it.
///
/// With no scrape data, `name_override` alone is enough to create a minimal
/// `{name, url}` record. With neither, the performer is unresolvable.
pub fn create_performer_from_url(
    catalog: &dyn Catalog,
    url: &str,
    name_override: Option<&str>,
    reporter: &dyn Reporter,
) -> Result<(CatalogId, NewPerformer)> {
    let name_override = name_override.filter(|n| !n.trim().is_empty());

    let scraped = match catalog.scrape_performer_from_url(url) {
        Ok(data) => data.filter(|map| !map.is_empty()),
        Err(e) => {
            reporter.warn(&format!("scrape failed for {}: {}", url, e));
            None
        }
    };

    let record = match scraped {
        Some(map) => normalize_scraped(&map, url, name_override)?,
        None => match name_override {
            Some(name) => {
                reporter.debug(&format!("no scrape data for {}, creating from name", url));
                NewPerformer {
                    name: name.to_string(),
                    url: Some(url.to_string()),
                    ..Default::default()
                }
            }
            None => {
                return Err(MapperError::PerformerUnresolvable(format!(
                    "no scrape data and no name for {}",
                    url
                )))
            }
        },
    };

    let id = catalog.create_performer(&record)?;
    reporter.info(&format!("created performer {} ({}) from {}", record.name, id, url));
    Ok((id, record))
}

/// Reduce a raw scrape payload to a creatable performer record
pub fn normalize_scraped(
    scraped: &ScrapedPerformer,
    url: &str,
    name_override: Option<&str>,
) -> Result<NewPerformer> {
    let mut record = NewPerformer::default();

    for field in PERFORMER_FIELDS {
        let value = match field {
            "image" => first_image(scraped),
            _ => scraped.get(field).and_then(scalar_string),
        };
        let Some(value) = value else { continue };

        let value = match field {
            "gender" => normalize_gender(&value),
            "birthdate" | "death_date" => validate_date(&value),
            _ => Some(value),
        };
        if let Some(value) = value {
            set_field(&mut record, field, value);
        }
    }

    if let Some(name) = name_override {
        record.name = name.to_string();
    }
    if record.url.is_none() {
        record.url = Some(url.to_string());
    }
    if record.name.is_empty() {
        return Err(MapperError::PerformerUnresolvable(format!(
            "scraped data for {} has no name",
            url
        )));
    }

    Ok(record)
}

fn scalar_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_image(scraped: &ScrapedPerformer) -> Option<String> {
    scraped
        .get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(scalar_string)
        .or_else(|| scraped.get("image").and_then(scalar_string))
}

/// "Transgender Female" -> "TRANSGENDER_FEMALE"; unknown values are dropped
pub fn normalize_gender(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_uppercase().replace([' ', '-'], "_");
    if GENDERS.contains(&normalized.as_str()) {
        Some(normalized)
    } else {
        None
    }
}

/// Strict YYYY-MM-DD that is also a real calendar date
pub fn validate_date(raw: &str) -> Option<String> {
    let shape = Regex::new(DATE_PATTERN).ok()?;
    if !shape.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(raw.to_string())
}

fn set_field(record: &mut NewPerformer, field: &str, value: String) {
    let slot = match field {
        "name" => {
            record.name = value;
            return;
        }
        "url" => &mut record.url,
        "disambiguation" => &mut record.disambiguation,
        "gender" => &mut record.gender,
        "birthdate" => &mut record.birthdate,
        "death_date" => &mut record.death_date,
        "ethnicity" => &mut record.ethnicity,
        "country" => &mut record.country,
        "eye_color" => &mut record.eye_color,
        "hair_color" => &mut record.hair_color,
        "height" => &mut record.height,
        "weight" => &mut record.weight,
        "measurements" => &mut record.measurements,
        "fake_tits" => &mut record.fake_tits,
        "career_length" => &mut record.career_length,
        "tattoos" => &mut record.tattoos,
        "piercings" => &mut record.piercings,
        "aliases" => &mut record.aliases,
        "twitter" => &mut record.twitter,
        "instagram" => &mut record.instagram,
        "details" => &mut record.details,
        "image" => &mut record.image,
        _ => return,
    };
    *slot = Some(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LocalCatalog;
    use crate::report::testing::RecordingReporter;
    use serde_json::json;

    fn scraped(value: Value) -> ScrapedPerformer {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_normalize_allow_list_and_image() {
        let data = scraped(json!({
            "name": "Jane Doe",
            "gender": "female",
            "images": ["https://img/1.jpg", "https://img/2.jpg"],
            "height": 170,
            "favorite_color": "blue",
            "tags": [{"name": "x"}]
        }));
        let record = normalize_scraped(&data, "https://site/jane", None).unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.gender.as_deref(), Some("FEMALE"));
        assert_eq!(record.image.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(record.height.as_deref(), Some("170"));
        assert_eq!(record.url.as_deref(), Some("https://site/jane"));

        let serialized = serde_json::to_value(&record).unwrap();
        assert!(serialized.get("favorite_color").is_none());
        assert!(serialized.get("tags").is_none());
    }

    #[test]
    fn test_malformed_birthdate_dropped() {
        let data = scraped(json!({
            "name": "Jane Doe",
            "birthdate": "circa 1990",
            "death_date": "2021-02-30"
        }));
        let record = normalize_scraped(&data, "https://site/jane", None).unwrap();
        assert!(record.birthdate.is_none());
        assert!(record.death_date.is_none());

        let data = scraped(json!({ "name": "Jane Doe", "birthdate": "1990-04-12" }));
        let record = normalize_scraped(&data, "https://site/jane", None).unwrap();
        assert_eq!(record.birthdate.as_deref(), Some("1990-04-12"));
    }

    #[test]
    fn test_gender_normalization() {
        assert_eq!(normalize_gender("Transgender Female").as_deref(), Some("TRANSGENDER_FEMALE"));
        assert_eq!(normalize_gender("non-binary").as_deref(), Some("NON_BINARY"));
        assert_eq!(normalize_gender("MALE").as_deref(), Some("MALE"));
        assert!(normalize_gender("unknown").is_none());
    }

    #[test]
    fn test_name_override_wins() {
        let data = scraped(json!({ "name": "Scraped Name" }));
        let record = normalize_scraped(&data, "https://site/p", Some("Folder Name")).unwrap();
        assert_eq!(record.name, "Folder Name");
    }

    #[test]
    fn test_no_name_anywhere_is_unresolvable() {
        let data = scraped(json!({ "country": "US" }));
        let err = normalize_scraped(&data, "https://site/p", None).unwrap_err();
        assert!(matches!(err, MapperError::PerformerUnresolvable(_)));
    }

    #[test]
    fn test_create_without_scrape_uses_override() {
        let catalog = LocalCatalog::in_memory().unwrap();
        let reporter = RecordingReporter::default();

        let (id, record) =
            create_performer_from_url(&catalog, "https://site/p", Some("Jane"), &reporter).unwrap();
        assert_eq!(record.name, "Jane");
        let found = catalog.find_performer_by_url("https://site/p").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Jane");
    }

    #[test]
    fn test_create_without_scrape_or_name_fails() {
        let catalog = LocalCatalog::in_memory().unwrap();
        let reporter = RecordingReporter::default();

        let err = create_performer_from_url(&catalog, "https://site/p", None, &reporter).unwrap_err();
        assert!(matches!(err, MapperError::PerformerUnresolvable(_)));
        assert!(catalog.find_performer_by_url("https://site/p").unwrap().is_none());
    }
}
