// Metadata Mapper Constants

// Mapping files
pub const DEFAULT_MAPPING_FILENAME: &str = "mapping.yaml";
pub const TEMP_FILE_PREFIX: &str = ".mapping-";

// Extensions that are never primary media entries (sidecar images, text, metadata)
pub const SKIP_EXTENSIONS: [&str; 5] = ["jpg", "txt", "json", "yml", "yaml"];

// Filename parsing
// Default layout: "Studio - Performer1, Performer2 - Title - YYYY-MM-DD"
pub const DEFAULT_FILENAME_PATTERN: &str = r"(?P<studio>.+?)\s+-\s+(?P<performers>.+?)\s+-\s+(?P<title>.+?)(?:\s+-\s+(?P<date>\d{4}-\d{2}-\d{2}))?";
pub const PERFORMER_DELIMITER: char = ',';

// Export layout
pub const EXPORT_MANIFEST: &str = "mappings.json";
pub const EXPORT_SCENES_PREFIX: &str = "scenes/";

// Performer creation: fields forwarded from scraped data
pub const PERFORMER_FIELDS: [&str; 22] = [
    "name", "url", "disambiguation", "gender", "birthdate", "death_date",
    "ethnicity", "country", "eye_color", "hair_color", "height", "weight",
    "measurements", "fake_tits", "career_length", "tattoos", "piercings",
    "aliases", "twitter", "instagram", "details", "image",
];

// Catalog gender values (upper snake case)
pub const GENDERS: [&str; 6] = [
    "MALE", "FEMALE", "TRANSGENDER_MALE", "TRANSGENDER_FEMALE", "INTERSEX", "NON_BINARY",
];

// Strict date shape for scraped dates
pub const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

// Configuration
pub const CONFIG_APP_NAME: &str = "metadata-mapper";
pub const CONFIG_FILENAME: &str = "config.json";
pub const ENV_DB_PATH: &str = "MAPPER_DB_PATH";
pub const ENV_SERVER_URL: &str = "MAPPER_SERVER_URL";
pub const ENV_API_KEY: &str = "MAPPER_API_KEY";
pub const ENV_LOG_LEVEL: &str = "MAPPER_LOG_LEVEL";

// Remote catalog
pub const GRAPHQL_PATH: &str = "/graphql";
pub const HTTP_TIMEOUT_SECS: u64 = 60;
