//! Nested records, pointers and raw identifiers.

use envi::{Config, Format, Tags};
use serde::{Deserialize, Serialize};

#[derive(Config, Default, Serialize, Deserialize)]
#[envi(serde)]
pub struct Database {
    #[envi(default = "5432")]
    pub port: i32,

    #[envi(default = "0.5")]
    pub ratio: f64,

    #[envi(default = "true")]
    pub tls: bool,
}

#[derive(Config, Default)]
pub struct App {
    #[envi(env = "APP_DB", default = "./db.json", type = "json")]
    pub db: Database,

    #[envi(env = "APP_BACKUP", default = "./backup.yaml")]
    pub backup: Option<Database>,

    #[envi(default = "boxed")]
    pub r#type: Box<String>,
}

fn main() {
    let mut app = App::default();
    let fields = Config::fields(&mut app);

    assert_eq!(fields[0].tags.format, Some("json"));
    assert_eq!(fields[2].name, "type");

    let tags = Tags {
        format: fields[0].tags.format,
        ..Tags::default()
    };
    assert_eq!(Format::from_tag("db", tags.format).ok(), Some(Format::Json));
}
