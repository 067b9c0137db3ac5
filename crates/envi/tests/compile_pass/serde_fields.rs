//! Serde-only field types and skipped foreign types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use envi::{Config, Kind};
use serde::{Deserialize, Serialize};

#[derive(Config, Default, Serialize, Deserialize)]
#[envi(serde)]
pub struct Storage {
    pub root: PathBuf,
    pub timeout: Duration,
    pub quota: u128,
    pub offset: i128,

    #[envi(skip)]
    pub listen: Option<SocketAddr>,
}

fn main() {
    let mut storage = Storage::default();
    assert_eq!(Config::fields(&mut storage).len(), 4);
    assert!(Kind::is_zero(&storage));

    storage.root.push("/srv");
    assert!(!Kind::is_zero(&storage));
}
