//! Scalar fields, defaults and required markers.

use envi::{Config, Kind};

#[derive(Config, Default)]
pub struct Server {
    #[envi(env = "SERVER_HOST", default = "localhost", required)]
    pub host: String,

    #[envi(env = "SERVER_NAME")]
    pub name: String,

    #[envi(skip)]
    pub scratch: String,

    // private fields are not loaded
    cache: Vec<u8>,
}

fn main() {
    let mut server = Server::default();
    let fields = Config::fields(&mut server);

    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "host");
    assert!(fields[0].tags.required);
    assert_eq!(fields[1].tags.default, None);
    assert_eq!(Config::type_name(&server), "Server");
    assert!(Kind::is_zero(&server));
    assert!(server.cache.is_empty());
}
