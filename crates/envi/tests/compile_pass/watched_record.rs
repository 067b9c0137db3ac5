//! A watched record with change callbacks.

use envi::{ChangeObserver, Config, WatchError, Watched};
use serde::{Deserialize, Serialize};

#[derive(Config, Clone, Default, Serialize, Deserialize)]
#[envi(serde)]
pub struct Flags {
    #[envi(default = "false")]
    pub beta: bool,
}

impl ChangeObserver for Flags {
    fn on_change(&self) {
        println!("flags changed: beta={}", self.beta);
    }

    fn on_error(&self, error: &WatchError) {
        eprintln!("flags reload failed: {error}");
    }
}

#[derive(Config, Default)]
pub struct App {
    #[envi(env = "APP_FLAGS", default = "./flags.yaml", watch)]
    pub flags: Watched<Flags>,
}

fn main() {
    let app = App::default();
    let reader = app.flags.clone();

    assert!(!reader.read(|flags| flags.beta));
    assert_eq!(reader.epoch(), 0);
}
