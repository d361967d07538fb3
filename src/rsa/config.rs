use lazy_static::lazy_static;
use crate::rsa::{RunMode, RSA};

lazy_static! {
    pub static ref CONFIG_DEF: RSA = RSA {
        mode: RunMode::Generate,
        bits: 256,
        rounds: 50,
        public: String::from("rsa.pub"),
        private: String::from("rsa.priv"),
        input: String::from("stdin"),
        output: String::from("stdout"),
        seed: None,
        user: None,
        verbose: false,
    };
}
