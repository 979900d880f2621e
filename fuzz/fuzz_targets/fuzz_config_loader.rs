#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing of Config must never panic; invalid input may be rejected
    // by the parser or by validate(), but always gracefully.
    if let Ok(cfg) = toml::from_str::<winch_config::Config>(data) {
        let _ = cfg.validate();
    }
});
