use std::fs;
use std::path::Path;

fn longest_hex_run(line: &str) -> usize {
    let mut best = 0usize;
    let mut current = 0usize;
    for c in line.chars() {
        if c.is_ascii_hexdigit() {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Fail CI if config files contain 64-hex private keys or obvious secrets.
#[test]
fn no_committed_hex_keys_in_configs() {
    let candidates = [
        "config.toml",
        "config.prod.toml",
        "config.dev.toml",
        "config.testnet.toml",
        "config.example.toml",
    ];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            if longest_hex_run(line) >= 64 {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}
