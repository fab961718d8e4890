//! Build-time configuration.
//!
//! Values are read from the environment of the build with `option_env!`, so a
//! firmware image carries them as constants:
//!
//! | variable | constant | default |
//! |----------|----------|---------|
//! | `EMBCOV_OUTPUT_FILE` | [`OUTPUT_FILE`] | `gcov_output.bin` |
//! | `EMBCOV_OUTPUT_BASE` | [`OUTPUT_BASE`] | `0x42000000` |
//! | `EMBCOV_OUTPUT_SIZE` | [`OUTPUT_SIZE`] | `0x100000` |
//!
//! A malformed address or size fails the build.

/// Path written by the file sink.
pub const OUTPUT_FILE: &str = match option_env!("EMBCOV_OUTPUT_FILE") {
    Some(path) => path,
    None => "gcov_output.bin",
};

/// Start address of the memory block the memory sink writes to.
pub const OUTPUT_BASE: usize = match option_env!("EMBCOV_OUTPUT_BASE") {
    Some(base) => parse_hex(base),
    None => 0x4200_0000,
};

/// Size in bytes of the memory block.
pub const OUTPUT_SIZE: usize = match option_env!("EMBCOV_OUTPUT_SIZE") {
    Some(size) => parse_hex(size),
    None => 0x10_0000,
};

/// Descriptors the fixed registry pool can hold.
pub const POOL_ENTRIES: usize = 100;

/// Words of the shared scratch buffer used without a heap.
pub const SCRATCH_WORDS: usize = 8192;

/// Parses a hexadecimal number, with or without `0x` prefix, at compile time.
pub const fn parse_hex(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if bytes.len() > 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        i = 2;
    }
    assert!(i < bytes.len(), "empty hex number");

    let mut value: usize = 0;
    while i < bytes.len() {
        let digit = match bytes[i] {
            b'0'..=b'9' => bytes[i] - b'0',
            b'a'..=b'f' => bytes[i] - b'a' + 10,
            b'A'..=b'F' => bytes[i] - b'A' + 10,
            b'_' => {
                i += 1;
                continue;
            }
            _ => panic!("invalid hex digit"),
        };
        value = value * 16 + digit as usize;
        i += 1;
    }
    value
}
