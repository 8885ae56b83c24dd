// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Legacy pset parsing and format detection under adversarial input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vlpset::binary::{decode_file, detect_format, FileFormat};

fuzz_target!(|data: &[u8]| {
    let detected = detect_format(data);

    if let Ok(loaded) = decode_file(data) {
        // A decoded file always came through the detected decoder
        assert_eq!(Some(loaded.format()), detected);

        // Legacy files hold at most one length
        if loaded.format() == FileFormat::Legacy {
            assert!(loaded.map().bucket_count() <= 1);
        }
    }
});
