#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(once) = factura_pe::signature::canonicalize(s) {
            // Canonical form is a fixed point.
            let twice = factura_pe::signature::canonicalize(&once);
            assert_eq!(twice.as_deref().ok(), Some(once.as_str()));
        }
    }
});
