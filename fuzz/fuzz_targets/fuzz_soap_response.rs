#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Replies come from the network: errors are expected, panics are bugs.
        let _ = factura_pe::soap::decode_envelope(s);
        let _ = factura_pe::soap::parse_send_bill(s);
        let _ = factura_pe::soap::parse_send_summary(s);
        let _ = factura_pe::soap::parse_get_status(s);
    }
});
