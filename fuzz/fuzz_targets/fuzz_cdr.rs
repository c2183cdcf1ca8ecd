#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = factura_pe::soap::read_cdr(data);
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = factura_pe::soap::parse_cdr_xml(s);
    }
});
