#![no_main]

use rasterkit::engine::decode_bytes;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    if let Ok(buf) = decode_bytes(data) {
        assert!(matches!(buf.channels(), 1 | 3 | 4));
        assert_eq!(
            buf.size_bytes(),
            buf.width() as usize * buf.height() as usize * buf.channels()
        );
    }
});
