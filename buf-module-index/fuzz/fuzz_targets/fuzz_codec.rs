#![no_main]

use buf_module_index::codec::{KeyCodec, ModuleCoordinatesCodec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(module) = ModuleCoordinatesCodec.decode(data) {
        let bytes = ModuleCoordinatesCodec
            .encode(&module)
            .expect("decoded module must encode");
        assert_eq!(
            &bytes[..],
            &data[..bytes.len()],
            "re-encoding must reproduce the consumed prefix"
        );
    }
});
