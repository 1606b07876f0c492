#![no_main]

use buf_module_index::codec::{KeyCodec, ModuleCoordinatesCodec};
use buf_module_index::document::FileContent;
use buf_module_index::index::{BufModuleIndex, FileIndexExtension};
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

const LOCATION: &str = "file:///fuzz/buf.lock";

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let index = BufModuleIndex::new();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let file = FileContent::from_text(Some(LOCATION.to_string()), "buf.lock", content);
            index.index(&file)
        }));

        if let Ok(modules) = result {
            for module in modules.keys() {
                assert!(module.validate().is_ok(), "extracted module must be complete");
                assert_eq!(
                    module.lock_file_location, LOCATION,
                    "module must carry the lock file location"
                );

                let bytes = ModuleCoordinatesCodec
                    .encode(module)
                    .expect("extracted module must encode");
                let decoded = ModuleCoordinatesCodec
                    .decode(&bytes)
                    .expect("encoded module must decode");
                assert_eq!(&decoded, module, "codec must round-trip");
            }
        }
    }
});
