#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlsorter::XmlSorter;

fuzz_target!(|data: &[u8]| {
    let sorter = XmlSorter::new();
    // Sorting must never panic, and anything it accepts must be a fixed point.
    if let Ok(sorted) = sorter.sort_bytes(data) {
        let resorted = sorter
            .sort_str(&sorted)
            .unwrap_or_else(|e| panic!("sorted output failed to re-sort: {e}\n{sorted}"));
        assert_eq!(sorted, resorted, "sorting is not idempotent");
    }
});
