#![no_main]

use buffer::ByteReader;
use libfuzzer_sys::fuzz_target;
use pattern::{decode_announcement, PatternBank, PatternExchange};

fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data);
    if let Ok(announcement) = decode_announcement(&mut reader) {
        let mut bank = PatternBank::new();
        let _ = bank.register("SyncSnapshot");
        let exchange = PatternExchange::from_announcement(&bank, &announcement);
        for (id, _) in &announcement.entries {
            let _ = exchange.origin_id(*id);
        }
    }
});
