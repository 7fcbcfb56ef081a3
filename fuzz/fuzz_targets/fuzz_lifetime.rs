#![no_main]
use libfuzzer_sys::fuzz_target;
use rpcheck_model::RemainingLifetime;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(life) = s.parse::<RemainingLifetime>() {
            assert!(life >= RemainingLifetime::zero());
            assert!(life <= RemainingLifetime::one());
            assert_eq!(life.to_string().parse::<RemainingLifetime>(), Ok(life));
        }
    }
});
