#![no_main]

use cobranza::core::*;
use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;

fuzz_target!(|data: (i64, u32, i64, u32, i64, &str, &str)| {
    let (rate, rate_scale, area, area_scale, tax, unit, code) = data;
    let (Ok(rate), Ok(area)) = (
        Decimal::try_new(rate, rate_scale % 29),
        Decimal::try_new(area, area_scale % 29),
    ) else {
        return;
    };

    let property = PropertyBuilder::new(1, "fuzz", area)
        .area(AreaKind::Parking, area)
        .build();
    let service = ServiceBuilder::new(1, code, rate)
        .unit(unit)
        .tax(Decimal::new(tax, 4))
        .build();

    // Errors are fine, panics are bugs.
    if let Ok(charge) = resolve_and_compute(&property, Some(&service), None) {
        assert_eq!(charge.total, round2(charge.subtotal + charge.tax));
    }
});
