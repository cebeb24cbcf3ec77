pub const VAT_RATE: f64 = 0.16;

/// Round to cents. Exact halves go to the even cent.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Derive a `(base16, vat16)` pair from whatever figures a row carries.
///
/// Rate-tagged figures win over subtotal/VAT pairs, which win over a lone VAT
/// figure, which wins over splitting a VAT-inclusive total. Every branch is
/// rounded to cents.
pub fn complete_vat(base16: f64, vat16: f64, total: f64, subtotal: f64, loose_vat: f64) -> (f64, f64) {
    if base16 != 0.0 || vat16 != 0.0 {
        let base = if base16 != 0.0 { base16 } else { vat16 / VAT_RATE };
        let vat = if vat16 != 0.0 { vat16 } else { base16 * VAT_RATE };
        return (round2(base), round2(vat));
    }
    if subtotal != 0.0 && loose_vat != 0.0 {
        return (round2(subtotal), round2(loose_vat));
    }
    if loose_vat != 0.0 {
        return (round2(loose_vat / VAT_RATE), round2(loose_vat));
    }
    if total != 0.0 {
        let base = total / (1.0 + VAT_RATE);
        return (round2(base), round2(total - base));
    }
    (0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_only_fills_vat() {
        assert_eq!(complete_vat(16.0, 0.0, 0.0, 0.0, 0.0), (16.0, 2.56));
    }

    #[test]
    fn test_vat_only_fills_base() {
        assert_eq!(complete_vat(0.0, 2.56, 0.0, 0.0, 0.0), (16.0, 2.56));
    }

    #[test]
    fn test_both_rate_figures_kept() {
        assert_eq!(complete_vat(100.0, 15.0, 999.0, 50.0, 8.0), (100.0, 15.0));
    }

    #[test]
    fn test_total_is_split() {
        assert_eq!(complete_vat(0.0, 0.0, 116.0, 0.0, 0.0), (100.0, 16.0));
        assert_eq!(complete_vat(0.0, 0.0, 1160.0, 0.0, 0.0), (1000.0, 160.0));
    }

    #[test]
    fn test_subtotal_and_loose_vat() {
        assert_eq!(complete_vat(0.0, 0.0, 0.0, 100.0, 16.0), (100.0, 16.0));
        // Beats the total split.
        assert_eq!(complete_vat(0.0, 0.0, 500.0, 100.0, 16.0), (100.0, 16.0));
    }

    #[test]
    fn test_loose_vat_only() {
        assert_eq!(complete_vat(0.0, 0.0, 0.0, 0.0, 16.0), (100.0, 16.0));
        // Subtotal without VAT falls through to the total.
        assert_eq!(complete_vat(0.0, 0.0, 116.0, 90.0, 0.0), (100.0, 16.0));
    }

    #[test]
    fn test_nothing_present() {
        assert_eq!(complete_vat(0.0, 0.0, 0.0, 0.0, 0.0), (0.0, 0.0));
        assert_eq!(complete_vat(0.0, 0.0, 0.0, 100.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.555_000_1), 2.56);
        assert_eq!(round2(-1.004), -1.0);
    }

    #[test]
    fn test_round2_halves_go_to_even_cent() {
        assert_eq!(round2(10.125), 10.12);
        assert_eq!(round2(10.375), 10.38);
        assert_eq!(round2(-0.125), -0.12);
    }
}
