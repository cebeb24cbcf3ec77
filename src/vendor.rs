use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_rfc, r"(?i)^[A-Z&Ñ]{3,4}\d{6}[A-Z0-9]{2,3}$");
re!(re_folio, r"(?i)\b(F-?|FOLIO|FACT(URA)?|#)\b");

// Legal-entity suffixes, matched against lowercased ASCII text in this order.
const ENTITY_TOKENS: &[&str] = &[
    " s.a.",
    " sa ",
    " s.a",
    " de ",
    " c.v",
    " c. v",
    " s. de r.l",
    " s de rl",
    " s de r l",
    " s. de r. l.",
];

const SEPARATORS: &[char] = &[',', '.', '-', '_', '/', '&', '(', ')'];

fn normalize_pass(text: &str) -> String {
    let mut s = text.to_string();
    for token in ENTITY_TOKENS {
        s = s.replace(token, " ");
    }
    let s = s.replace(SEPARATORS, " ");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical comparison form of a vendor name: lowercase ASCII with legal
/// suffixes and punctuation removed. Used for alias lookup and grouping keys.
///
/// A single replacement pass can expose a new suffix (`"a sa sa b"`), so passes
/// repeat until the text stops changing. That keeps the result a fixed point.
pub fn normalize_name(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(char::is_ascii)
        .collect();
    let mut current = normalize_pass(&folded);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// True when `token` has the shape of an RFC (3-4 letters, 6 digits, 2-3 alphanumerics).
pub fn is_rfc_shape(token: &str) -> bool {
    re_rfc().is_match(token)
}

/// Best-effort identity pulled out of a free-text vendor cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorIdentity {
    /// Uppercased RFC when the cell starts with one, else empty.
    pub rfc: String,
    pub name: String,
    /// The RFC if present, else the normalized name.
    pub key: String,
}

pub fn split_vendor(raw: &str) -> VendorIdentity {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let (rfc, rest) = match parts.split_first() {
        Some((first, rest)) if is_rfc_shape(first) => (first.to_uppercase(), rest.join(" ")),
        _ => (String::new(), parts.join(" ")),
    };

    let before_folio = match re_folio().find(&rest) {
        Some(m) => &rest[..m.start()],
        None => rest.as_str(),
    };
    let trimmed = before_folio.trim();
    let name = if trimmed.is_empty() {
        rfc.clone()
    } else {
        trimmed.to_string()
    };

    let key = if rfc.is_empty() {
        normalize_name(&name)
    } else {
        rfc.clone()
    };
    VendorIdentity { rfc, name, key }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_accents_and_suffixes() {
        assert_eq!(normalize_name("Papelería Núñez, S.A. de C.V."), "papeleria nunez");
        assert_eq!(normalize_name("ACME SA DE CV"), "acme cv");
        assert_eq!(normalize_name("  Juan   Pérez  "), "juan perez");
        assert_eq!(normalize_name("Servicios (Norte) / Sur"), "servicios norte sur");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "a sa sa b",
            "Comercial de de la Costa S. de R.L.",
            "Tienda & Hijos S.A. de C.V.",
            "x s.a.s.a. y",
            "Ñandú s de rl de cv",
            "ACME, S.A.",
            "",
        ];
        for s in samples {
            let once = normalize_name(s);
            assert_eq!(normalize_name(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_rfc_shape() {
        assert!(is_rfc_shape("ACME123456AB1"));
        assert!(is_rfc_shape("abc123456xy"));
        assert!(is_rfc_shape("ÑAB123456A12"));
        assert!(!is_rfc_shape("AC123456AB1"));
        assert!(!is_rfc_shape("ACME12345AB1"));
        assert!(!is_rfc_shape("ACME123456AB12"));
    }

    #[test]
    fn test_split_vendor_with_rfc() {
        let id = split_vendor("acme123456ab1 Compra de papel");
        assert_eq!(id.rfc, "ACME123456AB1");
        assert_eq!(id.name, "Compra de papel");
        assert_eq!(id.key, "ACME123456AB1");
        assert!(!id.name.contains("acme123456ab1"));
    }

    #[test]
    fn test_split_vendor_rfc_only_uses_rfc_as_name() {
        let id = split_vendor("  XAXX010101000 ");
        assert_eq!(id.rfc, "XAXX010101000");
        assert_eq!(id.name, "XAXX010101000");
    }

    #[test]
    fn test_split_vendor_drops_folio_suffix() {
        let id = split_vendor("Papeleria Central F-1234");
        assert_eq!(id.rfc, "");
        assert_eq!(id.name, "Papeleria Central");
        assert_eq!(id.key, "papeleria central");

        let id = split_vendor("Papeleria Central Factura 99");
        assert_eq!(id.name, "Papeleria Central");

        let id = split_vendor("Papeleria Central folio 12");
        assert_eq!(id.name, "Papeleria Central");
    }

    #[test]
    fn test_split_vendor_folio_inside_word_is_kept() {
        let id = split_vendor("Fabrica Fernandez");
        assert_eq!(id.name, "Fabrica Fernandez");
    }

    #[test]
    fn test_split_vendor_empty() {
        assert_eq!(split_vendor(""), VendorIdentity::default());
        assert_eq!(split_vendor("   "), VendorIdentity::default());
    }
}
