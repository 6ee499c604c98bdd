pub mod auth_service;
pub mod build_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod return_service;
pub mod staff_service;
pub mod stock_service;
pub mod wallet_service;

/// `%needle%` for ILIKE with `%`, `_` and `\` in the needle matched literally.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(contains_pattern("ryzen"), "%ryzen%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("b_650\\x"), "%b\\_650\\\\x%");
    }
}
