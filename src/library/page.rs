/// The catalog API refuses to page past this depth.
pub const MAX_CATALOG_PAGES: i64 = 500;

pub fn cap_total_pages(total_pages: i64) -> i64 {
    total_pages.min(MAX_CATALOG_PAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_at_500() {
        assert_eq!(cap_total_pages(501), 500);
        assert_eq!(cap_total_pages(10_000), 500);
    }

    #[test]
    fn passes_through_below_cap() {
        assert_eq!(cap_total_pages(1), 1);
        assert_eq!(cap_total_pages(500), 500);
        assert_eq!(cap_total_pages(0), 0);
    }
}
