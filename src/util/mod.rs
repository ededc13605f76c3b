/// A rating is valid when it lies in [0.5, 10.0] and is a multiple of 0.5.
/// Validated at the boundary before any side effect is attempted.
pub fn is_valid_rating(value: f64) -> bool {
    if !value.is_finite() || !(0.5..=10.0).contains(&value) {
        return false;
    }
    let doubled = value * 2.0;
    (doubled - doubled.round()).abs() < f64::EPSILON
}

/// Catalog movie ids are positive integers.
pub fn is_valid_movie_id(id: i64) -> bool {
    id > 0
}

/// List names are 1-50 characters after trimming.
pub fn is_valid_list_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (1..=50).contains(&len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_half_steps() {
        let mut v = 0.5;
        while v <= 10.0 {
            assert!(is_valid_rating(v), "{} should be valid", v);
            v += 0.5;
        }
    }

    #[test]
    fn rating_rejects_out_of_range_and_off_step() {
        assert!(!is_valid_rating(0.0));
        assert!(!is_valid_rating(0.3));
        assert!(!is_valid_rating(7.25));
        assert!(!is_valid_rating(10.5));
        assert!(!is_valid_rating(-1.0));
        assert!(!is_valid_rating(f64::NAN));
    }

    #[test]
    fn movie_id_must_be_positive() {
        assert!(is_valid_movie_id(1));
        assert!(!is_valid_movie_id(0));
        assert!(!is_valid_movie_id(-5));
    }

    #[test]
    fn list_name_length_bounds() {
        assert!(is_valid_list_name("Noir"));
        assert!(!is_valid_list_name(""));
        assert!(!is_valid_list_name("   "));
        assert!(!is_valid_list_name(&"x".repeat(51)));
        assert!(is_valid_list_name(&"x".repeat(50)));
    }
}
