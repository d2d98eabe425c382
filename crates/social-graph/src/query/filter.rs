use crate::traversal::Predicate;

const CASE_INSENSITIVE: &str = "(?i)";

/// Case-insensitive substring predicate, or `None` for blank input.
///
/// The input is matched literally; regex metacharacters are escaped.
pub fn build_name_filter(raw: Option<&str>) -> Option<Predicate> {
    non_blank(raw).map(|s| Predicate::regex(format!("{}{}", CASE_INSENSITIVE, regex::escape(s))))
}

/// Case-insensitive whole-value predicate, or `None` for blank input.
pub fn build_exact_filter(raw: Option<&str>) -> Option<Predicate> {
    non_blank(raw).map(|s| Predicate::regex(format!("^{}{}$", CASE_INSENSITIVE, regex::escape(s))))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}
