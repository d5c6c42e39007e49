//! Static translation tables for known non-English search terms.
//!
//! The provider's text search performs noticeably better with English
//! queries, so a handful of common Turkish categories and place names are
//! mapped before the query is built. Unknown terms pass through unchanged.

/// Translate a known Turkish business category into its English query term.
pub fn translate_category(category: &str) -> &str {
    match category {
        "Diş Hekimliği" => "dental clinic",
        "Diş" => "dental",
        "Dişçi" => "dentist",
        "Hastane" => "hospital",
        "Restoran" => "restaurant",
        "Kafe" => "cafe",
        "Berber" => "barber",
        "Kuaför" => "hairdresser",
        "Avukat" => "lawyer",
        other => other,
    }
}

/// Translate a known Turkish place name into its English spelling.
pub fn translate_location(location: &str) -> &str {
    match location {
        "Türkiye" => "Turkey",
        "İstanbul" => "Istanbul",
        "İzmir" => "Izmir",
        other => other,
    }
}

/// Build the provider text-search query for a (category, location) pair.
pub fn build_query(category: &str, location: &str) -> String {
    format!(
        "{} in {}",
        translate_category(category),
        translate_location(location)
    )
}
