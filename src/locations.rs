//! Country-to-city expansion from a static lookup table.
//!
//! A search over a whole country produces poor provider coverage, so
//! recognised country names are fanned out into one search per city.
//! Lookup is case-insensitive; anything unrecognised passes through
//! unchanged. No network I/O and no failure mode.

/// Turkey's 81 provinces, in the provider's customary listing order.
const TURKISH_PROVINCES: &[&str] = &[
    "Adana",
    "Adıyaman",
    "Afyonkarahisar",
    "Ağrı",
    "Amasya",
    "Ankara",
    "Antalya",
    "Artvin",
    "Aydın",
    "Balıkesir",
    "Bilecik",
    "Bingöl",
    "Bitlis",
    "Bolu",
    "Burdur",
    "Bursa",
    "Çanakkale",
    "Çankırı",
    "Çorum",
    "Denizli",
    "Diyarbakır",
    "Edirne",
    "Elazığ",
    "Erzincan",
    "Erzurum",
    "Eskişehir",
    "Gaziantep",
    "Giresun",
    "Gümüşhane",
    "Hakkari",
    "Hatay",
    "Isparta",
    "Mersin",
    "İstanbul",
    "İzmir",
    "Kars",
    "Kastamonu",
    "Kayseri",
    "Kırklareli",
    "Kırşehir",
    "Kocaeli",
    "Konya",
    "Kütahya",
    "Malatya",
    "Manisa",
    "Kahramanmaraş",
    "Mardin",
    "Muğla",
    "Muş",
    "Nevşehir",
    "Niğde",
    "Ordu",
    "Rize",
    "Sakarya",
    "Samsun",
    "Siirt",
    "Sinop",
    "Sivas",
    "Tekirdağ",
    "Tokat",
    "Trabzon",
    "Tunceli",
    "Şanlıurfa",
    "Uşak",
    "Van",
    "Yozgat",
    "Zonguldak",
    "Aksaray",
    "Bayburt",
    "Karaman",
    "Kırıkkale",
    "Batman",
    "Şırnak",
    "Bartın",
    "Ardahan",
    "Iğdır",
    "Yalova",
    "Karabük",
    "Kilis",
    "Osmaniye",
    "Düzce",
];

/// Returns the city list for a recognised country, case-insensitively.
fn country_cities(name: &str) -> Option<&'static [&'static str]> {
    if name.trim().eq_ignore_ascii_case("turkey") {
        return Some(TURKISH_PROVINCES);
    }
    None
}

/// Whether the given location is a country with city data.
pub fn is_country(name: &str) -> bool {
    country_cities(name).is_some()
}

/// The ordered city list for a country, empty if the country is unknown.
pub fn cities_for(name: &str) -> Vec<String> {
    country_cities(name)
        .map(|cities| cities.iter().map(|c| (*c).to_owned()).collect())
        .unwrap_or_default()
}

/// Expand a location list: recognised countries are replaced by their
/// city lists (order preserved); unrecognised entries pass through.
pub fn expand(locations: &[String]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(locations.len());
    for location in locations {
        match country_cities(location) {
            Some(cities) => {
                tracing::debug!(country = %location, cities = cities.len(), "expanding country into cities");
                expanded.extend(cities.iter().map(|c| (*c).to_owned()));
            }
            None => expanded.push(location.clone()),
        }
    }
    expanded
}
